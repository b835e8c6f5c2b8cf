//! Playback errors

use std::path::PathBuf;

use thiserror::Error;

/// Ledger contents that cannot be resampled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleInputError {
    #[error("timestamp sequence is empty")]
    Empty,

    #[error("output frame rate must be finite and > 0, got {0}")]
    InvalidRate(f64),

    #[error("timestamp at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("timestamp at index {index} ({current}) is before its predecessor ({previous})")]
    NonMonotonic {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("resampling would plan about {frames} frames, limit is {limit}")]
    PlanTooLarge { frames: f64, limit: usize },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Input(#[from] ResampleInputError),

    /// A planned source frame does not exist on disk
    #[error("source frame {} does not exist", path.display())]
    MissingSourceFrame { path: PathBuf },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder '{program}' not found: {source}")]
    EncoderNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("encoder '{program}' exited with {status}: {stderr}")]
    EncoderFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

impl PlaybackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
