//! Sync engine errors

use std::path::PathBuf;

use contracts::{ContractError, PixelFormat, SourceId};
use thiserror::Error;

/// Frame rejected before it reaches stream state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "dimension mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}"
    )]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("pixel format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}

impl ValidationError {
    /// Short label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::FormatMismatch { .. } => "format_mismatch",
            Self::BufferSize { .. } => "buffer_size",
        }
    }
}

/// Ledger persistence errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger length disagrees with the synchronizer's emission count
    #[error("ledger holds {actual} timestamps but {expected} frames were emitted")]
    Consistency { expected: u64, actual: usize },

    #[error("unsupported ledger format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("ledger encode error: {0}")]
    Encode(String),

    #[error("ledger decode error at {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("ledger io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Synchronizer errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown source: {0}")]
    UnknownSource(SourceId),

    /// Only returned under the abort mismatch policy
    #[error("frame from '{source_id}' failed validation: {error}")]
    Validation {
        source_id: SourceId,
        #[source]
        error: ValidationError,
    },

    /// Merged frame was not accepted; nothing was recorded
    #[error("sink rejected frame {frame_index}: {source}")]
    Sink {
        frame_index: u64,
        #[source]
        source: ContractError,
    },

    #[error("sink close failed: {0}")]
    SinkClose(#[source] ContractError),

    #[error("merge failed: {0}")]
    Merge(String),

    #[error("synchronizer config error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
