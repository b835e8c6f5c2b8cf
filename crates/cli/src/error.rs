//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Emission ledger not found
    #[error("Emission ledger not found: {}", path.display())]
    LedgerNotFound { path: PathBuf },

    /// A rejected frame stopped the recording under the abort policy
    #[error("Recording aborted: {message}")]
    Aborted { message: String },

    /// Playback rate is unusable
    #[error("Frame rate must be finite and > 0, got {fps}")]
    InvalidFps { fps: f64 },

    /// Recording duration cannot be represented
    #[error("Duration must be a non-negative number of seconds within range, got {seconds}")]
    InvalidDuration { seconds: f64 },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn ledger_not_found(path: impl Into<PathBuf>) -> Self {
        Self::LedgerNotFound { path: path.into() }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }
}
