//! Ingestion errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    /// A source with the same id is already registered
    #[error("source {source_id} is already registered")]
    AlreadyRegistered { source_id: String },

    /// Queued delivery was requested with a zero capacity
    #[error("queue capacity must be > 0")]
    ZeroCapacity,

    /// Mock source parameters are unusable
    #[error("invalid source {source_id}: {message}")]
    InvalidSource { source_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, IngestionError>;
