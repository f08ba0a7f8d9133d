//! Error types for the health pipeline.

use thiserror::Error;

/// Health pipeline errors.
///
/// These travel between internal seams only; the public pipeline operations
/// turn them into empty results and a log line.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Health store error: {0}")]
    Store(String),

    #[error("Health store unavailable on this device")]
    Unavailable,

    #[error("Backend error: {0}")]
    Backend(#[from] wellness_api_client::BackendError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations.
pub type HealthResult<T> = Result<T, HealthError>;
