//! Error types for the NEXRAD acquisition crates.

use thiserror::Error;

/// Result type alias using NexradError.
pub type NexradResult<T> = Result<T, NexradError>;

/// Primary error type for catalog and file-loading operations.
#[derive(Debug, Error)]
pub enum NexradError {
    // === Transport Errors ===
    #[error("Object listing failed: {0}")]
    ListError(String),

    #[error("Object retrieval failed for '{key}': {message}")]
    GetError { key: String, message: String },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // === Data Errors ===
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Failed to decode data: {0}")]
    DecodeError(String),

    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NexradError {
    /// Whether the failure came from the remote store rather than the data.
    ///
    /// Transport failures are retried on the next refresh cycle.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NexradError::ListError(_) | NexradError::GetError { .. } | NexradError::ObjectNotFound(_)
        )
    }
}

impl From<serde_json::Error> for NexradError {
    fn from(err: serde_json::Error) -> Self {
        NexradError::InternalError(format!("JSON error: {}", err))
    }
}
