//! Decode error types.

use nexrad_common::NexradError;
use thiserror::Error;

/// Result type alias using DecodeError.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Reasons a message, block or packet is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: i64 },

    #[error("Message size mismatch: read {read} bytes, declared {declared} bytes")]
    SizeMismatch { read: usize, declared: usize },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unknown type code: {0}")]
    UnknownType(i32),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl DecodeError {
    pub(crate) fn field(field: &'static str, value: impl Into<i64>) -> Self {
        DecodeError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

impl From<DecodeError> for NexradError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Decompression(msg) => NexradError::DecompressionError(msg),
            other => NexradError::DecodeError(other.to_string()),
        }
    }
}
