//! Error types for the memory core.

use serde::Serialize;

use crate::store::StoreError;

/// Errors produced by memory operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("malformed document at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for memory operations.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

/// Wire shape of a failed operation.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: bool,
    pub message: String,
}

impl MemoryError {
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: true,
            message: self.to_string(),
        }
    }
}
