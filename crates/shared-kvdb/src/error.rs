//! Error types for key-value storage.

use thiserror::Error;

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl KvError {
    pub fn io(message: impl Into<String>) -> Self {
        KvError::IOError {
            message: message.into(),
        }
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        KvError::CorruptionError {
            message: message.into(),
        }
    }
}

/// Result type for storage operations.
pub type KvResult<T> = Result<T, KvError>;
