//! Storage error types
//!
//! Errors raised by persistent key-value stores and remote row stores. Cache
//! tiers treat all of them as misses (reads) or log-and-drop (writes); they
//! only reach a caller when the store itself is the origin, as in
//! `query_with_cache`.

use std::time::Duration;

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backing store rejected or failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The remote store answered with a non-success status
    #[error("Remote store returned status {status}: {message}")]
    Remote {
        /// HTTP-like status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Operation exceeded its deadline
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored data could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(String),

    /// Query description is not supported by this store
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ErrorClassification for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Remote { status, .. } => *status == 429 || *status >= 500,
            Self::Backend(_) | Self::Serialization(_) | Self::InvalidQuery(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Remote { status, .. } if *status == 429 => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}
