//! Cache error types

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};
use crate::storage::StorageError;

/// Errors produced by the tiered cache itself.
///
/// Persistent-tier failures never surface as `CacheError`; they are logged
/// and treated as misses. The caller only sees these when the cache cannot
/// hand back a value it was asked to produce.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A fetched value could not be converted to or from its cached form
    #[error("Cache serialization error for key '{key}': {message}")]
    Serialization {
        /// Cache key
        key: String,
        /// Underlying serde message
        message: String,
    },

    /// The shared in-flight fetch this call joined failed
    #[error("In-flight fetch for key '{key}' failed: {message}")]
    InFlightFailed {
        /// Cache key
        key: String,
        /// Display text of the leader's error
        message: String,
    },

    /// The row store used as origin by `query_with_cache` failed
    #[error("Cache origin store error: {0}")]
    Storage(#[from] StorageError),
}

impl CacheError {
    pub(crate) fn serialization(key: &str, err: &serde_json::Error) -> Self {
        Self::Serialization { key: key.to_string(), message: err.to_string() }
    }
}

impl ErrorClassification for CacheError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Serialization { .. } => false,
            // The leader already ran its own retries.
            Self::InFlightFailed { .. } => false,
            Self::Storage(err) => err.is_retryable(),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Serialization { .. } => ErrorSeverity::Error,
            Self::InFlightFailed { .. } => ErrorSeverity::Warning,
            Self::Storage(err) => err.severity(),
        }
    }
}
