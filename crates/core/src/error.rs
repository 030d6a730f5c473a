//! Errors returned by the content services

use mishkat_common::batch::BatchError;
use mishkat_common::cache::CacheError;
use mishkat_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use mishkat_common::resilience::RateLimitError;
use mishkat_common::storage::StorageError;
use mishkat_domain::MishkatError;
use thiserror::Error;

/// Content service error.
///
/// Origin failures keep their [`MishkatError`]; orchestration failures keep
/// the primitive's own error.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Origin(#[from] MishkatError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Unexpected row in '{table}': {message}")]
    InvalidRow { table: String, message: String },
}

impl ContentError {
    pub(crate) fn invalid_row(table: &str, err: &serde_json::Error) -> Self {
        Self::InvalidRow { table: table.to_string(), message: err.to_string() }
    }
}

impl ErrorClassification for ContentError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Origin(e) => e.is_transient(),
            Self::Cache(e) => e.is_retryable(),
            Self::RateLimit(e) => e.is_retryable(),
            Self::Batch(e) => e.is_retryable(),
            Self::Storage(e) => e.is_retryable(),
            Self::Common(e) => e.is_retryable(),
            Self::InvalidRow { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Origin(e) if e.is_transient() => ErrorSeverity::Warning,
            Self::Origin(_) | Self::InvalidRow { .. } => ErrorSeverity::Error,
            Self::Cache(e) => e.severity(),
            Self::RateLimit(e) => e.severity(),
            Self::Batch(e) => e.severity(),
            Self::Storage(e) => e.severity(),
            Self::Common(e) => e.severity(),
        }
    }
}

/// Result alias for content services
pub type ContentResult<T> = Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_full_is_never_retried() {
        let err: ContentError =
            RateLimitError::QueueFull { endpoint: "quran_api".into(), limit: 10 }.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_origin_transience_drives_retry() {
        assert!(ContentError::from(MishkatError::Network("reset".into())).is_retryable());
        assert!(!ContentError::from(MishkatError::NotFound("surah 200".into())).is_retryable());
    }
}
