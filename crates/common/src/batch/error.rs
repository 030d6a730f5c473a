//! Batch error types

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Errors a batch member receives instead of its own outcome
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    /// Another member of the same batch failed
    #[error("Batch '{batch_key}' failed: {message}")]
    MemberFailed {
        /// Batch key
        batch_key: String,
        /// Display text of the first failing member's error
        message: String,
    },

    /// The batcher was dropped before the batch ran
    #[error("Batch '{batch_key}' was cancelled before running")]
    Cancelled {
        /// Batch key
        batch_key: String,
    },
}

impl ErrorClassification for BatchError {
    fn is_retryable(&self) -> bool {
        // This member's own query did not fail.
        matches!(self, Self::MemberFailed { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}
