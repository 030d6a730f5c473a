//! Common error types and classification utilities
//!
//! Every module in this crate owns a focused `thiserror` enum
//! (`StorageError`, `CacheError`, `RateLimitError`, `BatchError`). They all
//! implement [`ErrorClassification`] so that retry policies and log sinks can
//! treat them uniformly without knowing the concrete type.
//!
//! | Category | Example | Retryable | Reaches caller |
//! |----------|---------|-----------|----------------|
//! | Capacity | rate-limit queue full | no | yes, immediately |
//! | Transient origin | network failure | yes | after retries are exhausted |
//! | Cache tier | persistent store write failed | n/a | never (logged) |
//! | Batch | co-batched member failed | no | yes |
//!
//! ## Composition
//!
//! Application errors compose with the module errors rather than duplicating
//! them:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum ContentError {
//!     #[error(transparent)]
//!     RateLimit(#[from] RateLimitError),
//!     #[error(transparent)]
//!     Cache(#[from] CacheError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias for operations failing with [`CommonError`].
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors shared by configuration and serialization paths, plus every
/// runtime module error for callers that want one type.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
        /// Offending field, when known
        field: Option<String>,
    },

    /// Encoding or decoding failure
    #[error("Serialization error ({format}): {message}")]
    Serialization {
        /// Data format (`JSON`, `TOML`)
        format: String,
        /// Underlying parser message
        message: String,
    },

    /// Invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Human readable description
        message: String,
    },

    /// Persistent or remote store failure
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),

    /// Tiered cache failure
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Cache(#[from] crate::cache::CacheError),

    /// Rate limiter rejection
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    RateLimit(#[from] crate::resilience::RateLimitError),

    /// Batch member failure
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Batch(#[from] crate::batch::BatchError),

    /// Rejected retry configuration
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    RetryConfig(#[from] crate::resilience::RetryConfigError),
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a serialization error for the given format
    pub fn serialization_format<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { format: format.into(), message: message.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Config { .. } | Self::Serialization { .. } | Self::Internal { .. } => false,
            #[cfg(feature = "runtime")]
            Self::Storage(e) => e.is_retryable(),
            #[cfg(feature = "runtime")]
            Self::Cache(e) => e.is_retryable(),
            #[cfg(feature = "runtime")]
            Self::RateLimit(e) => e.is_retryable(),
            #[cfg(feature = "runtime")]
            Self::Batch(e) => e.is_retryable(),
            #[cfg(feature = "runtime")]
            Self::RetryConfig(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } | Self::Serialization { .. } => ErrorSeverity::Error,
            Self::Internal { .. } => ErrorSeverity::Critical,
            #[cfg(feature = "runtime")]
            Self::Storage(e) => e.severity(),
            #[cfg(feature = "runtime")]
            Self::Cache(e) => e.severity(),
            #[cfg(feature = "runtime")]
            Self::RateLimit(e) => e.severity(),
            #[cfg(feature = "runtime")]
            Self::Batch(e) => e.severity(),
            #[cfg(feature = "runtime")]
            Self::RetryConfig(_) => ErrorSeverity::Error,
        }
    }
}

/// Standard interface for classifying errors by their characteristics.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: network failures, timeouts, upstream
    /// throttling. Capacity errors raised locally (a full rate-limit queue)
    /// are terminal and must report `false`.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Suggested retry delay, when the error carries one
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
