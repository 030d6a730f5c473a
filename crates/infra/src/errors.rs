//! Conversions from driver errors into the storage port's error type.
//!
//! Adapters return [`StorageError`] so the cache tiers can classify failures
//! without knowing which backend produced them.

use std::time::Duration;

use mishkat_common::storage::StorageError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Driver errors that map onto [`StorageError`].
pub(crate) trait IntoStorageError {
    fn into_storage(self) -> StorageError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → StorageError */
/* -------------------------------------------------------------------------- */

impl IntoStorageError for SqlError {
    fn into_storage(self) -> StorageError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => StorageError::Unavailable("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        StorageError::Unavailable("database is locked".into())
                    }
                    ErrorCode::CannotOpen => {
                        StorageError::Unavailable(format!("cannot open database: {message}"))
                    }
                    _ => StorageError::Backend(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                StorageError::Serialization(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                StorageError::Serialization(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                StorageError::Serialization("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidPath(path) => {
                StorageError::Unavailable(format!("invalid database path: {}", path.to_string_lossy()))
            }
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → StorageError */
/* -------------------------------------------------------------------------- */

impl IntoStorageError for PoolError {
    fn into_storage(self) -> StorageError {
        StorageError::Unavailable(format!("connection pool: {self}"))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StorageError */
/* -------------------------------------------------------------------------- */

/// Map a transport error; `timeout` is the client's configured deadline.
pub(crate) fn http_error(err: &HttpError, timeout: Duration) -> StorageError {
    if err.is_timeout() {
        return StorageError::Timeout(timeout);
    }
    if err.is_connect() {
        return StorageError::Unavailable("HTTP connection failure".into());
    }
    if let Some(status) = err.status() {
        return StorageError::Remote { status: status.as_u16(), message: err.to_string() };
    }
    if err.is_decode() {
        return StorageError::Serialization(err.to_string());
    }
    StorageError::Unavailable(err.to_string())
}

/// Map a task that panicked or was cancelled inside `spawn_blocking`.
pub(crate) fn join_error(err: &tokio::task::JoinError) -> StorageError {
    StorageError::Backend(format!("blocking task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use mishkat_common::error::ErrorClassification;
    use rusqlite::ffi::{Error as FfiError, ErrorCode};

    use super::*;

    #[test]
    fn test_sqlite_busy_is_retryable() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        )
        .into_storage();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_sqlite_constraint_is_backend_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::ConstraintViolation, extended_code: 2067 },
            Some("UNIQUE constraint failed".into()),
        )
        .into_storage();
        assert!(matches!(err, StorageError::Backend(_)));
        assert!(!err.is_retryable());
    }
}
