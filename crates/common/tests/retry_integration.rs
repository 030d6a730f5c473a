//! Integration tests for retry with exponential backoff

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::error::{ErrorClassification, ErrorSeverity};
use mishkat_common::resilience::{policies, retry_with_backoff, RetryConfig, RetryExecutor};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
enum FetchError {
    Network,
    NotFound,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => f.write_str("network unreachable"),
            Self::NotFound => f.write_str("not found"),
        }
    }
}

impl ErrorClassification for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

/// Validates backoff for the fail twice then succeed scenario.
///
/// Assertions:
/// - Ensures the third attempt's value is returned.
/// - Ensures the second retry starts at least 200ms after the first.
#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_failures() {
    let attempts = Arc::new(Mutex::new(Vec::new()));

    let result = {
        let attempts = attempts.clone();
        retry_with_backoff(
            move || {
                let attempts = attempts.clone();
                async move {
                    let mut log = attempts.lock();
                    log.push(Instant::now());
                    if log.len() < 3 {
                        Err(FetchError::Network)
                    } else {
                        Ok("Al-Baqarah")
                    }
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
    };

    assert_eq!(result, Ok("Al-Baqarah"));
    let log = attempts.lock();
    assert_eq!(log.len(), 3);
    assert!(log[1] - log[0] >= Duration::from_millis(100));
    assert!(log[2] - log[1] >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_last_error() {
    let outcome = RetryExecutor::new(RetryConfig::new(2, Duration::from_millis(50)), policies::AlwaysRetry)
        .execute_with_outcome(|| async { Err::<(), _>(FetchError::Network) })
        .await;

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.total_delay, Duration::from_millis(150));
    assert_eq!(outcome.into_result(), Err(FetchError::Network));
}

#[tokio::test(start_paused = true)]
async fn test_classified_policy_stops_on_terminal_error() {
    let started = Instant::now();
    let outcome = RetryExecutor::new(RetryConfig::new(5, Duration::from_secs(1)), policies::ClassifiedRetry)
        .execute_with_outcome(|| async { Err::<(), _>(FetchError::NotFound) })
        .await;

    assert_eq!(outcome.attempts, 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}
