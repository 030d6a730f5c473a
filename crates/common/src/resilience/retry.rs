//! Bounded exponential-backoff retry
//!
//! [`retry_with_backoff`] is the plain helper: on failure wait, double the
//! delay, and try again until the retries are spent, then return the last
//! error unchanged. No jitter is applied.
//!
//! [`RetryExecutor`] is the configurable form. A [`RetryPolicy`] decides per
//! error whether another attempt makes sense; [`policies::ClassifiedRetry`]
//! consults [`ErrorClassification`] so capacity errors such as a full
//! rate-limit queue stop immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ErrorClassification;

/// Invalid retry configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetryConfigError {
    /// Multiplier below 1.0 would shrink delays
    #[error("Invalid retry multiplier {0}: must be at least 1.0")]
    InvalidMultiplier(f64),

    /// Delay cap below the initial delay
    #[error("max_delay {max:?} is smaller than initial_delay {initial:?}")]
    MaxBelowInitial {
        /// Configured cap
        max: Duration,
        /// Configured initial delay
        initial: Duration,
    },
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the backoff delay
    Retry,
    /// Retry after a specific delay
    RetryAfter(Duration),
    /// Return the error now
    Stop,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// `attempt` is the 0-based index of the attempt that just failed
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Retry schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts allowed after the first one
    pub retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after each retry
    pub multiplier: f64,
    /// Upper bound for a single delay
    pub max_delay: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: None,
        }
    }
}

impl RetryConfig {
    /// Doubling schedule with `retries` retries
    pub fn new(retries: u32, initial_delay: Duration) -> Self {
        Self { retries, initial_delay, ..Self::default() }
    }

    /// Create a new configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(RetryConfigError::InvalidMultiplier(self.multiplier));
        }
        if let Some(max) = self.max_delay {
            if max < self.initial_delay {
                return Err(RetryConfigError::MaxBelowInitial {
                    max,
                    initial: self.initial_delay,
                });
            }
        }
        Ok(())
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let delay = if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos.round() as u64)
        } else {
            Duration::MAX
        };
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.config.initial_delay = delay;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    pub fn max_delay(mut self, max: Duration) -> Self {
        self.config.max_delay = Some(max);
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Result of a retried operation with attempt statistics
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final result; the error is the last attempt's, unchanged
    pub result: Result<T, E>,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Time spent waiting between attempts
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Runs operations under a [`RetryConfig`] and a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    /// The schedule in use
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return attempt statistics.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "Operation succeeded after retrying");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt + 1, total_delay };
                }
                Err(error) => error,
            };

            if attempt >= self.config.retries {
                warn!(attempts = attempt + 1, error = %error, "Retries exhausted");
                return RetryOutcome { result: Err(error), attempts: attempt + 1, total_delay };
            }

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempt = attempt + 1, error = %error, "Error is not retryable");
                    return RetryOutcome { result: Err(error), attempts: attempt + 1, total_delay };
                }
                RetryDecision::Retry => self.config.delay_for(attempt),
                RetryDecision::RetryAfter(delay) => delay,
            };

            warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Operation failed; retrying"
            );
            tokio::time::sleep(delay).await;
            total_delay += delay;
            attempt += 1;
        }
    }
}

/// Retry `operation` up to `retries` more times, waiting `initial_delay`
/// before the first retry and doubling the wait each time.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use mishkat_common::resilience::retry_with_backoff;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let value = retry_with_backoff(|| async { Ok::<_, String>(3) }, 3, Duration::from_millis(10)).await;
/// assert_eq!(value, Ok(3));
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    retries: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryExecutor::new(RetryConfig::new(retries, initial_delay), policies::AlwaysRetry)
        .execute(operation)
        .await
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::*;

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }

    /// Retries errors that classify themselves as retryable, honouring
    /// their suggested delay.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ClassifiedRetry;

    impl<E: ErrorClassification> RetryPolicy<E> for ClassifiedRetry {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if !error.is_retryable() {
                return RetryDecision::Stop;
            }
            match error.retry_after() {
                Some(delay) => RetryDecision::RetryAfter(delay),
                None => RetryDecision::Retry,
            }
        }
    }
}
