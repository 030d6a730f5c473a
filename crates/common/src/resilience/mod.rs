//! Resilience patterns for calling rate-limited, unreliable origins
//!
//! - **Rate limiting**: per-endpoint sliding-window quotas with a priority
//!   queue for calls over quota ([`RateLimiter`])
//! - **Retry**: bounded exponential backoff ([`retry_with_backoff`],
//!   [`RetryExecutor`])
//!
//! Both are generic over the caller's error type. Their own failures
//! ([`RateLimitError`]) convert into the caller's error through `From`, and
//! the origin's errors are returned unchanged.

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{RateLimitConfig, RateLimitConfigBuilder, RateLimitError, RateLimiter};
pub use retry::{
    policies, retry_with_backoff, RetryConfig, RetryConfigBuilder, RetryConfigError,
    RetryDecision, RetryExecutor, RetryOutcome, RetryPolicy,
};
