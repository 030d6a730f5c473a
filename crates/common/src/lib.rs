//! Request orchestration primitives shared across Mishkat crates.
//!
//! Everything a content service needs between "a caller asked for data" and
//! "the origin was contacted": tiered caching with single-flight fetches,
//! per-endpoint rate limiting, debounced batching, retry with backoff and
//! operation timing.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and collections (no async runtime)
//! - `runtime`: time, storage ports, cache, resilience, batch, observability
//! - `test-utils`: mocks and async helpers for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod collections;
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod batch;
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod observability;
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod storage;
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use batch::{BatchConfig, BatchError, RequestBatcher};
#[cfg(feature = "runtime")]
pub use cache::{CacheConfig, CacheError, CacheOptions, EvictionPolicy, TieredCache, TieredCacheStats};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use observability::{MonitorConfig, PerformanceMetric, PerformanceMonitor, PerformanceStats};
#[cfg(feature = "runtime")]
pub use resilience::{
    retry_with_backoff, RateLimitConfig, RateLimitError, RateLimiter, RetryConfig, RetryExecutor,
    RetryPolicy,
};
#[cfg(feature = "runtime")]
pub use storage::{KeyValueStore, Row, RowQuery, RowStore, StorageError};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock};
