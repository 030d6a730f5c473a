//! Tiered read-through caching
//!
//! [`TieredCache`] answers lookups from a bounded memory tier, then a
//! persistent key-value store, and only then from the caller's origin fetch.
//! Results are promoted upward; persistent writes happen in the background.
//!
//! # Features
//!
//! - **Single-flight**: concurrent misses on one key share one origin fetch
//! - **Configurable eviction**: insertion order (default) or LRU
//! - **Lazy expiry**: entries expire on read; sweeping is explicit
//! - **Write-behind**: a bounded queue drained by one background task
//! - **Testable**: clock abstraction for deterministic TTL tests
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use mishkat_common::cache::{CacheConfig, EvictionPolicy, TieredCache};
//! use mishkat_common::storage::MemoryKeyValueStore;
//!
//! let config = CacheConfig::builder()
//!     .memory_capacity(500)
//!     .default_ttl(Duration::from_secs(1800))
//!     .eviction_policy(EvictionPolicy::Lru)
//!     .build()
//!     .unwrap();
//!
//! let cache = TieredCache::new(config, Arc::new(MemoryKeyValueStore::new()));
//! assert_eq!(cache.stats().memory_capacity, 500);
//! ```

pub mod config;
pub mod error;
mod memory;
pub mod stats;
pub mod tiered;
mod write_behind;

pub use config::{CacheConfig, CacheConfigBuilder, CacheOptions, EvictionPolicy};
pub use error::CacheError;
pub use stats::TieredCacheStats;
pub use tiered::TieredCache;
