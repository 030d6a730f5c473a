//! Shared test helpers for `mishkat-core` integration tests.
//!
//! Fake origins record every call so tests can assert how many requests
//! actually reached the network.

#![allow(dead_code)]

pub mod origins;

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::batch::{BatchConfig, RequestBatcher};
use mishkat_common::cache::{CacheConfig, TieredCache};
use mishkat_common::observability::PerformanceMonitor;
use mishkat_common::resilience::{RateLimitConfig, RateLimiter, RetryConfig};
use mishkat_common::storage::{KeyValueStore, MemoryKeyValueStore, MemoryRowStore, RowStore};
use mishkat_core::RequestOrchestrator;
use mishkat_domain::constants::{DATABASE, HADITH_API, QURAN_API, TRANSLATION_API};

/// Stores and orchestrator wired for one test
pub struct Harness {
    pub orchestrator: RequestOrchestrator,
    pub kv: Arc<MemoryKeyValueStore>,
    pub rows: Arc<MemoryRowStore>,
}

/// Orchestrator over in-memory stores with generous limits and a fast
/// retry schedule (3 retries, 100ms initial delay).
pub fn harness() -> Harness {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let rows = Arc::new(MemoryRowStore::new());

    let limiter = RateLimiter::new();
    for endpoint in [QURAN_API, HADITH_API, TRANSLATION_API, DATABASE] {
        limiter
            .register_endpoint(endpoint, RateLimitConfig::new(30, Duration::from_secs(60)))
            .unwrap();
    }

    let cache = TieredCache::new(CacheConfig::default(), Arc::clone(&kv) as Arc<dyn KeyValueStore>)
        .with_row_store(Arc::clone(&rows) as Arc<dyn RowStore>);
    let orchestrator = RequestOrchestrator::new(
        cache,
        limiter,
        RequestBatcher::new(BatchConfig::with_delay(Duration::from_millis(50))),
        PerformanceMonitor::new(),
        RetryConfig::new(3, Duration::from_millis(100)),
    );

    Harness { orchestrator, kv, rows }
}
