//! Tiered cache statistics
//!
//! Counters are kept in atomics so the read path never takes a lock just to
//! record where a value came from.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of tiered cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TieredCacheStats {
    /// Current number of memory tier entries
    pub memory_entries: usize,

    /// Memory tier capacity
    pub memory_capacity: usize,

    /// Lookups answered by the memory tier
    pub memory_hits: u64,

    /// Lookups answered by the persistent tier (and promoted)
    pub persistent_hits: u64,

    /// Lookups that ran the origin fetch
    pub origin_fetches: u64,

    /// Lookups that awaited another caller's in-flight fetch
    pub single_flight_joins: u64,

    /// Entries evicted from the memory tier because of capacity
    pub evictions: u64,

    /// Expired entries dropped from either tier
    pub expirations: u64,

    /// Persistent reads that failed and were treated as misses
    pub read_failures: u64,

    /// Persistent writes that failed or were dropped
    pub write_failures: u64,
}

impl TieredCacheStats {
    /// Total lookups served without running the origin
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.persistent_hits + self.single_flight_joins
    }

    /// Fraction of lookups served without running the origin
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.origin_fetches;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Thread-safe counters behind [`TieredCacheStats`]
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    origin_fetches: AtomicU64,
    single_flight_joins: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    read_failures: AtomicU64,
    write_failures: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_persistent_hit(&self) {
        self.persistent_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_origin_fetch(&self) {
        self.origin_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_join(&self) {
        self.single_flight_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub(crate) fn snapshot(&self, memory_entries: usize, memory_capacity: usize) -> TieredCacheStats {
        TieredCacheStats {
            memory_entries,
            memory_capacity,
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            origin_fetches: self.origin_fetches.load(Ordering::Relaxed),
            single_flight_joins: self.single_flight_joins.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
