//! Read-through cache over three tiers: process memory, a persistent
//! key-value store, and the caller's origin fetch.
//!
//! Lookup order for [`TieredCache::get_cached`]:
//!
//! 1. Memory tier, when enabled for the call. Expired entries are dropped.
//! 2. Persistent store. A valid entry is promoted into memory with its
//!    remaining TTL. Read or decode failures count as a miss.
//! 3. The origin `fetch`. Its value is stored in memory and queued for the
//!    persistent store; its error is returned unchanged.
//!
//! Steps 2 and 3 run at most once per key at a time. Concurrent misses on a
//! key join the in-flight leader and receive its value, or
//! [`CacheError::InFlightFailed`] when the leader's fetch failed.
//!
//! Persistent entries are JSON documents `{"data", "timestamp", "ttl"}` with
//! millisecond wall-clock values, stored under the configured key prefix.
//! They expire lazily on read; [`TieredCache::purge_expired`] sweeps them
//! on demand.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::config::{CacheConfig, CacheOptions};
use super::error::CacheError;
use super::memory::{MemoryLookup, MemoryTier};
use super::stats::{MetricsCollector, TieredCacheStats};
use super::write_behind::WriteBehind;
use crate::storage::{KeyValueStore, Row, RowQuery, RowStore, StorageError};
use crate::time::{Clock, SystemClock};

type SharedOutcome = Result<Value, String>;

/// Persistent-tier document
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    data: Value,
    timestamp: u64,
    ttl: u64,
}

impl PersistedEntry {
    fn remaining(&self, now_ms: u64) -> Option<Duration> {
        let age = now_ms.saturating_sub(self.timestamp);
        (age < self.ttl).then(|| Duration::from_millis(self.ttl - age))
    }
}

struct InFlight {
    id: u64,
    rx: watch::Receiver<Option<SharedOutcome>>,
}

/// Leadership of one in-flight fetch. Dropping it unregisters the flight,
/// which wakes followers even when the leader was cancelled.
struct FlightGuard<'a> {
    registry: &'a Mutex<HashMap<String, InFlight>>,
    key: String,
    id: u64,
    tx: watch::Sender<Option<SharedOutcome>>,
}

impl FlightGuard<'_> {
    fn publish(&self, outcome: SharedOutcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        if registry.get(&self.key).is_some_and(|flight| flight.id == self.id) {
            registry.remove(&self.key);
        }
    }
}

async fn wait_outcome(rx: &mut watch::Receiver<Option<SharedOutcome>>) -> Option<SharedOutcome> {
    loop {
        let current = rx.borrow_and_update().clone();
        if current.is_some() {
            return current;
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

/// Tiered read-through cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use mishkat_common::cache::{CacheConfig, CacheError, CacheOptions, TieredCache};
/// use mishkat_common::storage::MemoryKeyValueStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), CacheError> {
/// let cache = TieredCache::new(CacheConfig::default(), Arc::new(MemoryKeyValueStore::new()));
///
/// let names: Vec<String> = cache
///     .get_cached("surah_names", || async { Ok::<_, CacheError>(vec!["Al-Fatiha".to_string()]) }, CacheOptions::default())
///     .await?;
/// assert_eq!(names, vec!["Al-Fatiha"]);
/// # Ok(())
/// # }
/// ```
pub struct TieredCache<C: Clock = SystemClock> {
    config: CacheConfig,
    memory: Mutex<MemoryTier>,
    persistent: Arc<dyn KeyValueStore>,
    rows: Option<Arc<dyn RowStore>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    next_flight: AtomicU64,
    writer: WriteBehind,
    metrics: Arc<MetricsCollector>,
    clock: C,
}

impl TieredCache<SystemClock> {
    /// Create a cache over `persistent` using the system clock.
    pub fn new(config: CacheConfig, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(config, persistent, SystemClock)
    }
}

impl<C: Clock> TieredCache<C> {
    /// Create a cache with an explicit clock.
    pub fn with_clock(config: CacheConfig, persistent: Arc<dyn KeyValueStore>, clock: C) -> Self {
        let metrics = Arc::new(MetricsCollector::default());
        let writer =
            WriteBehind::new(Arc::clone(&persistent), config.write_queue_capacity, Arc::clone(&metrics));
        Self {
            memory: Mutex::new(MemoryTier::new(config.memory_capacity, config.eviction_policy)),
            config,
            persistent,
            rows: None,
            in_flight: Mutex::new(HashMap::new()),
            next_flight: AtomicU64::new(0),
            writer,
            metrics,
            clock,
        }
    }

    /// Attach the row store used as origin by [`query_with_cache`](Self::query_with_cache).
    #[must_use]
    pub fn with_row_store(mut self, rows: Arc<dyn RowStore>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached value for `key`, or run `fetch` and cache its value.
    ///
    /// `fetch` runs only when neither tier holds a valid entry and no other
    /// call is already fetching `key`. Its error is returned unchanged; a
    /// call that joined a failed fetch gets [`CacheError::InFlightFailed`]
    /// converted into `E`.
    pub async fn get_cached<T, E, F, Fut>(
        &self,
        key: &str,
        fetch: F,
        options: CacheOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError> + Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if options.use_memory_cache {
            if let Some(value) = self.memory_lookup(key) {
                match serde_json::from_value::<T>(value) {
                    Ok(found) => {
                        self.metrics.record_memory_hit();
                        debug!(key = %key, "Memory cache hit");
                        return Ok(found);
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Discarding undecodable memory cache entry");
                        self.memory.lock().remove(key);
                    }
                }
            }
        }

        let guard = loop {
            match self.lead_or_join(key) {
                Ok(guard) => break guard,
                Err(mut rx) => {
                    // `None` means the leader went away without an outcome;
                    // its registration is gone, so try again.
                    if let Some(outcome) = wait_outcome(&mut rx).await {
                        self.metrics.record_join();
                        debug!(key = %key, "Joined in-flight fetch");
                        return match outcome {
                            Ok(value) => serde_json::from_value(value)
                                .map_err(|e| CacheError::serialization(key, &e).into()),
                            Err(message) => {
                                Err(CacheError::InFlightFailed { key: key.to_string(), message }
                                    .into())
                            }
                        };
                    }
                }
            }
        };

        if let Some(value) = self.read_persistent(key, options).await {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(found) => {
                    guard.publish(Ok(value));
                    return Ok(found);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Persistent cache entry has unexpected shape");
                    self.memory.lock().remove(key);
                }
            }
        }

        self.metrics.record_origin_fetch();
        debug!(key = %key, "Cache miss; fetching from origin");
        let fetched = match fetch().await {
            Ok(fetched) => fetched,
            Err(e) => {
                guard.publish(Err(e.to_string()));
                return Err(e);
            }
        };

        let value = match serde_json::to_value(&fetched) {
            Ok(value) => value,
            Err(e) => {
                let err = CacheError::serialization(key, &e);
                guard.publish(Err(err.to_string()));
                return Err(err.into());
            }
        };

        let ttl = options.ttl.unwrap_or(self.config.default_ttl);
        if options.use_memory_cache {
            self.insert_memory(key, value.clone(), ttl);
        }
        self.write_persistent(key, value.clone(), ttl);
        guard.publish(Ok(value));

        Ok(fetched)
    }

    /// Cache the rows described by `query`, keyed by its serialized form.
    pub async fn query_with_cache(
        &self,
        query: &RowQuery,
        options: CacheOptions,
    ) -> Result<Vec<Row>, CacheError> {
        let Some(rows) = self.rows.clone() else {
            return Err(StorageError::Unavailable("no row store configured".to_string()).into());
        };
        let key = query.cache_key();
        self.get_cached(
            &key,
            || async move { rows.select(query).await.map_err(CacheError::from) },
            options,
        )
        .await
    }

    /// Remove `key` from both tiers.
    pub async fn invalidate(&self, key: &str) {
        self.memory.lock().remove(key);
        self.writer.enqueue_remove(self.config.storage_key(key)).await;
        debug!(key = %key, "Cache entry invalidated");
    }

    /// Empty the memory tier and delete every prefixed persistent key.
    ///
    /// Returns the number of persistent keys removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        self.memory.lock().clear();
        self.writer.flush().await;

        let keys = self.prefixed_keys().await?;
        if !keys.is_empty() {
            self.persistent.remove_many(&keys).await?;
        }
        debug!(removed = keys.len(), "Cache cleared");
        Ok(keys.len())
    }

    /// Sweep expired or unreadable entries from both tiers.
    ///
    /// Returns the number of entries removed across the two tiers.
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let from_memory = self.memory.lock().purge_expired(self.clock.now());
        self.writer.flush().await;

        let now_ms = self.clock.millis_since_epoch();
        let mut stale = Vec::new();
        for storage_key in self.prefixed_keys().await? {
            let keep = match self.persistent.get(&storage_key).await? {
                Some(raw) => serde_json::from_str::<PersistedEntry>(&raw)
                    .ok()
                    .and_then(|entry| entry.remaining(now_ms))
                    .is_some(),
                None => true,
            };
            if !keep {
                stale.push(storage_key);
            }
        }
        if !stale.is_empty() {
            self.persistent.remove_many(&stale).await?;
        }

        let removed = from_memory + stale.len();
        for _ in 0..removed {
            self.metrics.record_expiration();
        }
        debug!(removed, "Expired cache entries purged");
        Ok(removed)
    }

    /// Wait until every queued persistent write has been applied.
    pub async fn flush_writes(&self) {
        self.writer.flush().await;
    }

    /// Current statistics
    pub fn stats(&self) -> TieredCacheStats {
        let memory = self.memory.lock();
        self.metrics.snapshot(memory.len(), memory.capacity())
    }

    fn lead_or_join(
        &self,
        key: &str,
    ) -> Result<FlightGuard<'_>, watch::Receiver<Option<SharedOutcome>>> {
        let mut registry = self.in_flight.lock();
        if let Some(flight) = registry.get(key) {
            return Err(flight.rx.clone());
        }

        let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        registry.insert(key.to_string(), InFlight { id, rx });
        Ok(FlightGuard { registry: &self.in_flight, key: key.to_string(), id, tx })
    }

    fn memory_lookup(&self, key: &str) -> Option<Value> {
        let lookup = self.memory.lock().get(key, self.clock.now());
        match lookup {
            MemoryLookup::Hit(value) => Some(value),
            MemoryLookup::Expired => {
                self.metrics.record_expiration();
                debug!(key = %key, "Memory cache entry expired");
                None
            }
            MemoryLookup::Miss => None,
        }
    }

    fn insert_memory(&self, key: &str, value: Value, ttl: Duration) {
        let evicted = self.memory.lock().insert(key, value, ttl, self.clock.now());
        if evicted > 0 {
            self.metrics.record_evictions(evicted);
            debug!(key = %key, evicted, "Memory cache at capacity; evicted entries");
        }
    }

    async fn read_persistent(&self, key: &str, options: CacheOptions) -> Option<Value> {
        let storage_key = self.config.storage_key(key);
        let raw = match self.persistent.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Persistent cache read failed; treating as miss");
                self.metrics.record_read_failure();
                return None;
            }
        };

        let entry: PersistedEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable persistent cache entry");
                self.writer.discard(storage_key);
                return None;
            }
        };

        let Some(remaining) = entry.remaining(self.clock.millis_since_epoch()) else {
            debug!(key = %key, "Persistent cache entry expired");
            self.metrics.record_expiration();
            self.writer.discard(storage_key);
            return None;
        };

        if options.use_memory_cache {
            self.insert_memory(key, entry.data.clone(), remaining);
        }
        self.metrics.record_persistent_hit();
        debug!(key = %key, "Persistent cache hit");
        Some(entry.data)
    }

    fn write_persistent(&self, key: &str, data: Value, ttl: Duration) {
        let entry = PersistedEntry {
            data,
            timestamp: self.clock.millis_since_epoch(),
            ttl: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.writer.enqueue_set(self.config.storage_key(key), raw),
            Err(e) => {
                warn!(key = %key, error = %e, "Could not encode persistent cache entry");
                self.metrics.record_write_failure();
            }
        }
    }

    async fn prefixed_keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.persistent.keys().await?;
        Ok(keys.into_iter().filter(|k| k.starts_with(&self.config.key_prefix)).collect())
    }
}

impl<C: Clock> fmt::Debug for TieredCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
