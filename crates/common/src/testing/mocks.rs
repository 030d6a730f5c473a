//! Mock implementations of the storage ports
//!
//! Provides stores whose failures can be switched on and off, and a call
//! counter for origin closures.

#![allow(clippy::missing_errors_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::storage::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult, StoreCounters};

/// Key-value store that fails on demand.
///
/// Wraps a [`MemoryKeyValueStore`]; while a failure switch is on, the
/// matching operations return [`StorageError::Unavailable`] without touching
/// the inner store.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "runtime")]
/// # {
/// use mishkat_common::testing::FlakyKeyValueStore;
///
/// let store = FlakyKeyValueStore::new();
/// store.fail_writes(true);
/// assert!(store.is_failing_writes());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FlakyKeyValueStore {
    inner: MemoryKeyValueStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: parking_lot::Mutex<Option<Duration>>,
}

impl FlakyKeyValueStore {
    /// Create a healthy store
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle read failures (`get`, `keys`)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Toggle write failures (`set`, `remove`, `remove_many`)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Whether writes currently fail
    pub fn is_failing_writes(&self) -> bool {
        self.fail_writes.load(Ordering::SeqCst)
    }

    /// Sleep before every write, simulating a slow disk
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// Raw value lookup on the inner store
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.peek(key)
    }

    /// Operation counters of the inner store (failed calls are not counted)
    pub fn counters(&self) -> StoreCounters {
        self.inner.counters()
    }

    fn check(&self, switch: &AtomicBool) -> StorageResult<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    async fn before_write(&self) -> StorageResult<()> {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(&self.fail_writes)
    }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.before_write().await?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.before_write().await?;
        self.inner.remove(key).await
    }

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()> {
        self.before_write().await?;
        self.inner.remove_many(keys).await
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        self.check(&self.fail_reads)?;
        self.inner.keys().await
    }
}

/// Shared invocation counter for origin closures.
///
/// ```
/// # #[cfg(feature = "runtime")]
/// # {
/// use mishkat_common::testing::CallCounter;
///
/// let calls = CallCounter::new();
/// let handle = calls.clone();
/// handle.hit();
/// assert_eq!(calls.count(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call and return the new total
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Calls recorded so far
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_store_switches() {
        let store = FlakyKeyValueStore::new();
        store.set("k", "v").await.unwrap();

        store.fail_reads(true);
        assert!(matches!(store.get("k").await, Err(StorageError::Unavailable(_))));

        store.fail_reads(false);
        store.fail_writes(true);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.remove("k").await.is_err());
        assert_eq!(store.peek("k").as_deref(), Some("v"));
        assert_eq!(store.counters().writes, 1);
    }
}
