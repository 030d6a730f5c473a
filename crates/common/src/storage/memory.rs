//! In-process store implementations
//!
//! Used as ephemeral stores (no persistence configured) and as test doubles.
//! Each store counts its operations so tests can assert which tiers were
//! touched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::error::StorageResult;
use super::traits::{KeyValueStore, RowStore};
use super::types::{Filter, Row, RowQuery};

/// Operation counters of an in-memory store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounters {
    /// Read operations (`get`, `keys`, `select`)
    pub reads: u64,
    /// Write operations (`set`, `upsert`)
    pub writes: u64,
    /// Delete operations (`remove`, `remove_many`, `delete`)
    pub deletes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl Counters {
    fn read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StoreCounters {
        StoreCounters {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
    }
}

/// Key-value store held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    data: DashMap<String, String>,
    counters: Counters,
}

impl MemoryKeyValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation counts since creation or the last [`reset_counters`](Self::reset_counters)
    pub fn counters(&self) -> StoreCounters {
        self.counters.snapshot()
    }

    /// Zero the operation counters
    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    /// Number of stored keys (not counted as a read)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw value lookup that bypasses the counters
    pub fn peek(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|v| v.value().clone())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.counters.read();
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.counters.write();
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.counters.delete();
        self.data.remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()> {
        self.counters.delete();
        for key in keys {
            self.data.remove(key);
        }
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        self.counters.read();
        Ok(self.data.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// Row store holding tables in memory.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    counters: Counters,
}

impl MemoryRowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows without conflict resolution and without touching counters
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.tables.write().entry(table.to_string()).or_default().extend(rows);
    }

    /// Operation counts
    pub fn counters(&self) -> StoreCounters {
        self.counters.snapshot()
    }

    /// Zero the operation counters
    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    /// Number of rows in `table` (not counted as a read)
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn select(&self, query: &RowQuery) -> StorageResult<Vec<Row>> {
        self.counters.read();
        let tables = self.tables.read();
        Ok(tables.get(&query.table).map(|rows| query.apply(rows)).unwrap_or_default())
    }

    async fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_columns: &[&str],
    ) -> StorageResult<()> {
        self.counters.write();
        let mut tables = self.tables.write();
        let existing = tables.entry(table.to_string()).or_default();

        for row in rows {
            let same_key = |candidate: &Row| {
                !conflict_columns.is_empty()
                    && conflict_columns.iter().all(|col| candidate.get(*col) == row.get(*col))
            };
            match existing.iter_mut().find(|candidate| same_key(candidate)) {
                Some(slot) => *slot = row.clone(),
                None => existing.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> StorageResult<u64> {
        self.counters.delete();
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }
}
