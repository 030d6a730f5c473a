//! Storage ports consumed by the cache tiers
//!
//! Both stores are shared external resources: callers only read, write and
//! delete through these traits and never hold a lock across calls.

use async_trait::async_trait;

use super::error::StorageResult;
use super::types::{Filter, Row, RowQuery};

/// Persistent key-value store holding caller-serialized JSON strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or overwrite a value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key; deleting a missing key succeeds
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete several keys
    async fn remove_many(&self, keys: &[String]) -> StorageResult<()>;

    /// List every stored key
    async fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Network-backed row store keyed by one or more columns.
///
/// Upserts resolve conflicts on the given columns with last-write-wins.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Run a read described by `query`
    async fn select(&self, query: &RowQuery) -> StorageResult<Vec<Row>>;

    /// Insert rows, replacing existing rows whose `conflict_columns` match
    async fn upsert(&self, table: &str, rows: &[Row], conflict_columns: &[&str])
        -> StorageResult<()>;

    /// Delete rows matching every filter; returns the number removed
    async fn delete(&self, table: &str, filters: &[Filter]) -> StorageResult<u64>;
}
