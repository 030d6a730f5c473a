//! SQLite implementation of [`KeyValueStore`]
//!
//! Connections come from an r2d2 pool; every call runs on the blocking
//! thread pool so the async runtime never waits on disk I/O.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use mishkat_common::storage::{KeyValueStore, StorageResult};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::errors::{join_error, IntoStorageError};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER))
);";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Key-value store in a single `kv_store` table
pub struct SqliteKeyValueStore {
    pool: Pool<SqliteConnectionManager>,
    path: Option<PathBuf>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path` with up to `pool_size`
    /// connections and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;")?;
            conn.busy_timeout(BUSY_TIMEOUT)
        });
        let store = Self::from_manager(manager, pool_size.max(1), Some(path))?;
        info!(
            db_path = ?store.path,
            max_connections = store.pool.max_size(),
            "sqlite key-value store opened"
        );
        Ok(store)
    }

    /// Private in-memory database. The pool holds a single connection
    /// because every SQLite memory connection is its own database.
    pub fn in_memory() -> StorageResult<Self> {
        Self::from_manager(SqliteConnectionManager::memory(), 1, None)
    }

    fn from_manager(
        manager: SqliteConnectionManager,
        pool_size: u32,
        path: Option<PathBuf>,
    ) -> StorageResult<Self> {
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(IntoStorageError::into_storage)?;

        let conn = pool.get().map_err(IntoStorageError::into_storage)?;
        conn.execute_batch(SCHEMA_SQL).map_err(IntoStorageError::into_storage)?;

        Ok(Self { pool, path })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn with_connection<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(IntoStorageError::into_storage)?;
            op(&conn).map_err(IntoStorageError::into_storage)
        })
        .await
        .map_err(|e| join_error(&e))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            conn.query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, CAST(strftime('%s','now') AS INTEGER))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let keys = keys.to_vec();
        let removed = self
            .with_connection(move |conn| {
                let tx = conn.unchecked_transaction()?;
                let mut removed = 0;
                {
                    let mut stmt = tx.prepare("DELETE FROM kv_store WHERE key = ?1")?;
                    for key in &keys {
                        removed += stmt.execute(params![key])?;
                    }
                }
                tx.commit()?;
                Ok(removed)
            })
            .await?;
        debug!(removed, "Removed keys from sqlite store");
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
            let keys = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
    }
}
