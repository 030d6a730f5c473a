//! Persistent key-value store backed by SQLite

pub mod sqlite_kv;

pub use sqlite_kv::SqliteKeyValueStore;
