//! Storage ports and in-memory implementations
//!
//! The cache tiers consume two external collaborators:
//! - a persistent [`KeyValueStore`] holding JSON strings, and
//! - a network-backed [`RowStore`] addressed by [`RowQuery`] descriptions.
//!
//! Concrete adapters (SQLite, HTTP) live in the infrastructure crate.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryKeyValueStore, MemoryRowStore, StoreCounters};
pub use traits::{KeyValueStore, RowStore};
pub use types::{Filter, FilterOp, OrderBy, Row, RowQuery};
