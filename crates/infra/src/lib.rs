//! # Mishkat Infrastructure
//!
//! Concrete adapters for the storage ports and application wiring.
//!
//! This crate contains:
//! - SQLite key-value store (rusqlite + r2d2)
//! - PostgREST row store client (reqwest)
//! - Configuration loading (files, `.env`, `MISHKAT_*` overrides)
//! - Tracing subscriber initialisation
//!
//! ## Architecture
//! - Implements traits defined in `mishkat-common::storage`
//! - Contains all "impure" code (disk and network I/O)

pub mod config;
pub mod context;
mod errors;
pub mod logging;
pub mod remote;
pub mod storage;

pub use context::AppContext;
pub use logging::init_tracing;
pub use remote::RestRowStore;
pub use storage::SqliteKeyValueStore;
