//! Debounced batching of related calls
//!
//! See [`RequestBatcher`].

pub mod batcher;
pub mod config;
pub mod error;

pub use batcher::RequestBatcher;
pub use config::BatchConfig;
pub use error::BatchError;
