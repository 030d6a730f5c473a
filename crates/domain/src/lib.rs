//! # Mishkat Domain
//!
//! Content types and models for Mishkat.
//!
//! This crate contains:
//! - Content types (surahs, verses, hadith pages, duas, translations)
//! - The application error type and Result alias
//! - Configuration structures
//! - Endpoint, table and TTL constants
//!
//! ## Architecture
//! - No dependencies on other Mishkat crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
