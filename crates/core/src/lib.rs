//! # Mishkat Core
//!
//! Content services built on the orchestration primitives.
//!
//! This crate contains:
//! - The [`RequestOrchestrator`] composing cache, rate limiter, batcher,
//!   monitor and retry
//! - Port interfaces (traits) for the Quran, Hadith and translation origins
//! - Services for Quran, Hadith, dua and translation content
//!
//! ## Architecture Principles
//! - Depends only on `mishkat-common` and `mishkat-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod dua;
pub mod error;
pub mod hadith;
pub mod orchestrator;
pub mod quran;
pub mod settings;
pub mod translation;

pub use dua::DuaService;
pub use error::{ContentError, ContentResult};
pub use hadith::{HadithApi, HadithService};
pub use orchestrator::RequestOrchestrator;
pub use quran::{QuranApi, QuranService};
pub use translation::{text_hash, TranslationApi, TranslationService};
