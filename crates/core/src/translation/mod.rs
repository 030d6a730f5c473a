//! Machine translation with a shared remote cache

pub mod ports;
pub mod service;

pub use ports::TranslationApi;
pub use service::{text_hash, TranslationService};
