//! Port interfaces for the translation provider

use async_trait::async_trait;
use mishkat_domain::Result;

/// Translation origin
#[async_trait]
pub trait TranslationApi: Send + Sync {
    /// Translate `text` into `target_language` (lowercase language code)
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}
