//! Port interfaces for the Hadith API

use async_trait::async_trait;
use mishkat_domain::{HadithPage, Result};

/// Hadith origin
#[async_trait]
pub trait HadithApi: Send + Sync {
    /// One page of `collection`; pages start at 1
    async fn page(&self, collection: &str, page: u32) -> Result<HadithPage>;
}
