//! Port interfaces for the Quran text API

use async_trait::async_trait;
use mishkat_domain::{Result, Surah, Verse, VerseRef};

/// Quran text origin
#[async_trait]
pub trait QuranApi: Send + Sync {
    /// Metadata of all 114 surahs
    async fn surah_list(&self) -> Result<Vec<Surah>>;

    /// Every verse of `surah`, in order
    async fn surah_verses(&self, surah: u16) -> Result<Vec<Verse>>;

    /// A single verse
    async fn verse(&self, reference: VerseRef) -> Result<Verse>;
}
