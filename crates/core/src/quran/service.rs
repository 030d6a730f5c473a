//! Quran content service

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::cache::CacheOptions;
use mishkat_domain::constants::{QURAN_API, SURAH_LIST_TTL_SECS, SURAH_VERSES_TTL_SECS};
use mishkat_domain::types::quran::validate_surah;
use mishkat_domain::{Surah, Verse, VerseRef};
use tracing::debug;

use super::ports::QuranApi;
use crate::error::ContentResult;
use crate::orchestrator::RequestOrchestrator;

/// Serves Quran content through the orchestrator
#[derive(Clone)]
pub struct QuranService {
    orchestrator: RequestOrchestrator,
    api: Arc<dyn QuranApi>,
}

impl QuranService {
    pub fn new(orchestrator: RequestOrchestrator, api: Arc<dyn QuranApi>) -> Self {
        Self { orchestrator, api }
    }

    /// All surahs, cached for a week
    pub async fn surah_list(&self) -> ContentResult<Vec<Surah>> {
        let api = Arc::clone(&self.api);
        self.orchestrator
            .fetch(QURAN_API, "surah_list", cached_for(SURAH_LIST_TTL_SECS), move || {
                let api = Arc::clone(&api);
                async move { api.surah_list().await }
            })
            .await
    }

    /// Verses of one surah, cached for a week
    pub async fn surah_verses(&self, surah: u16) -> ContentResult<Vec<Verse>> {
        validate_surah(surah)?;
        let api = Arc::clone(&self.api);
        let key = format!("surah_{surah}_verses");
        self.orchestrator
            .fetch(QURAN_API, &key, cached_for(SURAH_VERSES_TTL_SECS), move || {
                let api = Arc::clone(&api);
                async move { api.surah_verses(surah).await }
            })
            .await
    }

    /// One verse.
    ///
    /// Lookups of verses from the same surah that arrive together are
    /// collected into one batch keyed by the surah; each verse is still
    /// fetched (and cached) on its own.
    pub async fn verse(&self, reference: VerseRef) -> ContentResult<Verse> {
        let batch_key = format!("verses_surah_{}", reference.surah);
        let service = self.clone();
        debug!(verse = %reference, batch_key = %batch_key, "Queueing verse lookup");
        self.orchestrator
            .batcher()
            .batch_query(&batch_key, move || async move { service.fetch_verse(reference).await })
            .await
    }

    async fn fetch_verse(&self, reference: VerseRef) -> ContentResult<Verse> {
        let api = Arc::clone(&self.api);
        let key = format!("verse_{}_{}", reference.surah, reference.ayah);
        self.orchestrator
            .fetch(QURAN_API, &key, cached_for(SURAH_VERSES_TTL_SECS), move || {
                let api = Arc::clone(&api);
                async move { api.verse(reference).await }
            })
            .await
    }
}

fn cached_for(ttl_secs: u64) -> CacheOptions {
    CacheOptions::with_ttl(Duration::from_secs(ttl_secs))
}
