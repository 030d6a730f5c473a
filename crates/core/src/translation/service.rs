//! Translation service
//!
//! Lookups go memory → local store → shared `translation_cache` table →
//! provider. Fresh provider results are written back to the shared table in
//! the background so other installations can reuse them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::TryFutureExt;
use mishkat_common::cache::CacheOptions;
use mishkat_common::storage::{Row, RowQuery, RowStore};
use mishkat_domain::constants::{
    DATABASE, TRANSLATION_API, TRANSLATION_CACHE_TABLE, TRANSLATION_CONFLICT_COLUMNS,
    TRANSLATION_TTL_SECS,
};
use mishkat_domain::{TranslationRecord, TranslationRequest};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ports::TranslationApi;
use crate::error::{ContentError, ContentResult};
use crate::orchestrator::RequestOrchestrator;

/// BLAKE3 digest of `text` as lowercase hex.
pub fn text_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Translates text, sharing results through the remote cache table
#[derive(Clone)]
pub struct TranslationService {
    orchestrator: RequestOrchestrator,
    api: Arc<dyn TranslationApi>,
    rows: Option<Arc<dyn RowStore>>,
}

impl TranslationService {
    pub fn new(orchestrator: RequestOrchestrator, api: Arc<dyn TranslationApi>) -> Self {
        Self { orchestrator, api, rows: None }
    }

    /// Read and publish translations through `rows`
    #[must_use]
    pub fn with_row_store(mut self, rows: Arc<dyn RowStore>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Translate `request`, cached for 30 days.
    pub async fn translate(&self, request: &TranslationRequest) -> ContentResult<String> {
        let hash = text_hash(&request.text);
        let key = format!("translation_{}_{hash}", request.target_language);
        let options = CacheOptions::with_ttl(Duration::from_secs(TRANSLATION_TTL_SECS));
        let metadata = json!({ "target_language": request.target_language });

        self.orchestrator
            .monitor()
            .measure("translate", Some(metadata), || {
                self.orchestrator.cache().get_cached(&key, || self.resolve(request, hash), options)
            })
            .await
    }

    async fn resolve(&self, request: &TranslationRequest, hash: String) -> ContentResult<String> {
        if let Some(found) = self.lookup_shared(&hash, &request.target_language).await {
            debug!(target_language = %request.target_language, "Shared translation cache hit");
            return Ok(found);
        }

        let api = Arc::clone(&self.api);
        let translated = self
            .orchestrator
            .call(TRANSLATION_API, || {
                let api = Arc::clone(&api);
                let text = request.text.clone();
                let language = request.target_language.clone();
                async move { api.translate(&text, &language).await }
            })
            .await?;

        let record = TranslationRecord {
            text_hash: hash,
            target_language: request.target_language.clone(),
            source_text: request.text.clone(),
            translated_text: translated.clone(),
            created_at: Utc::now(),
        };
        self.publish(record);
        Ok(translated)
    }

    /// Shared table lookup; any failure is treated as a miss.
    async fn lookup_shared(&self, hash: &str, target_language: &str) -> Option<String> {
        let rows = self.rows.as_ref()?;
        let query = RowQuery::table(TRANSLATION_CACHE_TABLE)
            .eq("text_hash", hash)
            .eq("target_language", target_language)
            .limit(1);

        let result: ContentResult<Vec<Row>> = self
            .orchestrator
            .limiter()
            .throttle(DATABASE, || rows.select(&query).map_err(ContentError::from))
            .await;

        match result {
            Ok(found) => found
                .into_iter()
                .next()
                .and_then(|row| row.get("translated_text").and_then(Value::as_str).map(str::to_owned)),
            Err(e) => {
                warn!(table = TRANSLATION_CACHE_TABLE, error = %e, "Shared translation lookup failed");
                None
            }
        }
    }

    /// Upsert `record` into the shared table without waiting for it.
    fn publish(&self, record: TranslationRecord) {
        let Some(rows) = self.rows.clone() else {
            return;
        };
        let row = match serde_json::to_value(&record) {
            Ok(Value::Object(row)) => row,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Could not encode translation record");
                return;
            }
        };
        let limiter = self.orchestrator.limiter().clone();

        tokio::spawn(async move {
            let result: ContentResult<()> = limiter
                .throttle(DATABASE, || {
                    let rows = Arc::clone(&rows);
                    async move {
                        rows.upsert(TRANSLATION_CACHE_TABLE, &[row], &TRANSLATION_CONFLICT_COLUMNS)
                            .await
                            .map_err(ContentError::from)
                    }
                })
                .await;
            match result {
                Ok(()) => debug!(target_language = %record.target_language, "Translation published"),
                Err(e) => warn!(error = %e, "Failed to publish translation"),
            }
        });
    }
}
