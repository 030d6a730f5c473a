//! Hadith content service

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::cache::CacheOptions;
use mishkat_domain::constants::{HADITH_API, HADITH_PAGE_TTL_SECS};
use mishkat_domain::{HadithPage, MishkatError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::HadithApi;
use crate::error::ContentResult;
use crate::orchestrator::RequestOrchestrator;

/// Queue priority of speculative next-page loads; user requests use 0.
const PREFETCH_PRIORITY: i32 = -1;

/// Serves hadith pages through the orchestrator
#[derive(Clone)]
pub struct HadithService {
    orchestrator: RequestOrchestrator,
    api: Arc<dyn HadithApi>,
}

impl HadithService {
    pub fn new(orchestrator: RequestOrchestrator, api: Arc<dyn HadithApi>) -> Self {
        Self { orchestrator, api }
    }

    /// One page of a collection, cached for a day
    pub async fn page(&self, collection: &str, page: u32) -> ContentResult<HadithPage> {
        self.load(collection, page, 0).await
    }

    /// Warm the cache with the page after `current` in the background.
    ///
    /// Returns `None` on the last page. The load queues behind regular
    /// requests and its failure is only logged.
    pub fn prefetch_next(&self, current: &HadithPage) -> Option<JoinHandle<()>> {
        let next = current.next_page()?;
        let service = self.clone();
        let collection = current.collection.clone();
        Some(tokio::spawn(async move {
            match service.load(&collection, next, PREFETCH_PRIORITY).await {
                Ok(_) => debug!(collection = %collection, page = next, "Prefetched hadith page"),
                Err(e) => {
                    warn!(collection = %collection, page = next, error = %e, "Hadith prefetch failed");
                }
            }
        }))
    }

    async fn load(&self, collection: &str, page: u32, priority: i32) -> ContentResult<HadithPage> {
        let collection = collection.trim().to_lowercase();
        if collection.is_empty() {
            return Err(MishkatError::InvalidInput("hadith collection is empty".into()).into());
        }
        if page == 0 {
            return Err(MishkatError::InvalidInput("hadith pages start at 1".into()).into());
        }

        let key = format!("hadith_{collection}_{page}");
        let options = CacheOptions::with_ttl(Duration::from_secs(HADITH_PAGE_TTL_SECS));
        let api = Arc::clone(&self.api);
        self.orchestrator
            .fetch_with_priority(HADITH_API, priority, &key, options, move || {
                let api = Arc::clone(&api);
                let collection = collection.clone();
                async move { api.page(&collection, page).await }
            })
            .await
    }
}
