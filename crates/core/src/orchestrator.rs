//! Composition of the orchestration primitives
//!
//! Every content request takes the same path:
//!
//! ```text
//! measure(label)
//!   └─ get_cached(key)            memory → persistent → origin
//!        └─ retry(backoff)        transient origin errors only
//!             └─ throttle(endpoint)
//!                  └─ origin()
//! ```
//!
//! The primitives are constructed once by the application and shared by
//! reference; nothing here is process-global.

use std::future::Future;
use std::sync::Arc;

use futures::TryFutureExt;
use mishkat_common::batch::RequestBatcher;
use mishkat_common::cache::{CacheOptions, TieredCache};
use mishkat_common::observability::PerformanceMonitor;
use mishkat_common::resilience::{policies, RateLimiter, RetryConfig, RetryExecutor};
use mishkat_common::storage::{KeyValueStore, RowStore};
use mishkat_domain::{Config, MishkatError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::error::{ContentError, ContentResult};
use crate::settings;

struct Primitives {
    cache: TieredCache,
    limiter: RateLimiter,
    batcher: RequestBatcher,
    monitor: PerformanceMonitor,
    retry: RetryConfig,
}

/// Shared handle over the cache, rate limiter, batcher, monitor and retry
/// schedule. Cloning is cheap.
#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Primitives>,
}

impl RequestOrchestrator {
    pub fn new(
        cache: TieredCache,
        limiter: RateLimiter,
        batcher: RequestBatcher,
        monitor: PerformanceMonitor,
        retry: RetryConfig,
    ) -> Self {
        Self { inner: Arc::new(Primitives { cache, limiter, batcher, monitor, retry }) }
    }

    /// Build every primitive from `config` over the given stores.
    ///
    /// # Errors
    /// Returns the first configuration section that fails validation.
    pub fn from_config(
        config: &Config,
        persistent: Arc<dyn KeyValueStore>,
        rows: Option<Arc<dyn RowStore>>,
    ) -> ContentResult<Self> {
        let mut cache = TieredCache::new(settings::cache_config(&config.cache)?, persistent);
        if let Some(rows) = rows {
            cache = cache.with_row_store(rows);
        }
        Ok(Self::new(
            cache,
            settings::rate_limiter(config)?,
            RequestBatcher::new(settings::batch_config(&config.batch)?),
            PerformanceMonitor::with_config(settings::monitor_config(&config.performance)?),
            settings::retry_config(&config.retry)?,
        ))
    }

    pub fn cache(&self) -> &TieredCache {
        &self.inner.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn batcher(&self) -> &RequestBatcher {
        &self.inner.batcher
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.inner.monitor
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry
    }

    /// Call `origin` under the quota of `endpoint`, retrying transient
    /// failures. Nothing is cached.
    pub async fn call<T, F, Fut>(&self, endpoint: &str, origin: F) -> ContentResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MishkatError>>,
    {
        self.call_with_priority(endpoint, 0, origin).await
    }

    /// [`call`](Self::call) with an explicit queue priority; higher values
    /// are admitted first when the endpoint is at capacity.
    pub async fn call_with_priority<T, F, Fut>(
        &self,
        endpoint: &str,
        priority: i32,
        mut origin: F,
    ) -> ContentResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MishkatError>>,
    {
        let limiter = &self.inner.limiter;
        RetryExecutor::new(self.inner.retry.clone(), policies::ClassifiedRetry)
            .execute(move || {
                let attempt = origin().map_err(ContentError::from);
                limiter.throttle_with_priority(endpoint, priority, move || attempt)
            })
            .await
    }

    /// Serve `cache_key` from the cache, or [`call`](Self::call) the origin
    /// and cache its value. The whole request is timed as
    /// `fetch:<endpoint>`.
    pub async fn fetch<T, F, Fut>(
        &self,
        endpoint: &str,
        cache_key: &str,
        options: CacheOptions,
        origin: F,
    ) -> ContentResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MishkatError>>,
    {
        self.fetch_with_priority(endpoint, 0, cache_key, options, origin).await
    }

    /// [`fetch`](Self::fetch) with an explicit queue priority for the
    /// origin call.
    pub async fn fetch_with_priority<T, F, Fut>(
        &self,
        endpoint: &str,
        priority: i32,
        cache_key: &str,
        options: CacheOptions,
        origin: F,
    ) -> ContentResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MishkatError>>,
    {
        let label = format!("fetch:{endpoint}");
        self.inner
            .monitor
            .measure(&label, Some(json!({ "key": cache_key, "priority": priority })), || {
                self.inner.cache.get_cached(
                    cache_key,
                    || self.call_with_priority(endpoint, priority, origin),
                    options,
                )
            })
            .await
    }
}
