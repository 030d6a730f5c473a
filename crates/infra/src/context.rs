//! Application wiring
//!
//! [`AppContext`] owns the configuration, the concrete stores and the one
//! [`RequestOrchestrator`] every content service shares.

use std::sync::Arc;

use anyhow::Context;
use mishkat_common::storage::{KeyValueStore, MemoryKeyValueStore, RowStore};
use mishkat_core::{
    DuaService, HadithApi, HadithService, QuranApi, QuranService, RequestOrchestrator,
    TranslationApi, TranslationService,
};
use mishkat_domain::Config;
use tracing::{info, warn};

use crate::config;
use crate::logging::init_tracing;
use crate::remote::RestRowStore;
use crate::storage::SqliteKeyValueStore;

/// Stores and orchestrator built from one [`Config`]
pub struct AppContext {
    config: Config,
    orchestrator: RequestOrchestrator,
    rows: Option<Arc<dyn RowStore>>,
}

impl AppContext {
    /// Load configuration, install tracing and build the context.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = config::load().context("loading configuration")?;
        init_tracing(&config.logging);
        Self::from_config(config)
    }

    /// Build stores and primitives for `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate().context("validating configuration")?;

        let kv: Arc<dyn KeyValueStore> = match &config.storage.kv_path {
            Some(path) => Arc::new(
                SqliteKeyValueStore::open(path, config.storage.pool_size)
                    .with_context(|| format!("opening cache database at {path}"))?,
            ),
            None => {
                warn!("No cache database configured; persistent tier is in memory");
                Arc::new(MemoryKeyValueStore::new())
            }
        };

        let rows: Option<Arc<dyn RowStore>> = match &config.remote {
            Some(remote) => Some(Arc::new(
                RestRowStore::new(remote).context("building remote row store client")?,
            )),
            None => None,
        };

        let orchestrator = RequestOrchestrator::from_config(&config, kv, rows.clone())
            .context("building request orchestrator")?;

        info!(
            kv_path = ?config.storage.kv_path,
            remote = rows.is_some(),
            endpoints = ?orchestrator.limiter().endpoints(),
            "Application context ready"
        );
        Ok(Self { config, orchestrator, rows })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    pub fn quran(&self, api: Arc<dyn QuranApi>) -> QuranService {
        QuranService::new(self.orchestrator.clone(), api)
    }

    pub fn hadith(&self, api: Arc<dyn HadithApi>) -> HadithService {
        HadithService::new(self.orchestrator.clone(), api)
    }

    pub fn duas(&self) -> DuaService {
        DuaService::new(self.orchestrator.clone())
    }

    /// Translation service; shares results through the remote table when one
    /// is configured.
    pub fn translation(&self, api: Arc<dyn TranslationApi>) -> TranslationService {
        let service = TranslationService::new(self.orchestrator.clone(), api);
        match &self.rows {
            Some(rows) => service.with_row_store(Arc::clone(rows)),
            None => service,
        }
    }

    /// Drain pending cache writes and log the collected metrics.
    pub async fn shutdown(&self) {
        self.orchestrator.cache().flush_writes().await;
        self.orchestrator.monitor().log_stats(None);
        info!(stats = ?self.orchestrator.cache().stats(), "Application context shut down");
    }
}
