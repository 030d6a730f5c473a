//! Dua content service

use std::time::Duration;

use mishkat_common::cache::CacheOptions;
use mishkat_common::storage::{Row, RowQuery};
use mishkat_domain::constants::{DUAS_TABLE, DUA_TTL_SECS};
use mishkat_domain::{Dua, MishkatError};
use serde_json::{json, Value};

use crate::error::{ContentError, ContentResult};
use crate::orchestrator::RequestOrchestrator;

/// Serves duas from the `duas` table through the query cache
#[derive(Clone)]
pub struct DuaService {
    orchestrator: RequestOrchestrator,
}

impl DuaService {
    pub fn new(orchestrator: RequestOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Duas of one category ordered by id, cached for a day.
    ///
    /// # Errors
    /// Fails when no row store is configured, when the read fails, or when a
    /// row does not describe a dua.
    pub async fn by_category(&self, category: &str) -> ContentResult<Vec<Dua>> {
        let category = category.trim();
        if category.is_empty() {
            return Err(MishkatError::InvalidInput("dua category is empty".into()).into());
        }

        let query = RowQuery::table(DUAS_TABLE).eq("category", category).order_by("id", true);
        let options = CacheOptions::with_ttl(Duration::from_secs(DUA_TTL_SECS));
        let cache = self.orchestrator.cache();
        let rows = self
            .orchestrator
            .monitor()
            .measure("query:duas", Some(json!({ "category": category })), || {
                cache.query_with_cache(&query, options)
            })
            .await?;

        rows.into_iter().map(parse_row).collect()
    }
}

fn parse_row(row: Row) -> ContentResult<Dua> {
    serde_json::from_value(Value::Object(row)).map_err(|e| ContentError::invalid_row(DUAS_TABLE, &e))
}
