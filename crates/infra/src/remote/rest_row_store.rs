//! PostgREST-style implementation of [`RowStore`]
//!
//! Tables live at `<base_url>/<table>`. Filters become `column=op.value`
//! query pairs, ordering `order=column.asc|desc`, and upserts are `POST`s
//! with `Prefer: resolution=merge-duplicates` and `on_conflict`.

use std::time::Duration;

use async_trait::async_trait;
use mishkat_common::storage::{Filter, Row, RowQuery, RowStore, StorageError, StorageResult};
use mishkat_domain::RemoteSettings;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::errors::http_error;

const PREFER: &str = "Prefer";

/// Row store client for a PostgREST endpoint
#[derive(Clone)]
pub struct RestRowStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RestRowStore {
    /// Build a client for `settings`. The API key, when present, is sent as
    /// both `apikey` and bearer token.
    pub fn new(settings: &RemoteSettings) -> StorageResult<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut headers = HeaderMap::new();
        if let Some(key) = &settings.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| StorageError::InvalidQuery(format!("invalid API key header: {e}")))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| StorageError::InvalidQuery(format!("invalid API key header: {e}")))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| http_error(&e, timeout))?;

        Ok(Self { client, base_url: settings.base_url.trim_end_matches('/').to_string(), timeout })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        let response = request.send().await.map_err(|e| http_error(&e, self.timeout))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Remote { status: status.as_u16(), message })
    }

    async fn rows(&self, response: Response) -> StorageResult<Vec<Row>> {
        response.json::<Vec<Row>>().await.map_err(|e| http_error(&e, self.timeout))
    }
}

/// `column=op.value` pairs for `filters`
fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), operand(&f.value))))
        .collect()
}

fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn query_params(query: &RowQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order_by {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl RowStore for RestRowStore {
    async fn select(&self, query: &RowQuery) -> StorageResult<Vec<Row>> {
        debug!(table = %query.table, filters = query.filters.len(), "Remote select");
        let request = self.client.get(self.table_url(&query.table)).query(&query_params(query));
        let response = self.send(request).await?;
        self.rows(response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_columns: &[&str],
    ) -> StorageResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(table = %table, rows = rows.len(), "Remote upsert");
        let mut request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(rows);
        if !conflict_columns.is_empty() {
            request = request.query(&[("on_conflict", conflict_columns.join(","))]);
        }
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> StorageResult<u64> {
        if filters.is_empty() {
            return Err(StorageError::InvalidQuery(format!(
                "refusing to delete every row of '{table}'"
            )));
        }
        debug!(table = %table, filters = filters.len(), "Remote delete");
        let request = self
            .client
            .delete(self.table_url(table))
            .header(PREFER, "return=representation")
            .query(&filter_params(filters));
        let response = self.send(request).await?;
        Ok(self.rows(response).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_params_follow_postgrest_syntax() {
        let query = RowQuery::table("translation_cache")
            .eq("text_hash", "abc")
            .eq("target_language", "en")
            .order_by("created_at", false)
            .limit(1);

        assert_eq!(
            query_params(&query),
            vec![
                ("select".to_string(), "*".to_string()),
                ("text_hash".to_string(), "eq.abc".to_string()),
                ("target_language".to_string(), "eq.en".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_string_operands_are_rendered_as_json() {
        assert_eq!(operand(&json!(7)), "7");
        assert_eq!(operand(&json!(true)), "true");
    }
}
