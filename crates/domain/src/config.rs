//! Configuration management
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration. A `rate_limits` table in a file
//! replaces the default endpoint set as a whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DATABASE, HADITH_API, QURAN_API, TRANSLATION_API};
use crate::errors::{MishkatError, Result};
use crate::impl_label_conversions;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheSettings,
    pub rate_limits: BTreeMap<String, RateLimitSettings>,
    pub batch: BatchSettings,
    pub retry: RetrySettings,
    pub performance: PerformanceSettings,
    pub storage: StorageSettings,
    pub remote: Option<RemoteSettings>,
    pub logging: LoggingSettings,
}

/// Memory eviction strategy of the tiered cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionMode {
    #[default]
    InsertionOrder,
    Lru,
}

impl_label_conversions!(EvictionMode {
    InsertionOrder => "insertion_order",
    Lru => "lru",
});

/// Tiered cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub memory_capacity: usize,
    pub default_ttl_secs: u64,
    pub key_prefix: String,
    pub eviction: EvictionMode,
    pub write_queue_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            default_ttl_secs: 3600,
            key_prefix: "cache_".to_string(),
            eviction: EvictionMode::InsertionOrder,
            write_queue_capacity: 256,
        }
    }
}

/// Sliding-window quota of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub window_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_limit: Option<usize>,
}

impl RateLimitSettings {
    pub const fn new(max_requests: usize, window_ms: u64, queue_limit: Option<usize>) -> Self {
        Self { max_requests, window_ms, queue_limit }
    }
}

fn default_rate_limits() -> BTreeMap<String, RateLimitSettings> {
    BTreeMap::from([
        (QURAN_API.to_string(), RateLimitSettings::new(30, 60_000, Some(100))),
        (HADITH_API.to_string(), RateLimitSettings::new(30, 60_000, Some(100))),
        (TRANSLATION_API.to_string(), RateLimitSettings::new(10, 60_000, Some(20))),
        (DATABASE.to_string(), RateLimitSettings::new(100, 60_000, None)),
    ])
}

/// Request batching settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub delay_ms: u64,
    pub isolate_failures: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { delay_ms: 50, isolate_failures: false }
    }
}

/// Retry with backoff settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { retries: 3, initial_delay_ms: 1000 }
    }
}

/// Performance monitor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub enabled: bool,
    pub max_metrics_per_name: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self { enabled: true, max_metrics_per_name: 1000 }
    }
}

/// Local persistent store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite file path; `None` keeps the persistent tier in memory
    pub kv_path: Option<String>,
    pub pool_size: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { kv_path: Some("mishkat-cache.db".to_string()), pool_size: 4 }
    }
}

/// Remote row store (PostgREST) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_remote_timeout() -> u64 {
    10
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            rate_limits: default_rate_limits(),
            batch: BatchSettings::default(),
            retry: RetrySettings::default(),
            performance: PerformanceSettings::default(),
            storage: StorageSettings::default(),
            remote: None,
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Reject values the runtime primitives cannot work with.
    ///
    /// # Errors
    /// Returns `MishkatError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        fn positive(value: u64, field: &str) -> Result<()> {
            if value == 0 {
                return Err(MishkatError::Config(format!("{field} must be greater than 0")));
            }
            Ok(())
        }

        positive(self.cache.memory_capacity as u64, "cache.memory_capacity")?;
        positive(self.cache.default_ttl_secs, "cache.default_ttl_secs")?;
        positive(self.cache.write_queue_capacity as u64, "cache.write_queue_capacity")?;
        if self.cache.key_prefix.is_empty() {
            return Err(MishkatError::Config("cache.key_prefix must not be empty".into()));
        }

        for (endpoint, limit) in &self.rate_limits {
            positive(limit.max_requests as u64, &format!("rate_limits.{endpoint}.max_requests"))?;
            positive(limit.window_ms, &format!("rate_limits.{endpoint}.window_ms"))?;
        }

        positive(self.batch.delay_ms, "batch.delay_ms")?;
        positive(self.performance.max_metrics_per_name as u64, "performance.max_metrics_per_name")?;
        positive(u64::from(self.storage.pool_size), "storage.pool_size")?;

        if let Some(remote) = &self.remote {
            if remote.base_url.is_empty() {
                return Err(MishkatError::Config("remote.base_url must not be empty".into()));
            }
            positive(remote.timeout_secs, "remote.timeout_secs")?;
        }
        Ok(())
    }

    /// Quota for `endpoint`, if configured
    pub fn rate_limit(&self, endpoint: &str) -> Option<&RateLimitSettings> {
        self.rate_limits.get(endpoint)
    }
}
