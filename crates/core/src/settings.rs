//! Conversion from the application [`Config`] to primitive configurations

use std::time::Duration;

use mishkat_common::batch::BatchConfig;
use mishkat_common::cache::{CacheConfig, EvictionPolicy};
use mishkat_common::error::CommonError;
use mishkat_common::observability::MonitorConfig;
use mishkat_common::resilience::{RateLimitConfig, RateLimiter, RetryConfig};
use mishkat_domain::{
    BatchSettings, CacheSettings, Config, EvictionMode, PerformanceSettings, RateLimitSettings,
    RetrySettings,
};
use tracing::debug;

use crate::error::ContentResult;

pub fn cache_config(settings: &CacheSettings) -> ContentResult<CacheConfig> {
    let eviction = match settings.eviction {
        EvictionMode::InsertionOrder => EvictionPolicy::InsertionOrder,
        EvictionMode::Lru => EvictionPolicy::Lru,
    };
    Ok(CacheConfig::builder()
        .memory_capacity(settings.memory_capacity)
        .default_ttl(Duration::from_secs(settings.default_ttl_secs))
        .key_prefix(settings.key_prefix.clone())
        .eviction_policy(eviction)
        .write_queue_capacity(settings.write_queue_capacity)
        .build()?)
}

pub fn rate_limit_config(settings: &RateLimitSettings) -> ContentResult<RateLimitConfig> {
    let mut builder = RateLimitConfig::builder()
        .max_requests(settings.max_requests)
        .window(Duration::from_millis(settings.window_ms));
    if let Some(limit) = settings.queue_limit {
        builder = builder.queue_limit(limit);
    }
    Ok(builder.build()?)
}

pub fn batch_config(settings: &BatchSettings) -> ContentResult<BatchConfig> {
    let mut config = BatchConfig::with_delay(Duration::from_millis(settings.delay_ms));
    if settings.isolate_failures {
        config = config.isolated();
    }
    config.validate()?;
    Ok(config)
}

pub fn retry_config(settings: &RetrySettings) -> ContentResult<RetryConfig> {
    let config = RetryConfig::new(settings.retries, Duration::from_millis(settings.initial_delay_ms));
    config.validate().map_err(CommonError::from)?;
    Ok(config)
}

pub fn monitor_config(settings: &PerformanceSettings) -> ContentResult<MonitorConfig> {
    let config =
        MonitorConfig { enabled: settings.enabled, max_metrics_per_name: settings.max_metrics_per_name };
    config.validate()?;
    Ok(config)
}

/// Build a limiter with every configured endpoint registered.
pub fn rate_limiter(config: &Config) -> ContentResult<RateLimiter> {
    let limiter = RateLimiter::new();
    for (endpoint, settings) in &config.rate_limits {
        limiter.register_endpoint(endpoint.as_str(), rate_limit_config(settings)?)?;
    }
    debug!(endpoints = ?limiter.endpoints(), "Rate limiter configured");
    Ok(limiter)
}
