//! Cache configuration types and builder patterns
//!
//! [`CacheConfig`] configures the tiered cache as a whole (memory capacity,
//! default TTL, persistent key prefix, write-behind queue).
//! [`CacheOptions`] carries the per-call overrides of `get_cached`.

use std::time::Duration;

use crate::error::CommonError;

/// Eviction policy of the memory tier when capacity is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the oldest-inserted key regardless of access recency
    #[default]
    InsertionOrder,
    /// Evict the least recently read or written key
    Lru,
}

/// Configuration for the tiered cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the memory tier
    pub memory_capacity: usize,

    /// TTL applied when a call does not supply one
    pub default_ttl: Duration,

    /// Prefix prepended to every key written to the persistent store
    pub key_prefix: String,

    /// Memory tier eviction policy
    pub eviction_policy: EvictionPolicy,

    /// Capacity of the write-behind queue feeding the persistent store
    pub write_queue_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            default_ttl: Duration::from_secs(3600),
            key_prefix: "cache_".to_string(),
            eviction_policy: EvictionPolicy::InsertionOrder,
            write_queue_capacity: 256,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.memory_capacity == 0 {
            return Err(CommonError::config_field(
                "memory_capacity",
                "memory_capacity must be greater than 0",
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(CommonError::config_field(
                "default_ttl",
                "default_ttl must be greater than zero",
            ));
        }
        if self.write_queue_capacity == 0 {
            return Err(CommonError::config_field(
                "write_queue_capacity",
                "write_queue_capacity must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Persistent-store key for a cache key
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

/// Builder for [`CacheConfig`] with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Set the memory tier capacity
    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.config.memory_capacity = capacity;
        self
    }

    /// Set the default TTL
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Set the persistent key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the eviction policy
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Set the write-behind queue capacity
    pub fn write_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.write_queue_capacity = capacity;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<CacheConfig, CommonError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-call options of `get_cached` / `query_with_cache`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Entry TTL; `None` uses the cache default
    pub ttl: Option<Duration>,
    /// Whether the memory tier participates
    pub use_memory_cache: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { ttl: None, use_memory_cache: true }
    }
}

impl CacheOptions {
    /// Options with an explicit TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl), use_memory_cache: true }
    }

    /// Skip the memory tier
    #[must_use]
    pub fn without_memory(mut self) -> Self {
        self.use_memory_cache = false;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::config.
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.memory_capacity, 100);
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.eviction_policy, EvictionPolicy::InsertionOrder);
        assert_eq!(config.storage_key("surah_1"), "cache_surah_1");
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::builder()
            .memory_capacity(5)
            .default_ttl(Duration::from_secs(60))
            .key_prefix("mishkat:")
            .eviction_policy(EvictionPolicy::Lru)
            .build()
            .unwrap();

        assert_eq!(config.memory_capacity, 5);
        assert_eq!(config.eviction_policy, EvictionPolicy::Lru);
        assert_eq!(config.storage_key("k"), "mishkat:k");
    }

    #[test]
    fn test_cache_config_validation() {
        assert!(CacheConfig::builder().memory_capacity(0).build().is_err());
        assert!(CacheConfig::builder().default_ttl(Duration::ZERO).build().is_err());
        assert!(CacheConfig::builder().write_queue_capacity(0).build().is_err());
    }

    #[test]
    fn test_cache_options() {
        let opts = CacheOptions::with_ttl(Duration::from_millis(100)).without_memory();
        assert_eq!(opts.ttl, Some(Duration::from_millis(100)));
        assert!(!opts.use_memory_cache);
        assert!(CacheOptions::default().use_memory_cache);
    }
}
