//! Bounded in-process tier of the tiered cache.
//!
//! Values are held as `serde_json::Value` so one tier can serve callers of
//! any cacheable type. Each entry carries its absolute expiry; expired
//! entries are dropped on access. A TTL too large to represent as an
//! `Instant` never expires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::config::EvictionPolicy;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Option<Instant>,
    insertion_order: u64,
    last_access: u64,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Result of a memory tier lookup
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemoryLookup {
    Hit(Value),
    Expired,
    Miss,
}

#[derive(Debug)]
pub(crate) struct MemoryTier {
    data: HashMap<String, MemoryEntry>,
    capacity: usize,
    policy: EvictionPolicy,
    tick: u64,
}

impl MemoryTier {
    pub(crate) fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self { data: HashMap::new(), capacity: capacity.max(1), policy, tick: 0 }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up `key`, dropping it when expired at `now`.
    pub(crate) fn get(&mut self, key: &str, now: Instant) -> MemoryLookup {
        let tick = self.next_tick();
        match self.data.get_mut(key) {
            None => MemoryLookup::Miss,
            Some(entry) if entry.is_expired(now) => {
                self.data.remove(key);
                MemoryLookup::Expired
            }
            Some(entry) => {
                entry.last_access = tick;
                MemoryLookup::Hit(entry.value.clone())
            }
        }
    }

    /// Store `value` for `ttl` from `now`; returns the number of evicted keys.
    ///
    /// Overwriting an existing key keeps its insertion position.
    pub(crate) fn insert(&mut self, key: &str, value: Value, ttl: Duration, now: Instant) -> u64 {
        let tick = self.next_tick();
        let expires_at = now.checked_add(ttl);

        if let Some(entry) = self.data.get_mut(key) {
            entry.value = value;
            entry.expires_at = expires_at;
            entry.last_access = tick;
            return 0;
        }

        let mut evicted = 0;
        while self.data.len() >= self.capacity {
            if !self.evict_one() {
                break;
            }
            evicted += 1;
        }

        self.data.insert(
            key.to_string(),
            MemoryEntry { value, expires_at, insertion_order: tick, last_access: tick },
        );
        evicted
    }

    fn evict_one(&mut self) -> bool {
        let victim = match self.policy {
            EvictionPolicy::InsertionOrder => {
                self.data.iter().min_by_key(|(_, e)| e.insertion_order).map(|(k, _)| k.clone())
            }
            EvictionPolicy::Lru => {
                self.data.iter().min_by_key(|(_, e)| e.last_access).map(|(k, _)| k.clone())
            }
        };
        match victim {
            Some(key) => self.data.remove(&key).is_some(),
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Drop every entry expired at `now`; returns how many were dropped.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired(now));
        before - self.data.len()
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}
