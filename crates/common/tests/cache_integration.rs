//! Integration tests for the tiered cache
//!
//! Exercises TTL expiry, promotion between tiers, single-flight fetches and
//! tolerance of persistent store failures.

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::cache::{CacheConfig, CacheError, CacheOptions, TieredCache};
use mishkat_common::storage::{KeyValueStore, MemoryKeyValueStore, MemoryRowStore, Row, RowQuery};
use mishkat_common::testing::{CallCounter, FlakyKeyValueStore};
use mishkat_common::time::MockClock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Surah {
    number: u32,
    name: String,
}

fn al_fatiha() -> Surah {
    Surah { number: 1, name: "Al-Fatiha".to_string() }
}

fn cache_over(store: Arc<dyn KeyValueStore>, clock: &MockClock) -> TieredCache<MockClock> {
    TieredCache::with_clock(CacheConfig::default(), store, clock.clone())
}

async fn fetch_counted(
    cache: &TieredCache<MockClock>,
    calls: &CallCounter,
    options: CacheOptions,
) -> Result<Surah, CacheError> {
    let calls = calls.clone();
    cache
        .get_cached(
            "surah:1",
            || async move {
                calls.hit();
                Ok(al_fatiha())
            },
            options,
        )
        .await
}

/// Validates TTL expiry for the one-minute entry scenario.
///
/// Assertions:
/// - Ensures a read inside the TTL does not reach the origin.
/// - Ensures a read past the TTL fetches again.
#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let clock = MockClock::starting_at(Duration::from_secs(1_000));
    let cache = cache_over(Arc::new(MemoryKeyValueStore::new()), &clock);
    let calls = CallCounter::new();
    let options = CacheOptions::with_ttl(Duration::from_secs(60));

    fetch_counted(&cache, &calls, options).await.unwrap();
    clock.advance(Duration::from_secs(59));
    fetch_counted(&cache, &calls, options).await.unwrap();
    assert_eq!(calls.count(), 1);

    clock.advance(Duration::from_secs(2));
    fetch_counted(&cache, &calls, options).await.unwrap();
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn test_persisted_entry_format() {
    let clock = MockClock::starting_at(Duration::from_secs(1_000));
    let store = Arc::new(MemoryKeyValueStore::new());
    let cache = cache_over(store.clone(), &clock);

    fetch_counted(&cache, &CallCounter::new(), CacheOptions::with_ttl(Duration::from_secs(60)))
        .await
        .unwrap();
    cache.flush_writes().await;

    let raw = store.peek("cache_surah:1").expect("entry persisted under prefix");
    let entry: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(entry["data"], json!({"number": 1, "name": "Al-Fatiha"}));
    assert_eq!(entry["timestamp"], json!(1_000_000));
    assert_eq!(entry["ttl"], json!(60_000));
}

/// Validates promotion for the cold memory tier scenario.
///
/// Assertions:
/// - Ensures the first read is served by the persistent tier.
/// - Ensures the second read touches neither the store nor the origin.
#[tokio::test]
async fn test_persistent_hit_is_promoted_to_memory() {
    let clock = MockClock::starting_at(Duration::from_secs(1_000));
    let store = Arc::new(MemoryKeyValueStore::new());
    let calls = CallCounter::new();

    let warm = cache_over(store.clone(), &clock);
    fetch_counted(&warm, &calls, CacheOptions::default()).await.unwrap();
    warm.flush_writes().await;

    let cold = cache_over(store.clone(), &clock);
    store.reset_counters();

    assert_eq!(fetch_counted(&cold, &calls, CacheOptions::default()).await.unwrap(), al_fatiha());
    assert_eq!(store.counters().reads, 1);

    assert_eq!(fetch_counted(&cold, &calls, CacheOptions::default()).await.unwrap(), al_fatiha());
    assert_eq!(store.counters().reads, 1);
    assert_eq!(calls.count(), 1);

    let stats = cold.stats();
    assert_eq!((stats.persistent_hits, stats.memory_hits), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_share_one_fetch() {
    let clock = MockClock::new();
    let cache = cache_over(Arc::new(MemoryKeyValueStore::new()), &clock);
    let calls = CallCounter::new();

    let slow_fetch = |calls: CallCounter| async move {
        calls.hit();
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, CacheError>(al_fatiha())
    };

    let (a, b) = tokio::join!(
        cache.get_cached("surah:1", || slow_fetch(calls.clone()), CacheOptions::default()),
        cache.get_cached("surah:1", || slow_fetch(calls.clone()), CacheOptions::default()),
    );

    assert_eq!(a.unwrap(), al_fatiha());
    assert_eq!(b.unwrap(), al_fatiha());
    assert_eq!(calls.count(), 1);
    assert_eq!(cache.stats().single_flight_joins, 1);
}

/// Validates failure tolerance for the broken persistent store scenario.
///
/// Assertions:
/// - Ensures an unreadable store is treated as a miss.
/// - Ensures a failed write-behind does not fail the call and is counted.
#[tokio::test]
async fn test_store_failures_degrade_to_misses() {
    let clock = MockClock::new();
    let store = Arc::new(FlakyKeyValueStore::new());
    store.fail_reads(true);
    store.fail_writes(true);
    let cache = cache_over(store.clone(), &clock);
    let calls = CallCounter::new();

    let options = CacheOptions::default().without_memory();
    fetch_counted(&cache, &calls, options).await.unwrap();
    fetch_counted(&cache, &calls, options).await.unwrap();
    cache.flush_writes().await;

    assert_eq!(calls.count(), 2);
    let stats = cache.stats();
    assert_eq!(stats.read_failures, 2);
    assert_eq!(stats.write_failures, 2);
    assert!(store.peek("cache_surah:1").is_none());
}

/// Validates `TieredCache::get_cached` for the stale entry behind a slow
/// store scenario.
///
/// Assertions:
/// - Ensures discarding an expired persistent entry does not wait on a
///   full write-behind queue.
/// - Ensures the dropped removal is counted as a write failure.
#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_expired_entry_read_does_not_wait_on_write_queue() {
    let clock = MockClock::starting_at(Duration::from_secs(1_000));
    let store = Arc::new(FlakyKeyValueStore::new());
    let now_ms = 1_000_000u64;
    let expired = json!({"data": 1, "timestamp": now_ms - 5_000, "ttl": 1_000}).to_string();
    store.set("cache_exp", &expired).await.unwrap();
    store.set_write_delay(Some(Duration::from_secs(60)));

    let config = CacheConfig::builder().write_queue_capacity(1).build().unwrap();
    let cache = TieredCache::with_clock(config, store.clone(), clock.clone());
    for key in ["a", "b", "c"] {
        let _: u32 = cache
            .get_cached(key, || async { Ok::<_, CacheError>(0) }, CacheOptions::default())
            .await
            .unwrap();
    }

    let started = tokio::time::Instant::now();
    let value: u32 = cache
        .get_cached("exp", || async { Ok::<_, CacheError>(2) }, CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(cache.stats().write_failures >= 1);
}

/// Validates `TieredCache::get_cached` for the unbounded TTL scenario.
///
/// Assertions:
/// - Ensures a `Duration::MAX` TTL is accepted without panicking.
/// - Ensures the entry is still served from memory years later.
#[tokio::test]
async fn test_maximal_ttl_is_served_from_memory() {
    let clock = MockClock::starting_at(Duration::from_secs(1_000));
    let cache = cache_over(Arc::new(MemoryKeyValueStore::new()), &clock);
    let calls = CallCounter::new();
    let options = CacheOptions::with_ttl(Duration::MAX);

    fetch_counted(&cache, &calls, options).await.unwrap();
    clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
    let surah = fetch_counted(&cache, &calls, options).await.unwrap();

    assert_eq!(surah, al_fatiha());
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_query_with_cache_reads_rows_once() {
    let clock = MockClock::new();
    let rows = Arc::new(MemoryRowStore::new());
    let seeded: Vec<Row> = (1..=3)
        .map(|n| serde_json::from_value(json!({"surah_number": n, "language": "en"})).unwrap())
        .collect();
    rows.seed("translations", seeded);

    let cache = cache_over(Arc::new(MemoryKeyValueStore::new()), &clock).with_row_store(rows.clone());
    let query = RowQuery::table("translations").eq("language", "en");

    let first = cache.query_with_cache(&query, CacheOptions::default()).await.unwrap();
    let second = cache.query_with_cache(&query, CacheOptions::default()).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(rows.counters().reads, 1);
}

#[tokio::test]
async fn test_clear_removes_only_prefixed_keys() {
    let clock = MockClock::new();
    let store = Arc::new(MemoryKeyValueStore::new());
    store.set("settings", "{}").await.unwrap();
    let cache = cache_over(store.clone(), &clock);

    fetch_counted(&cache, &CallCounter::new(), CacheOptions::default()).await.unwrap();
    assert_eq!(cache.clear().await.unwrap(), 1);

    assert_eq!(store.peek("settings").as_deref(), Some("{}"));
    assert_eq!(cache.stats().memory_entries, 0);
}
