//! Integration tests for the SQLite key-value store

use std::sync::Arc;
use std::time::Duration;

use mishkat_common::cache::{CacheConfig, CacheError, CacheOptions, TieredCache};
use mishkat_common::storage::{KeyValueStore, StorageError};
use mishkat_infra::SqliteKeyValueStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    {
        let store = SqliteKeyValueStore::open(&path, 2).unwrap();
        store.set("cache_hadith_bukhari_1", r#"{"data":1}"#).await.unwrap();
        store.set("cache_hadith_bukhari_2", r#"{"data":2}"#).await.unwrap();
        store.remove("cache_hadith_bukhari_2").await.unwrap();
    }

    let reopened = SqliteKeyValueStore::open(&path, 2).unwrap();
    assert_eq!(reopened.path(), Some(path.as_path()));
    assert_eq!(
        reopened.get("cache_hadith_bukhari_1").await.unwrap().as_deref(),
        Some(r#"{"data":1}"#)
    );
    assert_eq!(reopened.keys().await.unwrap(), vec!["cache_hadith_bukhari_1".to_string()]);
}

#[tokio::test]
async fn test_concurrent_writers_share_the_pool() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteKeyValueStore::open(dir.path().join("cache.db"), 4).unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.set(&format!("key_{i:02}"), "v").await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.keys().await.unwrap().len(), 16);
    let doomed: Vec<String> = (0..8).map(|i| format!("key_{i:02}")).collect();
    store.remove_many(&doomed).await.unwrap();
    assert_eq!(store.keys().await.unwrap().len(), 8);
}

/// Validates `TieredCache` over SQLite for the restart scenario.
///
/// Assertions:
/// - Ensures a value written by one cache instance is read by the next.
/// - Ensures the second instance never runs the origin.
#[tokio::test]
async fn test_cache_entries_outlive_the_process_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let options = CacheOptions::with_ttl(Duration::from_secs(60));

    {
        let store = Arc::new(SqliteKeyValueStore::open(&path, 2).unwrap());
        let cache = TieredCache::new(CacheConfig::default(), store);
        let value: Vec<u16> = cache
            .get_cached("surah_list", || async { Ok::<_, CacheError>(vec![1, 2, 3]) }, options)
            .await
            .unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        cache.flush_writes().await;
    }

    let store = Arc::new(SqliteKeyValueStore::open(&path, 2).unwrap());
    let cache = TieredCache::new(CacheConfig::default(), store);
    let value: Vec<u16> = cache
        .get_cached(
            "surah_list",
            || async {
                Err::<Vec<u16>, _>(CacheError::from(StorageError::Backend("origin must not run".into())))
            },
            options,
        )
        .await
        .unwrap();
    assert_eq!(value, vec![1, 2, 3]);
    assert_eq!(cache.stats().persistent_hits, 1);
}
