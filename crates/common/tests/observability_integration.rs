//! Integration tests for the performance monitor.

#![cfg(feature = "runtime")]

use std::time::Duration;

use mishkat_common::observability::{MonitorConfig, PerformanceMonitor};
use mishkat_common::time::MockClock;
use serde_json::{json, Value};

/// Validates percentile statistics for the 100 uniform samples scenario.
///
/// Assertions:
/// - Ensures nearest-rank percentiles land on the expected samples.
/// - Ensures mean, min and max cover the whole range.
#[test]
fn test_percentiles_over_hundred_samples() {
    let monitor = PerformanceMonitor::new();
    // Recorded out of order; statistics sort internally.
    for ms in (1..=100).rev() {
        monitor.record_metric("load_verses", f64::from(ms), None);
    }

    let stats = monitor.get_stats("load_verses").unwrap();
    assert_eq!(stats.count, 100);
    assert_eq!(stats.p50, 50.0);
    assert_eq!(stats.p90, 90.0);
    assert_eq!(stats.p95, 95.0);
    assert_eq!(stats.p99, 99.0);
    assert_eq!((stats.min, stats.max), (1.0, 100.0));
    assert!((stats.mean - 50.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_measured_operations_feed_export() {
    let clock = MockClock::starting_at(Duration::from_secs(1_700_000_000));
    let monitor = PerformanceMonitor::with_clock(MonitorConfig::default(), clock.clone());

    for surah in [1, 2] {
        let clock = clock.clone();
        monitor
            .measure("fetch_surah", Some(json!({ "surah": surah })), || async move {
                clock.advance_millis(100 * surah);
                Ok::<_, String>(())
            })
            .await
            .unwrap();
    }

    let exported: Value = serde_json::from_str(&monitor.export_metrics(None).unwrap()).unwrap();
    let stats = &exported["stats"][0];
    assert_eq!(stats["name"], json!("fetch_surah"));
    assert_eq!(stats["count"], json!(2));
    assert_eq!(stats["max"], json!(200.0));
    assert_eq!(exported["metrics"]["fetch_surah"][1]["metadata"], json!({ "surah": 2 }));

    let slowest = monitor.get_slowest_operations(1);
    assert_eq!(slowest[0].duration_ms, 200.0);
}

#[test]
fn test_bounded_history_and_toggling() {
    let monitor =
        PerformanceMonitor::with_config(MonitorConfig { enabled: true, max_metrics_per_name: 10 });
    for ms in 0..25 {
        monitor.record_metric("op", f64::from(ms), None);
    }
    assert_eq!(monitor.get_memory_usage().total_metrics, 10);

    monitor.set_enabled(false);
    monitor.record_metric("other", 1.0, None);
    assert!(monitor.get_stats("other").is_none());

    monitor.set_enabled(true);
    monitor.clear(None);
    assert!(monitor.get_all_stats().is_empty());
}
