//! Named operation timing with bounded per-name history
//!
//! [`PerformanceMonitor`] keeps the most recent samples of each label in a
//! [`RingBuffer`] and derives distribution statistics on demand. Disabling
//! the monitor turns every recording call into a no-op without touching
//! call sites.

use std::collections::HashMap;
use std::future::Future;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::stats::{MemoryUsage, PerformanceMetric, PerformanceStats};
use crate::collections::RingBuffer;
use crate::error::{CommonError, CommonResult};
use crate::time::{Clock, SystemClock};

/// Monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Whether recording starts enabled
    pub enabled: bool,
    /// Samples retained per label
    pub max_metrics_per_name: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { enabled: true, max_metrics_per_name: 1000 }
    }
}

impl MonitorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.max_metrics_per_name == 0 {
            return Err(CommonError::config_field(
                "max_metrics_per_name",
                "max_metrics_per_name must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Handle of a running timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A timer that has been started and not yet ended
#[derive(Debug, Clone)]
pub struct ActiveTimer {
    /// Operation label
    pub label: String,
    /// Start instant
    pub started_at: Instant,
    /// Context recorded with the metric
    pub metadata: Option<Value>,
}

#[derive(Serialize)]
struct MetricsExport<'a> {
    exported_at: String,
    stats: Vec<PerformanceStats>,
    metrics: HashMap<&'a str, Vec<PerformanceMetric>>,
}

/// Records timed operations and computes per-label statistics.
///
/// # Examples
///
/// ```
/// use mishkat_common::observability::PerformanceMonitor;
///
/// let monitor = PerformanceMonitor::new();
/// monitor.record_metric("db_query", 12.0, None);
/// monitor.record_metric("db_query", 30.0, None);
///
/// let stats = monitor.get_stats("db_query").unwrap();
/// assert_eq!(stats.count, 2);
/// assert_eq!(stats.max, 30.0);
/// ```
pub struct PerformanceMonitor<C: Clock = SystemClock> {
    config: MonitorConfig,
    enabled: AtomicBool,
    metrics: RwLock<HashMap<String, RingBuffer<PerformanceMetric>>>,
    timers: Mutex<HashMap<TimerId, ActiveTimer>>,
    next_timer: AtomicU64,
    clock: C,
}

impl PerformanceMonitor<SystemClock> {
    /// Create an enabled monitor with default capacity
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Create a monitor with explicit configuration
    pub fn with_config(config: MonitorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for PerformanceMonitor<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PerformanceMonitor<C> {
    /// Create a monitor with a custom clock
    pub fn with_clock(config: MonitorConfig, clock: C) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            config,
            metrics: RwLock::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            next_timer: AtomicU64::new(1),
            clock,
        }
    }

    /// Turn recording on or off
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "Performance monitoring toggled");
    }

    /// Whether recording is on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Start timing `label`. While disabled the returned id is inert.
    pub fn start_timer(&self, label: &str, metadata: Option<Value>) -> TimerId {
        let id = TimerId(self.next_timer.fetch_add(1, Ordering::Relaxed));
        if self.is_enabled() {
            let timer = ActiveTimer { label: label.to_string(), started_at: self.clock.now(), metadata };
            self.timers.lock().insert(id, timer);
        }
        id
    }

    /// Stop a timer and record its metric; returns the elapsed milliseconds.
    ///
    /// Returns `None` for unknown or already-ended ids.
    pub fn end_timer(&self, id: TimerId) -> Option<f64> {
        let timer = self.timers.lock().remove(&id)?;
        let elapsed = self.clock.now().saturating_duration_since(timer.started_at);
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        self.record_metric(&timer.label, duration_ms, timer.metadata);
        Some(duration_ms)
    }

    /// Time `operation` under `label`.
    ///
    /// The timer ends on every exit path, including when the returned
    /// future is dropped before completion. The operation's output,
    /// success or error, is returned unchanged.
    pub async fn measure<T, F, Fut>(&self, label: &str, metadata: Option<Value>, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _timer = TimerGuard { monitor: self, id: self.start_timer(label, metadata) };
        operation().await
    }

    /// Append a sample directly
    pub fn record_metric(&self, name: &str, duration_ms: f64, metadata: Option<Value>) {
        if !self.is_enabled() {
            return;
        }
        let metric = PerformanceMetric {
            name: name.to_string(),
            duration_ms,
            timestamp: self.clock.millis_since_epoch(),
            metadata,
        };
        let mut metrics = self.metrics.write();
        metrics
            .entry(name.to_string())
            .or_insert_with(|| RingBuffer::new(self.config.max_metrics_per_name))
            .push(metric);
    }

    /// Statistics for `name`; `None` when nothing is retained
    pub fn get_stats(&self, name: &str) -> Option<PerformanceStats> {
        let metrics = self.metrics.read();
        let buffer = metrics.get(name)?;
        let durations: Vec<f64> = buffer.iter().map(|m| m.duration_ms).collect();
        PerformanceStats::from_durations(name, &durations)
    }

    /// Statistics for every label, sorted by label
    pub fn get_all_stats(&self) -> Vec<PerformanceStats> {
        let mut names: Vec<String> = self.metrics.read().keys().cloned().collect();
        names.sort();
        names.iter().filter_map(|name| self.get_stats(name)).collect()
    }

    /// The `limit` slowest samples across all labels, slowest first
    pub fn get_slowest_operations(&self, limit: usize) -> Vec<PerformanceMetric> {
        let metrics = self.metrics.read();
        let mut all: Vec<PerformanceMetric> =
            metrics.values().flat_map(|buffer| buffer.iter().cloned()).collect();
        all.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));
        all.truncate(limit);
        all
    }

    /// Estimated footprint of retained samples and running timers
    pub fn get_memory_usage(&self) -> MemoryUsage {
        let metrics = self.metrics.read();
        let active_timers = self.timers.lock().len();

        let total_metrics = metrics.values().map(RingBuffer::len).sum();
        let sample_bytes: usize = metrics
            .values()
            .flat_map(|buffer| buffer.iter())
            .map(|m| mem::size_of::<PerformanceMetric>() + m.name.len())
            .sum();

        MemoryUsage {
            metric_names: metrics.len(),
            total_metrics,
            active_timers,
            estimated_bytes: sample_bytes + active_timers * mem::size_of::<ActiveTimer>(),
        }
    }

    /// Log statistics for one label or for all of them at `info` level
    pub fn log_stats(&self, name: Option<&str>) {
        let stats = match name {
            Some(name) => self.get_stats(name).into_iter().collect(),
            None => self.get_all_stats(),
        };
        for s in stats {
            info!(
                name = %s.name,
                count = s.count,
                mean_ms = s.mean,
                min_ms = s.min,
                max_ms = s.max,
                p50_ms = s.p50,
                p90_ms = s.p90,
                p95_ms = s.p95,
                p99_ms = s.p99,
                "Performance stats"
            );
        }
    }

    /// Export statistics and raw samples as pretty JSON.
    pub fn export_metrics(&self, name: Option<&str>) -> CommonResult<String> {
        let stats = match name {
            Some(name) => self.get_stats(name).into_iter().collect(),
            None => self.get_all_stats(),
        };

        let metrics = self.metrics.read();
        let samples = metrics
            .iter()
            .filter(|(label, _)| name.map_or(true, |wanted| wanted == label.as_str()))
            .map(|(label, buffer)| (label.as_str(), buffer.iter().cloned().collect()))
            .collect();

        let export = MetricsExport {
            exported_at: DateTime::<Utc>::from(self.clock.system_time()).to_rfc3339(),
            stats,
            metrics: samples,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Drop retained samples for one label or for all of them
    pub fn clear(&self, name: Option<&str>) {
        let mut metrics = self.metrics.write();
        match name {
            Some(name) => {
                metrics.remove(name);
            }
            None => {
                metrics.clear();
                self.timers.lock().clear();
            }
        }
    }

    /// Timers started but not ended
    pub fn active_timers(&self) -> usize {
        self.timers.lock().len()
    }
}

struct TimerGuard<'a, C: Clock> {
    monitor: &'a PerformanceMonitor<C>,
    id: TimerId,
}

impl<C: Clock> Drop for TimerGuard<'_, C> {
    fn drop(&mut self) {
        self.monitor.end_timer(self.id);
    }
}
