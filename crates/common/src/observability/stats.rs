//! Performance metric records and derived statistics

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    /// Operation label
    pub name: String,
    /// Elapsed time in milliseconds
    pub duration_ms: f64,
    /// Wall-clock completion time, milliseconds since the UNIX epoch
    pub timestamp: u64,
    /// Caller-supplied context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Distribution of recorded durations for one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Operation label
    pub name: String,
    /// Retained samples
    pub count: usize,
    /// Sum of durations (ms)
    pub sum: f64,
    /// Mean duration (ms)
    pub mean: f64,
    /// Fastest sample (ms)
    pub min: f64,
    /// Slowest sample (ms)
    pub max: f64,
    /// 50th percentile (ms)
    pub p50: f64,
    /// 90th percentile (ms)
    pub p90: f64,
    /// 95th percentile (ms)
    pub p95: f64,
    /// 99th percentile (ms)
    pub p99: f64,
}

impl PerformanceStats {
    /// Compute statistics over `durations`; `None` when empty.
    pub fn from_durations(name: impl Into<String>, durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();
        Some(Self {
            name: name.into(),
            count,
            sum,
            mean: sum / count as f64,
            min: sorted[0],
            max: sorted[count - 1],
            p50: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Nearest-rank percentile: index `ceil(p / 100 * count) - 1` of the sorted
/// samples.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// Estimated footprint of a monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Distinct labels with retained samples
    pub metric_names: usize,
    /// Retained samples across all labels
    pub total_metrics: usize,
    /// Timers started but not ended
    pub active_timers: usize,
    /// Approximate bytes held by samples and timers
    pub estimated_bytes: usize,
}
