//! Observability primitives - operation timing and statistics
//!
//! - Timed samples and distribution statistics (stats)
//! - A bounded, per-label performance monitor (monitor)
//!
//! Structured logging itself goes through `tracing`; the subscriber is
//! installed by the binary, never by this crate.

pub mod monitor;
pub mod stats;

pub use monitor::{ActiveTimer, MonitorConfig, PerformanceMonitor, TimerId};
pub use stats::{percentile, MemoryUsage, PerformanceMetric, PerformanceStats};
