//! Time abstraction shared by every timing-sensitive primitive.
//!
//! Rate limiting windows, cache TTLs and performance timers all read time
//! through [`Clock`] so production code uses the real clock while tests
//! control it.
//!
//! [`SystemClock`] reads tokio's clock. Under `#[tokio::test(start_paused =
//! true)]` tokio's clock is virtual and auto-advances whenever every task is
//! idle, so the rate limiter's `sleep` calls and the timestamps it records
//! stay consistent with each other. [`MockClock`] is fully manual and suits
//! synchronous tests (TTL arithmetic, metric durations).

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Trait for time operations to enable deterministic testing
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis =
            self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}

/// Production clock backed by tokio's time source.
///
/// Outside a paused tokio runtime this is equivalent to [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed counter, so a test can keep one handle and
/// give another to the component under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    epoch_offset: Duration,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock whose wall time starts at the UNIX epoch.
    pub fn new() -> Self {
        Self::starting_at(Duration::ZERO)
    }

    /// Create a mock clock whose wall time starts `since_epoch` after the
    /// UNIX epoch.
    pub fn starting_at(since_epoch: Duration) -> Self {
        Self {
            start: Instant::now(),
            epoch_offset: since_epoch,
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Advance the mock clock by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Total time advanced so far
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + self.epoch_offset + self.elapsed()
    }
}
