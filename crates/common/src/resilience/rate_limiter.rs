//! Per-endpoint sliding-window rate limiting with a priority queue
//!
//! Each registered endpoint allows at most `max_requests` call starts within
//! any trailing `window`. A call over quota waits in the endpoint's queue,
//! ordered by priority (higher first) and then by arrival (older first).
//! One drain task per endpoint admits queued calls as slots free up; it
//! sleeps exactly until the oldest recorded start leaves the window.
//!
//! Endpoints that were never registered are not throttled: the call runs
//! immediately and a warning is logged.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{ErrorClassification, ErrorSeverity};
use crate::time::{Clock, SystemClock};

/// Rate limiter errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateLimitError {
    /// The endpoint's queue already holds `limit` waiting calls
    #[error("Rate limit queue full for endpoint '{endpoint}' (limit {limit})")]
    QueueFull {
        /// Endpoint name
        endpoint: String,
        /// Configured queue limit
        limit: usize,
    },

    /// The call was waiting when the endpoint was reset
    #[error("Rate limit queue cleared for endpoint '{endpoint}'")]
    QueueCleared {
        /// Endpoint name
        endpoint: String,
    },

    /// Rejected endpoint configuration
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),
}

impl ErrorClassification for RateLimitError {
    fn is_retryable(&self) -> bool {
        // Capacity errors are terminal; retrying would only re-queue.
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::QueueFull { .. } | Self::QueueCleared { .. } => ErrorSeverity::Warning,
            Self::InvalidConfig(_) => ErrorSeverity::Error,
        }
    }
}

/// Quota of one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum call starts within any trailing window
    pub max_requests: usize,
    /// Window length
    pub window: Duration,
    /// Maximum waiting calls; `None` is unbounded
    pub queue_limit: Option<usize>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: 10, window: Duration::from_secs(1), queue_limit: None }
    }
}

impl RateLimitConfig {
    /// Shorthand for an unbounded-queue quota
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self { max_requests, window, queue_limit: None }
    }

    /// Create a new configuration builder
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.max_requests == 0 {
            return Err(RateLimitError::InvalidConfig(
                "max_requests must be greater than 0".to_string(),
            ));
        }
        if self.window.is_zero() {
            return Err(RateLimitError::InvalidConfig(
                "window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`RateLimitConfig`]
#[derive(Debug, Default)]
pub struct RateLimitConfigBuilder {
    config: RateLimitConfig,
}

impl RateLimitConfigBuilder {
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn queue_limit(mut self, limit: usize) -> Self {
        self.config.queue_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<RateLimitConfig, RateLimitError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

type Permit = oneshot::Sender<Result<(), RateLimitError>>;

/// A call waiting for a slot
struct QueuedRequest {
    priority: i32,
    seq: u64,
    enqueued_at: Instant,
    permit: Permit,
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedRequest {}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedRequest {
    // Max-heap: higher priority first, then lower sequence (older) first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

struct EndpointState {
    config: RateLimitConfig,
    starts: VecDeque<Instant>,
    queue: BinaryHeap<QueuedRequest>,
    next_seq: u64,
    draining: bool,
}

impl EndpointState {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            starts: VecDeque::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            draining: false,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.starts.front() {
            if now.saturating_duration_since(*oldest) >= self.config.window {
                self.starts.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_capacity(&self) -> bool {
        self.starts.len() < self.config.max_requests
    }

    fn clear_queue(&mut self, endpoint: &str) -> usize {
        let cleared = self.queue.len();
        for request in self.queue.drain() {
            let _ = request
                .permit
                .send(Err(RateLimitError::QueueCleared { endpoint: endpoint.to_string() }));
        }
        cleared
    }
}

enum Admission {
    Now,
    Queued(oneshot::Receiver<Result<(), RateLimitError>>),
    Rejected(RateLimitError),
}

struct Inner<C: Clock> {
    endpoints: Mutex<HashMap<String, EndpointState>>,
    clock: C,
}

/// Sliding-window rate limiter keyed by endpoint name.
///
/// Cloning is cheap and clones share state.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use mishkat_common::resilience::{RateLimitConfig, RateLimitError, RateLimiter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), RateLimitError> {
/// let limiter = RateLimiter::new();
/// limiter.register_endpoint("quran_api", RateLimitConfig::new(30, Duration::from_secs(60)))?;
///
/// let verses = limiter.throttle("quran_api", || async { Ok::<_, RateLimitError>(7) }).await?;
/// assert_eq!(verses, 7);
/// assert_eq!(limiter.remaining_requests("quran_api"), Some(29));
/// # Ok(())
/// # }
/// ```
pub struct RateLimiter<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for RateLimiter<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl RateLimiter<SystemClock> {
    /// Create a limiter using the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter with a custom clock.
    ///
    /// The drain task waits with `tokio::time::sleep`, so the clock must
    /// track tokio's time for queued calls to be admitted on schedule.
    pub fn with_clock(clock: C) -> Self {
        Self { inner: Arc::new(Inner { endpoints: Mutex::new(HashMap::new()), clock }) }
    }

    /// Declare the quota of `endpoint`.
    ///
    /// A quota is immutable once registered; registering the same name again
    /// is ignored with a warning.
    pub fn register_endpoint(
        &self,
        endpoint: impl Into<String>,
        config: RateLimitConfig,
    ) -> Result<(), RateLimitError> {
        config.validate()?;
        let endpoint = endpoint.into();
        let mut endpoints = self.inner.endpoints.lock();
        if endpoints.contains_key(&endpoint) {
            warn!(endpoint = %endpoint, "Endpoint already registered; keeping existing quota");
            return Ok(());
        }
        debug!(
            endpoint = %endpoint,
            max_requests = config.max_requests,
            window_ms = config.window.as_millis() as u64,
            queue_limit = ?config.queue_limit,
            "Registered rate-limited endpoint"
        );
        endpoints.insert(endpoint, EndpointState::new(config));
        Ok(())
    }

    /// Whether `endpoint` has a quota
    pub fn is_registered(&self, endpoint: &str) -> bool {
        self.inner.endpoints.lock().contains_key(endpoint)
    }

    /// Registered endpoint names, sorted
    pub fn endpoints(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.endpoints.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run `f` under the quota of `endpoint` with priority 0.
    pub async fn throttle<T, E, F, Fut>(&self, endpoint: &str, f: F) -> Result<T, E>
    where
        E: From<RateLimitError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.throttle_with_priority(endpoint, 0, f).await
    }

    /// Run `f` under the quota of `endpoint`.
    ///
    /// Runs immediately when the window has room, otherwise waits in the
    /// queue. Fails with [`RateLimitError::QueueFull`] without waiting when
    /// the queue is at its limit, and with [`RateLimitError::QueueCleared`]
    /// when the endpoint is reset while waiting. Errors from `f` are
    /// returned unchanged.
    pub async fn throttle_with_priority<T, E, F, Fut>(
        &self,
        endpoint: &str,
        priority: i32,
        f: F,
    ) -> Result<T, E>
    where
        E: From<RateLimitError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.admit(endpoint, priority) {
            Admission::Now => {}
            Admission::Rejected(err) => return Err(err.into()),
            Admission::Queued(permit) => match permit.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => {
                    return Err(RateLimitError::QueueCleared { endpoint: endpoint.to_string() }
                        .into())
                }
            },
        }
        f().await
    }

    /// Slots left in the current window; `None` for unregistered endpoints
    pub fn remaining_requests(&self, endpoint: &str) -> Option<usize> {
        let now = self.inner.clock.now();
        let mut endpoints = self.inner.endpoints.lock();
        let state = endpoints.get_mut(endpoint)?;
        state.prune(now);
        Some(state.config.max_requests.saturating_sub(state.starts.len()))
    }

    /// Number of calls waiting for `endpoint`
    pub fn queue_length(&self, endpoint: &str) -> usize {
        self.inner.endpoints.lock().get(endpoint).map_or(0, |state| state.queue.len())
    }

    /// Forget recorded starts and fail every waiting call, for one endpoint
    /// or for all of them.
    pub fn reset(&self, endpoint: Option<&str>) {
        let mut endpoints = self.inner.endpoints.lock();
        for (name, state) in endpoints.iter_mut() {
            if endpoint.is_some_and(|wanted| wanted != name) {
                continue;
            }
            state.starts.clear();
            let cleared = state.clear_queue(name);
            debug!(endpoint = %name, cleared, "Rate limiter reset");
        }
    }

    fn admit(&self, endpoint: &str, priority: i32) -> Admission {
        let now = self.inner.clock.now();
        let mut endpoints = self.inner.endpoints.lock();
        let Some(state) = endpoints.get_mut(endpoint) else {
            warn!(endpoint = %endpoint, "Endpoint not registered; running without rate limit");
            return Admission::Now;
        };

        state.prune(now);
        if state.queue.is_empty() && state.has_capacity() {
            state.starts.push_back(now);
            debug!(endpoint = %endpoint, in_window = state.starts.len(), "Request admitted");
            return Admission::Now;
        }

        if let Some(limit) = state.config.queue_limit {
            if state.queue.len() >= limit {
                warn!(endpoint = %endpoint, limit, "Rate limit queue full; rejecting request");
                return Admission::Rejected(RateLimitError::QueueFull {
                    endpoint: endpoint.to_string(),
                    limit,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(QueuedRequest { priority, seq, enqueued_at: now, permit: tx });
        debug!(endpoint = %endpoint, priority, queued = state.queue.len(), "Request queued");

        if !state.draining {
            state.draining = true;
            tokio::spawn(drain(Arc::clone(&self.inner), endpoint.to_string()));
        }
        Admission::Queued(rx)
    }
}

/// Admit queued calls for `endpoint` until its queue is empty.
async fn drain<C: Clock>(inner: Arc<Inner<C>>, endpoint: String) {
    loop {
        let wait = {
            let now = inner.clock.now();
            let mut endpoints = inner.endpoints.lock();
            let Some(state) = endpoints.get_mut(&endpoint) else {
                return;
            };
            state.prune(now);

            while state.has_capacity() {
                let Some(request) = state.queue.pop() else {
                    break;
                };
                if request.permit.is_closed() {
                    continue;
                }
                state.starts.push_back(now);
                let waited = now.saturating_duration_since(request.enqueued_at);
                if request.permit.send(Ok(())).is_err() {
                    // Caller went away between the check and the send.
                    state.starts.pop_back();
                    continue;
                }
                debug!(
                    endpoint = %endpoint,
                    priority = request.priority,
                    waited_ms = waited.as_millis() as u64,
                    "Queued request admitted"
                );
            }

            if state.queue.is_empty() {
                state.draining = false;
                return;
            }

            state
                .starts
                .front()
                .map(|oldest| (*oldest + state.config.window).saturating_duration_since(now))
                .unwrap_or(state.config.window)
        };
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::rate_limiter.
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use super::*;

    fn limiter(max: usize, window_ms: u64, queue_limit: Option<usize>) -> RateLimiter {
        let limiter = RateLimiter::new();
        let config = RateLimitConfig {
            max_requests: max,
            window: Duration::from_millis(window_ms),
            queue_limit,
        };
        limiter.register_endpoint("api", config).unwrap();
        limiter
    }

    #[test]
    fn test_config_validation() {
        assert!(RateLimitConfig::builder().max_requests(0).build().is_err());
        assert!(RateLimitConfig::builder().window(Duration::ZERO).build().is_err());

        let config = RateLimitConfig::builder()
            .max_requests(5)
            .window(Duration::from_secs(2))
            .queue_limit(3)
            .build()
            .unwrap();
        assert_eq!(config.queue_limit, Some(3));
    }

    #[test]
    fn test_queue_order_prefers_priority_then_age() {
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let (tx3, _rx3) = oneshot::channel();
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(QueuedRequest { priority: 1, seq: 0, enqueued_at: now, permit: tx1 });
        heap.push(QueuedRequest { priority: 5, seq: 1, enqueued_at: now, permit: tx2 });
        heap.push(QueuedRequest { priority: 1, seq: 2, enqueued_at: now, permit: tx3 });

        let order: Vec<(i32, u64)> =
            std::iter::from_fn(|| heap.pop().map(|r| (r.priority, r.seq))).collect();
        assert_eq!(order, vec![(5, 1), (1, 0), (1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_is_immutable() {
        let limiter = limiter(2, 1000, None);
        limiter.register_endpoint("api", RateLimitConfig::new(50, Duration::from_secs(1))).unwrap();

        assert_eq!(limiter.remaining_requests("api"), Some(2));
        assert_eq!(limiter.endpoints(), vec!["api".to_string()]);
        assert!(limiter.is_registered("api"));
        assert_eq!(limiter.remaining_requests("other"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_endpoint_runs_immediately() {
        let limiter = RateLimiter::new();
        let value = limiter.throttle("nowhere", || async { Ok::<_, RateLimitError>(1) }).await;
        assert_eq!(value, Ok(1));
        assert_eq!(limiter.queue_length("nowhere"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_origin_error_propagates_unchanged() {
        #[derive(Debug, PartialEq)]
        enum ApiError {
            Down,
            Limited(RateLimitError),
        }
        impl From<RateLimitError> for ApiError {
            fn from(err: RateLimitError) -> Self {
                Self::Limited(err)
            }
        }

        let limiter = limiter(1, 1000, None);
        let result: Result<(), ApiError> =
            limiter.throttle("api", || async { Err(ApiError::Down) }).await;
        assert_eq!(result, Err(ApiError::Down));
        assert_eq!(limiter.remaining_requests("api"), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = limiter(2, 1000, None);
        for _ in 0..2 {
            limiter.throttle("api", || async { Ok::<_, RateLimitError>(()) }).await.unwrap();
        }
        assert_eq!(limiter.remaining_requests("api"), Some(0));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(limiter.remaining_requests("api"), Some(0));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(limiter.remaining_requests("api"), Some(2));
    }

    /// Validates `RateLimiter::reset` for the waiting callers scenario.
    ///
    /// Assertions:
    /// - Ensures every queued call fails with `QueueCleared`.
    /// - Confirms the window is empty afterwards.
    #[tokio::test(start_paused = true)]
    async fn test_reset_fails_waiting_calls() {
        let limiter = limiter(1, 60_000, None);
        limiter.throttle("api", || async { Ok::<_, RateLimitError>(()) }).await.unwrap();

        let waiting = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.throttle("api", || async { Ok::<_, RateLimitError>(()) }).await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(limiter.queue_length("api"), 1);

        limiter.reset(Some("api"));

        let result = waiting.await.unwrap();
        assert_eq!(result, Err(RateLimitError::QueueCleared { endpoint: "api".into() }));
        assert_eq!(limiter.remaining_requests("api"), Some(1));
        assert_eq!(limiter.queue_length("api"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_gives_slot_to_next() {
        let limiter = limiter(1, 1000, None);
        let runs = Arc::new(AtomicUsize::new(0));
        limiter.throttle("api", || async { Ok::<_, RateLimitError>(()) }).await.unwrap();

        let abandoned = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.throttle("api", || async { Ok::<_, RateLimitError>(()) }).await
            })
        };
        let kept = {
            let limiter = limiter.clone();
            let runs = Arc::clone(&runs);
            tokio::spawn(async move {
                limiter
                    .throttle("api", || async move {
                        runs.fetch_add(1, AtomicOrdering::SeqCst);
                        Ok::<_, RateLimitError>(tokio::time::Instant::now())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        abandoned.abort();

        let started = tokio::time::Instant::now();
        let ran_at = kept.await.unwrap().unwrap();
        assert_eq!(runs.load(AtomicOrdering::SeqCst), 1);
        assert!(ran_at.duration_since(started) <= Duration::from_millis(1000));
        // One slot used by the kept call; the abandoned one recorded nothing.
        assert_eq!(limiter.remaining_requests("api"), Some(0));
    }
}
