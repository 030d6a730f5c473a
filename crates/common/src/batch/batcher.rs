//! Debounced request batching
//!
//! Calls sharing a batch key are collected until no new call has arrived
//! for the configured delay. The whole pending list is then detached and
//! every member's query runs concurrently; each caller receives the result
//! of its own query.
//!
//! By default a batch is all-or-nothing: when any member fails, that member
//! gets its own error and every other member gets
//! [`BatchError::MemberFailed`] naming the first failure. With
//! `isolate_failures` each member receives its own outcome.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::config::BatchConfig;
use super::error::BatchError;

/// A member waiting for its batch to run
trait PendingQuery: Send {
    fn run(self: Box<Self>) -> BoxFuture<'static, Box<dyn Settled>>;
}

/// A member whose query has finished but whose caller is not yet answered
trait Settled: Send {
    fn failure(&self) -> Option<String>;

    /// Answer the caller; `batch_failure` is the first failure in an
    /// all-or-nothing batch.
    fn settle(self: Box<Self>, batch_failure: Option<&BatchError>);
}

struct Member<T, E, F> {
    query: F,
    tx: oneshot::Sender<Result<T, E>>,
}

struct Finished<T, E> {
    outcome: Result<T, E>,
    tx: oneshot::Sender<Result<T, E>>,
}

impl<T, E, F, Fut> PendingQuery for Member<T, E, F>
where
    T: Send + 'static,
    E: From<BatchError> + Display + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn run(self: Box<Self>) -> BoxFuture<'static, Box<dyn Settled>> {
        let Member { query, tx } = *self;
        Box::pin(async move {
            let outcome = query().await;
            Box::new(Finished { outcome, tx }) as Box<dyn Settled>
        })
    }
}

impl<T, E> Settled for Finished<T, E>
where
    T: Send + 'static,
    E: From<BatchError> + Display + Send + 'static,
{
    fn failure(&self) -> Option<String> {
        self.outcome.as_ref().err().map(ToString::to_string)
    }

    fn settle(self: Box<Self>, batch_failure: Option<&BatchError>) {
        let Finished { outcome, tx } = *self;
        let answer = match (outcome, batch_failure) {
            (Ok(_), Some(failure)) => Err(E::from(failure.clone())),
            (outcome, _) => outcome,
        };
        // The caller may have stopped waiting.
        let _ = tx.send(answer);
    }
}

struct PendingBatch {
    members: Vec<Box<dyn PendingQuery>>,
    deadline: Instant,
}

struct Inner {
    config: BatchConfig,
    pending: Mutex<HashMap<String, PendingBatch>>,
    timers_started: AtomicU64,
}

/// Debounced batcher keyed by batch name.
///
/// Cloning is cheap and clones share pending batches.
#[derive(Clone)]
pub struct RequestBatcher {
    inner: Arc<Inner>,
}

impl Default for RequestBatcher {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

impl RequestBatcher {
    /// Create a batcher
    pub fn new(config: BatchConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pending: Mutex::new(HashMap::new()),
                timers_started: AtomicU64::new(0),
            }),
        }
    }

    /// Batcher configuration
    pub fn config(&self) -> BatchConfig {
        self.inner.config
    }

    /// Join the pending batch for `batch_key` and resolve with the outcome
    /// of `query` once the batch has run.
    ///
    /// Every call pushes the batch's start back by the configured delay.
    pub async fn batch_query<T, E, F, Fut>(&self, batch_key: &str, query: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<BatchError> + Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(batch_key, Box::new(Member { query, tx }));

        match rx.await {
            Ok(answer) => answer,
            Err(_) => Err(BatchError::Cancelled { batch_key: batch_key.to_string() }.into()),
        }
    }

    /// Members waiting in the pending batch for `batch_key`
    pub fn pending_count(&self, batch_key: &str) -> usize {
        self.inner.pending.lock().get(batch_key).map_or(0, |batch| batch.members.len())
    }

    /// Number of debounce timers ever scheduled
    pub fn timers_started(&self) -> u64 {
        self.inner.timers_started.load(Ordering::Relaxed)
    }

    fn enqueue(&self, batch_key: &str, member: Box<dyn PendingQuery>) {
        let deadline = Instant::now() + self.inner.config.delay;
        let mut pending = self.inner.pending.lock();
        match pending.entry(batch_key.to_string()) {
            Entry::Occupied(mut slot) => {
                let batch = slot.get_mut();
                batch.members.push(member);
                batch.deadline = deadline;
                debug!(batch_key = %batch_key, size = batch.members.len(), "Joined pending batch");
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingBatch { members: vec![member], deadline });
                self.inner.timers_started.fetch_add(1, Ordering::Relaxed);
                debug!(batch_key = %batch_key, "Scheduled new batch");
                tokio::spawn(run_when_quiet(Arc::clone(&self.inner), batch_key.to_string()));
            }
        }
    }
}

/// Sleep until the batch's deadline stops moving, then run it.
async fn run_when_quiet(inner: Arc<Inner>, batch_key: String) {
    let members = loop {
        let deadline = match inner.pending.lock().get(&batch_key) {
            Some(batch) => batch.deadline,
            None => return,
        };
        tokio::time::sleep_until(deadline).await;

        let mut pending = inner.pending.lock();
        let due = pending.get(&batch_key).is_some_and(|batch| batch.deadline <= Instant::now());
        if due {
            if let Some(batch) = pending.remove(&batch_key) {
                break batch.members;
            }
        }
    };

    let size = members.len();
    debug!(batch_key = %batch_key, size, "Running batch");
    let settled = join_all(members.into_iter().map(|member| member.run())).await;

    let first_failure = if inner.config.isolate_failures {
        None
    } else {
        settled.iter().find_map(|member| member.failure()).map(|message| {
            warn!(batch_key = %batch_key, size, error = %message, "Batch member failed; failing batch");
            BatchError::MemberFailed { batch_key: batch_key.clone(), message }
        })
    };

    for member in settled {
        member.settle(first_failure.as_ref());
    }
}
