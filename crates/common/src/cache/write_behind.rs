//! Write-behind queue for the persistent tier.
//!
//! Cache fills never wait for the persistent store. Writes are pushed onto a
//! bounded channel and applied in order by a single background task, which
//! is spawned on first use so constructing a cache does not require a
//! running runtime. A full queue drops the write; every dropped or failed
//! write is logged and counted.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::stats::MetricsCollector;
use crate::storage::KeyValueStore;

#[derive(Debug)]
pub(crate) enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
    Flush(oneshot::Sender<()>),
}

pub(crate) struct WriteBehind {
    tx: mpsc::Sender<WriteOp>,
    pending: Mutex<Option<(mpsc::Receiver<WriteOp>, Arc<dyn KeyValueStore>)>>,
    metrics: Arc<MetricsCollector>,
}

impl WriteBehind {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        capacity: usize,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, pending: Mutex::new(Some((rx, store))), metrics }
    }

    fn ensure_started(&self) {
        let Some((rx, store)) = self.pending.lock().take() else {
            return;
        };
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(drain(rx, store, metrics));
    }

    /// Queue a write without waiting; a full queue drops it.
    pub(crate) fn enqueue_set(&self, key: String, value: String) {
        self.ensure_started();
        let reason = match self.tx.try_send(WriteOp::Set { key: key.clone(), value }) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(_)) => "queue full",
            Err(mpsc::error::TrySendError::Closed(_)) => "writer stopped",
        };
        warn!(key = %key, reason, "Dropping persistent cache write");
        self.metrics.record_write_failure();
    }

    /// Queue a removal of a stale entry without waiting; a full queue drops
    /// it and the entry is discarded again on a later read.
    pub(crate) fn discard(&self, key: String) {
        self.ensure_started();
        let reason = match self.tx.try_send(WriteOp::Remove { key: key.clone() }) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(_)) => "queue full",
            Err(mpsc::error::TrySendError::Closed(_)) => "writer stopped",
        };
        warn!(key = %key, reason, "Dropping persistent cache removal");
        self.metrics.record_write_failure();
    }

    /// Queue a removal, waiting for queue space so it is ordered after
    /// earlier writes of the same key.
    pub(crate) async fn enqueue_remove(&self, key: String) {
        self.ensure_started();
        if self.tx.send(WriteOp::Remove { key }).await.is_err() {
            warn!("Persistent cache writer stopped; removal skipped");
            self.metrics.record_write_failure();
        }
    }

    /// Wait until every operation queued before this call has been applied.
    pub(crate) async fn flush(&self) {
        self.ensure_started();
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

async fn drain(
    mut rx: mpsc::Receiver<WriteOp>,
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<MetricsCollector>,
) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Set { key, value } => {
                if let Err(e) = store.set(&key, &value).await {
                    warn!(key = %key, error = %e, "Persistent cache write failed");
                    metrics.record_write_failure();
                }
            }
            WriteOp::Remove { key } => {
                if let Err(e) = store.remove(&key).await {
                    warn!(key = %key, error = %e, "Persistent cache removal failed");
                    metrics.record_write_failure();
                }
            }
            WriteOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Persistent cache writer stopped");
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::write_behind.
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[tokio::test]
    async fn test_writes_apply_in_order_before_flush_returns() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let metrics = Arc::new(MetricsCollector::default());
        let writer = WriteBehind::new(store.clone(), 8, Arc::clone(&metrics));

        writer.enqueue_set("a".into(), "1".into());
        writer.enqueue_set("a".into(), "2".into());
        writer.enqueue_set("b".into(), "3".into());
        writer.enqueue_remove("b".into()).await;
        writer.flush().await;

        assert_eq!(store.peek("a").as_deref(), Some("2"));
        assert_eq!(store.peek("b"), None);
        assert_eq!(metrics.snapshot(0, 0).write_failures, 0);
    }

    /// Validates `WriteBehind::enqueue_set` for the full queue scenario.
    ///
    /// Assertions:
    /// - Ensures writes beyond the queue capacity are dropped and counted
    ///   while the drain task has not yet run.
    #[tokio::test(flavor = "current_thread")]
    async fn test_full_queue_drops_and_counts() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let metrics = Arc::new(MetricsCollector::default());
        let writer = WriteBehind::new(store.clone(), 1, Arc::clone(&metrics));

        // The drain task cannot run until this task yields.
        writer.enqueue_set("a".into(), "1".into());
        writer.enqueue_set("b".into(), "2".into());
        writer.flush().await;

        assert_eq!(store.peek("a").as_deref(), Some("1"));
        assert_eq!(store.peek("b"), None);
        assert_eq!(metrics.snapshot(0, 0).write_failures, 1);
    }
}
