//! Offline action queue
//!
//! Holds likes/dislikes that could not be delivered when they were made (no
//! identity yet, no connectivity, or a transient remote failure) and delivers
//! them later, at least once, in the order they were made.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use super::connectivity::Connectivity;
use super::timing::BackoffPolicy;
use crate::error::RemoteError;
use crate::models::{IdentityToken, QueuedAction, Symbol};
use crate::remote::RemoteSession;
use crate::storage::{DurableStore, keys, load_json, save_json};

/// Statistics from one flush
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    /// Whether the flush ran at all (false when it was a no-op)
    pub ran: bool,
    /// Items confirmed by the remote and dropped
    pub delivered: usize,
    /// Items that failed and stay queued with one more attempt
    pub failed: usize,
    /// Items not attempted because processing stopped early
    pub deferred: usize,
    /// The remote refused delivery because today's quota is used up
    pub rate_limited: bool,
    /// Last remaining quota the remote reported
    pub remaining: Option<u32>,
}

impl FlushReport {
    fn skipped() -> Self {
        Self::default()
    }

    /// Remaining quota the remote confirmed during this flush
    ///
    /// A rate-limit refusal means none is left.
    pub fn confirmed_remaining(&self) -> Option<u32> {
        if self.rate_limited {
            Some(0)
        } else {
            self.remaining
        }
    }
}

/// Durable FIFO of undelivered actions
pub struct OfflineActionQueue {
    store: Arc<dyn DurableStore>,
    remote: Arc<dyn RemoteSession>,
    connectivity: Arc<dyn Connectivity>,
    backoff: BackoffPolicy,
    items: Mutex<Vec<QueuedAction>>,
    flushing: AtomicBool,
}

impl OfflineActionQueue {
    /// Create the queue, restoring whatever a previous run left behind
    pub fn new(
        store: Arc<dyn DurableStore>,
        remote: Arc<dyn RemoteSession>,
        connectivity: Arc<dyn Connectivity>,
        backoff: BackoffPolicy,
    ) -> Self {
        let items: Vec<QueuedAction> = load_json(store.as_ref(), keys::QUEUE).unwrap_or_default();
        if !items.is_empty() {
            info!("Restored {} queued actions", items.len());
        }

        Self {
            store,
            remote,
            connectivity,
            backoff,
            items: Mutex::new(items),
            flushing: AtomicBool::new(false),
        }
    }

    /// Append an action for later delivery
    ///
    /// Never fails: if the queue cannot be persisted the action is still held
    /// in memory for the rest of this process.
    pub fn enqueue(&self, symbol: &Symbol, liked: bool) {
        let mut items = self.lock_items();
        items.push(QueuedAction::new(symbol.clone(), liked));
        debug!("Queued {} (liked: {}), {} pending", symbol, liked, items.len());
        self.persist(&items);
    }

    /// Whether any action is waiting for delivery
    pub fn has_pending(&self) -> bool {
        !self.lock_items().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.lock_items().len()
    }

    /// Copy of the queued actions in delivery order
    pub fn pending(&self) -> Vec<QueuedAction> {
        self.lock_items().clone()
    }

    /// Whether a flush is currently running
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    /// Try to deliver every queued action, oldest first
    ///
    /// No-op when `identity` is unknown, the environment is offline, or
    /// another flush is already running. An item that has failed before waits
    /// for its backoff delay first. Failed items stay queued, in order, with
    /// their attempt count incremented. Processing stops early, leaving the
    /// rest untouched, when connectivity drops or the remote reports the
    /// quota exhausted. The resulting queue replaces the persisted one.
    pub async fn flush(&self, identity: Option<&IdentityToken>) -> FlushReport {
        let Some(identity) = identity else {
            return FlushReport::skipped();
        };
        if !self.connectivity.is_online() {
            debug!("Skipping flush while offline");
            return FlushReport::skipped();
        }
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            debug!("Flush already in progress");
            return FlushReport::skipped();
        };

        let batch = self.pending();
        let mut report = FlushReport {
            ran: true,
            ..FlushReport::default()
        };
        if batch.is_empty() {
            return report;
        }

        let batch_len = batch.len();
        let mut kept = Vec::with_capacity(batch_len);
        let mut batch = batch.into_iter();

        while let Some(item) = batch.next() {
            if !self.connectivity.is_online() {
                kept.push(item);
                break;
            }

            if item.attempts > 0 {
                tokio::time::sleep(self.backoff.delay(item.attempts)).await;
            }

            match self
                .remote
                .record_action(identity, &item.symbol, item.liked)
                .await
            {
                Ok(remaining) => {
                    report.delivered += 1;
                    report.remaining = remaining.or(report.remaining);
                }
                Err(RemoteError::RateLimited) => {
                    report.rate_limited = true;
                    report.failed += 1;
                    kept.push(item.failed());
                    break;
                }
                Err(e) => {
                    debug!("Delivery of {} failed: {}", item.symbol, e);
                    report.failed += 1;
                    kept.push(item.failed());
                }
            }
        }

        let untouched: Vec<QueuedAction> = batch.collect();
        report.deferred = untouched.len() + kept.len() - report.failed;
        kept.extend(untouched);

        // Anything enqueued while we were delivering sits after the batch
        let mut items = self.lock_items();
        let split = batch_len.min(items.len());
        let arrived: Vec<QueuedAction> = items.drain(split..).collect();
        *items = kept;
        items.extend(arrived);
        self.persist(&items);

        info!(
            "Flushed queue: {} delivered, {} failed, {} pending",
            report.delivered,
            report.failed,
            items.len()
        );
        report
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<QueuedAction>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, items: &[QueuedAction]) {
        if let Err(e) = save_json(self.store.as_ref(), keys::QUEUE, items) {
            warn!("Queue kept in memory only: {}", e);
        }
    }
}

/// Clears the in-progress flag when a flush ends, however it ends
struct FlushGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
