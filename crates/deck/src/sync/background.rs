//! Recurring background tasks
//!
//! Two loops run for the lifetime of a session:
//! - the flush loop, which hands the offline queue to the remote shortly after
//!   start, then on every flush interval and whenever connectivity returns,
//!   and writes the quota the remote confirms into the shared quota observable
//! - the countdown loop, which refreshes the time left until the daily reset
//!
//! Neither loop looks at the session status; queued actions are delivered
//! even after the deck is completed or the limit is reached. Both loops stop
//! on [`BackgroundTasks::shutdown`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, info, warn};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};

use super::queue::OfflineActionQueue;
use super::timing::until_next_reset;
use crate::identity::IdentitySource;
use crate::models::QuotaState;
use crate::session::Observable;

/// How long shutdown waits for a loop to finish its current step
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Timing of the background loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundSchedule {
    pub initial_flush_delay: Duration,
    pub flush_interval: Duration,
    pub countdown_tick: Duration,
}

/// Handles to the running background loops
pub struct BackgroundTasks {
    shutdown_tx: watch::Sender<bool>,
    online: Arc<Notify>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Start both loops on the current tokio runtime
    pub fn spawn(
        queue: Arc<OfflineActionQueue>,
        identity: Arc<dyn IdentitySource>,
        quota: Observable<QuotaState>,
        countdown: Observable<Duration>,
        schedule: BackgroundSchedule,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let online = Arc::new(Notify::new());

        let flush = tokio::spawn(flush_loop(
            queue,
            identity,
            quota,
            online.clone(),
            schedule,
            shutdown_rx.clone(),
        ));
        let countdown = tokio::spawn(countdown_loop(countdown, schedule.countdown_tick, shutdown_rx));

        info!(
            "Background tasks started (flush every {:?}, first in {:?})",
            schedule.flush_interval, schedule.initial_flush_delay
        );

        Self {
            shutdown_tx,
            online,
            handles: vec![flush, countdown],
        }
    }

    /// Connectivity came back; flush now instead of waiting for the next tick
    pub fn notify_online(&self) {
        self.online.notify_one();
    }

    /// Whether any loop is still running
    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Stop both loops
    ///
    /// A flush in progress is allowed to finish; a loop that does not stop
    /// within the grace period is aborted.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for mut handle in self.handles {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Background task ended abnormally: {}", e),
                Err(_) => {
                    warn!("Background task did not stop in time, aborting");
                    handle.abort();
                }
            }
        }
        info!("Background tasks stopped");
    }
}

async fn flush_loop(
    queue: Arc<OfflineActionQueue>,
    identity: Arc<dyn IdentitySource>,
    quota: Observable<QuotaState>,
    online: Arc<Notify>,
    schedule: BackgroundSchedule,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(
        Instant::now() + schedule.initial_flush_delay,
        schedule.flush_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = online.notified() => debug!("Connectivity restored, flushing queue"),
            _ = shutdown_rx.changed() => break,
        }

        if !queue.has_pending() {
            continue;
        }
        let report = queue.flush(identity.resolve().as_ref()).await;
        if let Some(remaining) = report.confirmed_remaining() {
            if quota.update(|state| state.remaining = remaining) {
                debug!("Quota updated from delivered actions: {} remaining", remaining);
            }
        }
    }

    debug!("Flush loop stopped");
}

async fn countdown_loop(
    countdown: Observable<Duration>,
    tick: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => countdown.set(until_next_reset(Local::now())),
            _ = shutdown_rx.changed() => break,
        }
    }

    debug!("Countdown loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Symbol;
    use crate::storage::InMemoryStore;
    use crate::sync::{BackoffPolicy, ConnectivityFlag};
    use crate::testing::{DelayedIdentity, FixedIdentity, ScriptedRemote};

    fn schedule() -> BackgroundSchedule {
        BackgroundSchedule {
            initial_flush_delay: Duration::from_secs(2),
            flush_interval: Duration::from_secs(5),
            countdown_tick: Duration::from_secs(1),
        }
    }

    fn quota() -> Observable<QuotaState> {
        Observable::new(QuotaState::with_limit(20))
    }

    fn queue_with(remote: Arc<ScriptedRemote>) -> Arc<OfflineActionQueue> {
        Arc::new(OfflineActionQueue::new(
            Arc::new(InMemoryStore::new()),
            remote,
            Arc::new(ConnectivityFlag::default()),
            BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(15)),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_flush_after_initial_delay() {
        let remote = Arc::new(ScriptedRemote::new());
        let queue = queue_with(remote.clone());
        queue.enqueue(&Symbol::new("AAPL"), true);

        let tasks = BackgroundTasks::spawn(
            queue.clone(),
            Arc::new(FixedIdentity::new("device-1")),
            quota(),
            Observable::new(Duration::ZERO),
            schedule(),
        );

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(queue.has_pending());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(!queue.has_pending());
        assert_eq!(remote.delivered_symbols(), vec!["AAPL"]);

        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_waits_for_identity() {
        let remote = Arc::new(ScriptedRemote::new());
        let queue = queue_with(remote.clone());
        queue.enqueue(&Symbol::new("KO"), false);

        // Unknown for the first two ticks (2s, 7s), known on the third (12s)
        let tasks = BackgroundTasks::spawn(
            queue.clone(),
            Arc::new(DelayedIdentity::new("device-1", 2)),
            quota(),
            Observable::new(Duration::ZERO),
            schedule(),
        );

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(queue.has_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!queue.has_pending());

        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_online_flushes_immediately() {
        let remote = Arc::new(ScriptedRemote::new());
        let queue = queue_with(remote.clone());

        let tasks = BackgroundTasks::spawn(
            queue.clone(),
            Arc::new(FixedIdentity::new("device-1")),
            quota(),
            Observable::new(Duration::ZERO),
            BackgroundSchedule {
                initial_flush_delay: Duration::from_secs(60),
                flush_interval: Duration::from_secs(60),
                ..schedule()
            },
        );

        queue.enqueue(&Symbol::new("MSFT"), true);
        tasks.notify_online();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!queue.has_pending());
        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_publishes_confirmed_quota() {
        let remote = Arc::new(ScriptedRemote::new());
        let queue = queue_with(remote.clone());
        queue.enqueue(&Symbol::new("AAPL"), true);
        queue.enqueue(&Symbol::new("MSFT"), false);
        remote.push_action(Ok(Some(9)));
        remote.push_action(Ok(Some(8)));

        let shared = quota();
        let tasks = BackgroundTasks::spawn(
            queue.clone(),
            Arc::new(FixedIdentity::new("device-1")),
            shared.clone(),
            Observable::new(Duration::ZERO),
            schedule(),
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!queue.has_pending());
        assert_eq!(shared.get(), QuotaState { remaining: 8, daily_limit: 20 });

        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_flush_exhausts_quota() {
        let remote = Arc::new(ScriptedRemote::new());
        let queue = queue_with(remote.clone());
        queue.enqueue(&Symbol::new("AAPL"), true);
        remote.push_action(Err(crate::error::RemoteError::RateLimited));

        let shared = quota();
        let tasks = BackgroundTasks::spawn(
            queue.clone(),
            Arc::new(FixedIdentity::new("device-1")),
            shared.clone(),
            Observable::new(Duration::ZERO),
            schedule(),
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(shared.get().remaining, 0);
        assert_eq!(queue.pending_count(), 1);

        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_is_published() {
        let countdown = Observable::new(Duration::ZERO);
        let tasks = BackgroundTasks::spawn(
            queue_with(Arc::new(ScriptedRemote::new())),
            Arc::new(FixedIdentity::new("device-1")),
            quota(),
            countdown.clone(),
            schedule(),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        let value = countdown.get();
        assert!(value > Duration::ZERO);
        assert!(value <= Duration::from_secs(25 * 3600));

        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loops() {
        let tasks = BackgroundTasks::spawn(
            queue_with(Arc::new(ScriptedRemote::new())),
            Arc::new(FixedIdentity::new("device-1")),
            quota(),
            Observable::new(Duration::ZERO),
            schedule(),
        );
        assert!(tasks.is_running());
        tasks.shutdown().await;
    }
}
