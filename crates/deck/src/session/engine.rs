//! Session engine: the daily deck state machine
//!
//! Owns the session snapshot. Every mutation goes through the engine's own
//! methods, which take `&mut self`, so they run one at a time from a single
//! owner. The presentation layer reads state through the observables in
//! [`SessionView`].
//!
//! The quota lives in `view.quota` alone: the background flush loop writes
//! remote-confirmed counts into the same observable.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info, warn};

use super::view::SessionView;
use crate::config::SwiperConfig;
use crate::error::RemoteError;
use crate::identity::IdentitySource;
use crate::models::{
    IdentityToken, LoadOutcome, QuotaState, SessionSnapshot, SessionStatus, derive_status,
};
use crate::remote::RemoteSession;
use crate::storage::{DurableStore, keys, load_json, save_json};
use crate::sync::{
    BackgroundSchedule, BackgroundTasks, Connectivity, OfflineActionQueue, today,
};

/// Message shown when the deck could not be loaded and nothing is cached
pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load the deck. Check your connection and try again.";

/// What happened to a submitted action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Nothing to act on (no current item, or the session is not ready)
    Ignored,
    /// The remote confirmed the action
    Delivered,
    /// The action was queued for later delivery
    Queued,
    /// The remote refused the action; the cursor did not move
    LimitReached,
}

/// The central state machine of a daily session
pub struct SessionEngine {
    config: SwiperConfig,
    store: Arc<dyn DurableStore>,
    remote: Arc<dyn RemoteSession>,
    identity: Arc<dyn IdentitySource>,
    connectivity: Arc<dyn Connectivity>,
    queue: Arc<OfflineActionQueue>,
    snapshot: SessionSnapshot,
    outcome: LoadOutcome,
    clock: fn() -> NaiveDate,
    view: SessionView,
}

impl SessionEngine {
    /// Wire an engine from its collaborators
    ///
    /// The offline queue is created here, restoring anything a previous run
    /// left behind.
    pub fn new(
        config: SwiperConfig,
        store: Arc<dyn DurableStore>,
        remote: Arc<dyn RemoteSession>,
        identity: Arc<dyn IdentitySource>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let queue = Arc::new(OfflineActionQueue::new(
            store.clone(),
            remote.clone(),
            connectivity.clone(),
            config.backoff(),
        ));
        let view = SessionView::new(QuotaState::with_limit(config.default_daily_limit));

        Self {
            config,
            store,
            remote,
            identity,
            connectivity,
            queue,
            snapshot: SessionSnapshot::empty(today()),
            outcome: LoadOutcome::Pending,
            clock: today,
            view,
        }
    }

    /// Replace the source of "today" (used to simulate day changes)
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Observable state for the presentation layer
    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn status(&self) -> SessionStatus {
        self.view.status.get()
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn quota(&self) -> QuotaState {
        self.view.quota.get()
    }

    pub fn queue(&self) -> &Arc<OfflineActionQueue> {
        &self.queue
    }

    /// Start the session
    ///
    /// Resumes today's snapshot when one is cached, otherwise fetches. With
    /// nothing cached the fetch waits for the identity for as long as it
    /// takes, staying `loading` meanwhile.
    pub async fn start(&mut self) {
        if let Some(identity) = self.identity.resolve() {
            self.view.identity.set_if_changed(Some(identity));
        }

        if let Some(snapshot) = self.cached_snapshot() {
            info!(
                "Resuming today's deck at {}/{}",
                snapshot.cursor,
                snapshot.deck.len()
            );
            self.snapshot = snapshot;
            self.outcome = LoadOutcome::Loaded;
            self.publish();
            return;
        }

        let identity = self.wait_for_identity().await;
        self.load_deck(identity).await;
    }

    /// Load today's deck from the remote
    ///
    /// Without `force`, a usable deck already in memory is kept. When the
    /// identity cannot be resolved the fetch is abandoned and the status is
    /// left as it was; the caller retries later.
    pub async fn fetch_deck(&mut self, force: bool) {
        if !force && self.outcome == LoadOutcome::Loaded && self.snapshot.is_usable_on(self.today()) {
            debug!("Deck already loaded for today");
            return;
        }

        let Some(identity) = self.resolve_identity_with_retry().await else {
            warn!("Identity not available, deck fetch deferred");
            return;
        };

        self.load_deck(identity).await;
    }

    async fn load_deck(&mut self, identity: IdentityToken) {
        self.outcome = LoadOutcome::Pending;
        self.publish();

        match self.remote.fetch_deck(&identity).await {
            Ok(response) if response.remaining == Some(0) => {
                info!("Deck fetched but no actions remain today");
                self.enter_limit_reached();
            }
            Ok(response) => {
                info!(
                    "Fetched deck with {} items (remaining {:?})",
                    response.items.len(),
                    response.remaining
                );
                self.snapshot = SessionSnapshot::new(self.today(), response.items);
                self.view.quota.update(|quota| quota.adopt(response.remaining));
                self.outcome = LoadOutcome::Loaded;
                self.view.error_message.set_if_changed(None);
                self.persist_snapshot();
                self.publish();
            }
            Err(RemoteError::RateLimited) => {
                info!("Deck fetch refused: daily limit reached");
                self.enter_limit_reached();
            }
            Err(e) => {
                if let Some(snapshot) = self.fallback_snapshot() {
                    warn!("Deck fetch failed, using today's cached deck: {}", e);
                    self.snapshot = snapshot;
                    self.outcome = LoadOutcome::Loaded;
                    self.view.error_message.set_if_changed(None);
                } else {
                    error!("Deck fetch failed with nothing cached: {}", e);
                    self.outcome = LoadOutcome::Failed;
                    self.view
                        .error_message
                        .set_if_changed(Some(LOAD_FAILED_MESSAGE.to_string()));
                }
                self.publish();
            }
        }
    }

    /// Record a like or dislike for the current item and move on
    ///
    /// The action goes straight to the remote when the identity is known and
    /// the environment is online; otherwise, or on a transient failure, it is
    /// queued and the cursor still advances. A rate-limit response stops the
    /// session without advancing.
    pub async fn submit_action(&mut self, liked: bool) -> ActionOutcome {
        if self.status() != SessionStatus::Ready {
            return ActionOutcome::Ignored;
        }
        let Some(item) = self.snapshot.current_item() else {
            return ActionOutcome::Ignored;
        };
        let symbol = item.symbol.clone();

        let identity = self.identity.resolve();
        if let Some(identity) = &identity {
            self.view.identity.set_if_changed(Some(identity.clone()));
        }

        let outcome = match identity {
            Some(identity) if self.connectivity.is_online() => {
                match self.remote.record_action(&identity, &symbol, liked).await {
                    Ok(remaining) => {
                        self.view.quota.update(|quota| quota.adopt(remaining));
                        ActionOutcome::Delivered
                    }
                    Err(RemoteError::RateLimited) => {
                        info!("Action on {} refused: daily limit reached", symbol);
                        self.enter_limit_reached();
                        self.persist_snapshot();
                        return ActionOutcome::LimitReached;
                    }
                    Err(e) => {
                        debug!("Action on {} not delivered, queueing: {}", symbol, e);
                        self.queue.enqueue(&symbol, liked);
                        ActionOutcome::Queued
                    }
                }
            }
            _ => {
                self.queue.enqueue(&symbol, liked);
                ActionOutcome::Queued
            }
        };

        if liked {
            self.snapshot.record_like(&symbol);
        }
        self.snapshot.advance();
        self.publish();
        self.persist_snapshot();

        outcome
    }

    pub async fn like(&mut self) -> ActionOutcome {
        self.submit_action(true).await
    }

    pub async fn dislike(&mut self) -> ActionOutcome {
        self.submit_action(false).await
    }

    /// Explicit reload: the only way out of `error`, `limitReached` and `completed`
    ///
    /// The status only changes once the identity is known; an unresolved
    /// identity leaves the session as it was.
    pub async fn request_reload(&mut self) {
        self.fetch_deck(true).await;
    }

    /// Ask the remote for the current quota and adopt it
    ///
    /// Never touches the deck or cursor. Failures are logged and ignored.
    pub async fn refresh_quota(&mut self) {
        let Some(identity) = self.identity.resolve() else {
            return;
        };

        match self.remote.check_status(&identity).await {
            Ok(status) => {
                debug!(
                    "Quota status: {}/{} (can swipe: {})",
                    status.remaining, status.daily_limit, status.can_swipe
                );
                self.view.quota.set_if_changed(QuotaState {
                    remaining: status.remaining,
                    daily_limit: status.daily_limit,
                });
                self.publish();
            }
            Err(e) => warn!("Failed to refresh quota: {}", e),
        }
    }

    /// Start the flush and countdown loops for this session
    pub fn spawn_background(&self) -> BackgroundTasks {
        BackgroundTasks::spawn(
            self.queue.clone(),
            self.identity.clone(),
            self.view.quota.clone(),
            self.view.countdown.clone(),
            BackgroundSchedule {
                initial_flush_delay: self.config.initial_flush_delay(),
                flush_interval: self.config.flush_interval(),
                countdown_tick: self.config.countdown_tick(),
            },
        )
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    async fn wait_for_identity(&self) -> IdentityToken {
        let mut attempts = 0u32;
        loop {
            if let Some(identity) = self.identity.resolve() {
                self.view.identity.set_if_changed(Some(identity.clone()));
                return identity;
            }
            attempts = attempts.saturating_add(1);
            if attempts == self.config.identity_retry_attempts.max(1) {
                warn!("Identity still unavailable after {} attempts, deck fetch deferred", attempts);
            }
            tokio::time::sleep(self.config.identity_retry_delay()).await;
        }
    }

    async fn resolve_identity_with_retry(&self) -> Option<IdentityToken> {
        let attempts = self.config.identity_retry_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(identity) = self.identity.resolve() {
                self.view.identity.set_if_changed(Some(identity.clone()));
                return Some(identity);
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.identity_retry_delay()).await;
            }
        }
        None
    }

    /// Today's snapshot from durable storage, if there is a usable one
    fn cached_snapshot(&self) -> Option<SessionSnapshot> {
        let snapshot: SessionSnapshot = load_json(self.store.as_ref(), keys::SNAPSHOT)?;
        let snapshot = snapshot.sanitized();
        if snapshot.is_usable_on(self.today()) {
            Some(snapshot)
        } else {
            debug!("Ignoring snapshot from {}", snapshot.issue_date);
            None
        }
    }

    /// Last good same-day deck: the one in memory, else the stored one
    fn fallback_snapshot(&self) -> Option<SessionSnapshot> {
        if self.snapshot.is_usable_on(self.today()) {
            return Some(self.snapshot.clone());
        }
        self.cached_snapshot()
    }

    fn enter_limit_reached(&mut self) {
        self.view.quota.update(|quota| quota.remaining = 0);
        self.outcome = LoadOutcome::RateLimited;
        self.publish();
    }

    fn persist_snapshot(&self) {
        if let Err(e) = save_json(self.store.as_ref(), keys::SNAPSHOT, &self.snapshot) {
            warn!("Snapshot kept in memory only: {}", e);
        }
    }

    /// Push the current state to every observable
    fn publish(&self) {
        let status = derive_status(
            self.outcome,
            self.snapshot.deck.len(),
            self.snapshot.cursor,
            self.view.quota.with(|quota| quota.remaining),
        );
        let current_item = match self.outcome {
            LoadOutcome::Loaded | LoadOutcome::RateLimited => self.snapshot.current_item().cloned(),
            LoadOutcome::Pending | LoadOutcome::Failed => None,
        };

        self.view.cursor.set_if_changed(self.snapshot.cursor);
        self.view.current_item.set_if_changed(current_item);
        self.view.liked.set_if_changed(self.snapshot.liked.clone());
        if self.view.status.set_if_changed(status) {
            debug!("Session status: {}", status);
        }
    }
}
