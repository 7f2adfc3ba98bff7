//! Test doubles for the session core
//!
//! In-process stand-ins for the remote and the identity source, so the engine,
//! the offline queue and the background loops can be exercised without a
//! network.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use deck::testing::{FixedIdentity, ScriptedRemote, sample_deck};
//! use deck::remote::DeckResponse;
//! use deck::{ConnectivityFlag, InMemoryStore, SessionEngine, SessionStatus, SwiperConfig};
//!
//! # tokio_test::block_on(async {
//! let remote = Arc::new(ScriptedRemote::new());
//! remote.push_deck(Ok(DeckResponse {
//!     items: sample_deck(3, deck::sync::today()),
//!     remaining: Some(3),
//! }));
//!
//! let mut engine = SessionEngine::new(
//!     SwiperConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//!     remote.clone(),
//!     Arc::new(FixedIdentity::new("device-1")),
//!     Arc::new(ConnectivityFlag::default()),
//! );
//! engine.start().await;
//! assert_eq!(engine.status(), SessionStatus::Ready);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{RemoteError, RemoteResult};
use crate::identity::IdentitySource;
use crate::models::{DeckItem, IdentityToken, QuotaStatus, Symbol};
use crate::remote::{DeckResponse, RemoteSession};

/// One call to [`RemoteSession::record_action`] seen by [`ScriptedRemote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub identity: IdentityToken,
    pub symbol: Symbol,
    pub liked: bool,
    /// Whether the call succeeded
    pub delivered: bool,
}

/// Remote whose responses are scripted ahead of time
///
/// Responses are consumed in order. Once a script runs dry:
/// - `fetch_deck` and `check_status` fail with `Unavailable`
/// - `record_action` succeeds without reporting a quota
///
/// [`fail_each_symbol`](Self::fail_each_symbol) overrides the action script:
/// every symbol fails that many times before the script is consulted.
#[derive(Default)]
pub struct ScriptedRemote {
    decks: Mutex<VecDeque<RemoteResult<DeckResponse>>>,
    actions: Mutex<VecDeque<RemoteResult<Option<u32>>>>,
    statuses: Mutex<VecDeque<RemoteResult<QuotaStatus>>>,
    failures_per_symbol: AtomicU32,
    failures_seen: Mutex<HashMap<Symbol, u32>>,
    action_delay: Mutex<Duration>,
    recorded: Mutex<Vec<RecordedAction>>,
    fetches: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_deck(&self, response: RemoteResult<DeckResponse>) {
        lock(&self.decks).push_back(response);
    }

    pub fn push_action(&self, response: RemoteResult<Option<u32>>) {
        lock(&self.actions).push_back(response);
    }

    pub fn push_status(&self, response: RemoteResult<QuotaStatus>) {
        lock(&self.statuses).push_back(response);
    }

    /// Fail the first `n` deliveries of every symbol with `Unavailable`
    pub fn fail_each_symbol(&self, n: u32) {
        self.failures_per_symbol.store(n, Ordering::SeqCst);
    }

    /// Make every `record_action` call take `delay` before answering
    pub fn set_action_delay(&self, delay: Duration) {
        *lock(&self.action_delay) = delay;
    }

    /// Every `record_action` call so far, in call order
    pub fn recorded(&self) -> Vec<RecordedAction> {
        lock(&self.recorded).clone()
    }

    /// Symbols of the successful `record_action` calls, in call order
    pub fn delivered_symbols(&self) -> Vec<String> {
        lock(&self.recorded)
            .iter()
            .filter(|r| r.delivered)
            .map(|r| r.symbol.to_string())
            .collect()
    }

    /// Number of `fetch_deck` calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_action_response(&self, symbol: &Symbol) -> RemoteResult<Option<u32>> {
        let limit = self.failures_per_symbol.load(Ordering::SeqCst);
        if limit > 0 {
            let mut seen = lock(&self.failures_seen);
            let count = seen.entry(symbol.clone()).or_insert(0);
            if *count < limit {
                *count += 1;
                return Err(RemoteError::unavailable(format!(
                    "scripted failure {} of {} for {}",
                    count, limit, symbol
                )));
            }
        }

        lock(&self.actions).pop_front().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl RemoteSession for ScriptedRemote {
    async fn fetch_deck(&self, _identity: &IdentityToken) -> RemoteResult<DeckResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        lock(&self.decks)
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::unavailable("no scripted deck")))
    }

    async fn record_action(
        &self,
        identity: &IdentityToken,
        symbol: &Symbol,
        liked: bool,
    ) -> RemoteResult<Option<u32>> {
        let delay = *lock(&self.action_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.next_action_response(symbol);
        lock(&self.recorded).push(RecordedAction {
            identity: identity.clone(),
            symbol: symbol.clone(),
            liked,
            delivered: response.is_ok(),
        });
        response
    }

    async fn check_status(&self, _identity: &IdentityToken) -> RemoteResult<QuotaStatus> {
        lock(&self.statuses)
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::unavailable("no scripted status")))
    }
}

/// Identity source that always knows the identity
pub struct FixedIdentity(IdentityToken);

impl FixedIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(IdentityToken::new(token))
    }
}

impl IdentitySource for FixedIdentity {
    fn resolve(&self) -> Option<IdentityToken> {
        Some(self.0.clone())
    }
}

/// Identity source that is unresolved for the first `misses` lookups
pub struct DelayedIdentity {
    token: IdentityToken,
    misses_left: AtomicU32,
}

impl DelayedIdentity {
    pub fn new(token: impl Into<String>, misses: u32) -> Self {
        Self {
            token: IdentityToken::new(token),
            misses_left: AtomicU32::new(misses),
        }
    }
}

impl IdentitySource for DelayedIdentity {
    fn resolve(&self) -> Option<IdentityToken> {
        let missed = self
            .misses_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if missed { None } else { Some(self.token.clone()) }
    }
}

/// Deck of `n` items with symbols `S0`, `S1`, ...
pub fn sample_deck(n: usize, deck_date: NaiveDate) -> Vec<DeckItem> {
    (0..n)
        .map(|i| {
            DeckItem::new(format!("S{}", i), format!("Sample {}", i), "Utilities", deck_date)
                .with_price(10.0 + i as f64)
                .with_dividend_yield(2.5)
        })
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
