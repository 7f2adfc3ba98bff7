//! Deck crate - Session core for the daily swipe deck
//!
//! This crate provides platform-independent session functionality including:
//! - Domain models (DeckItem, SessionSnapshot, QuotaState, QueuedAction)
//! - Durable key/value storage (SQLite and in-memory)
//! - Per-install identity
//! - Remote session abstraction and HTTP client
//! - Offline action queue with background delivery
//! - Session engine with an observable surface for UI consumption
//!
//! This crate has zero UI dependencies.

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use self::config::SwiperConfig;
pub use error::{RemoteError, RemoteResult, StoreError, StoreResult};
pub use identity::{IdentityProvider, IdentitySource};
pub use models::{
    DeckItem, IdentityToken, LoadOutcome, QueuedAction, QuotaState, QuotaStatus, SessionSnapshot,
    SessionStatus, Symbol, derive_status,
};
pub use remote::{DeckResponse, HttpRemoteSession, RemoteSession};
pub use session::{ActionOutcome, Observable, SessionEngine, SessionView, SubscriptionId};
pub use storage::{DurableStore, InMemoryStore, SqliteStore};
pub use sync::{
    // Offline delivery
    FlushReport, OfflineActionQueue,
    // Background loops
    BackgroundSchedule, BackgroundTasks, Connectivity, ConnectivityFlag,
    // Timing
    BackoffPolicy, format_countdown, until_next_reset,
};
