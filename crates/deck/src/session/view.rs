//! Presentation-facing view of a session

use std::time::Duration;

use super::observable::Observable;
use crate::models::{DeckItem, IdentityToken, QuotaState, SessionStatus, Symbol};

/// Read-only observables a presentation layer subscribes to
///
/// Cloning the view shares the underlying observables. Only the engine and
/// its background tasks write to them.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub status: Observable<SessionStatus>,
    /// Item at the cursor while a deck is loaded
    pub current_item: Observable<Option<DeckItem>>,
    pub cursor: Observable<usize>,
    pub quota: Observable<QuotaState>,
    /// Liked symbols in the order they were liked
    pub liked: Observable<Vec<Symbol>>,
    /// Time left until the daily reset
    pub countdown: Observable<Duration>,
    /// User-facing message while the session is in `error`
    pub error_message: Observable<Option<String>>,
    pub identity: Observable<Option<IdentityToken>>,
}

impl SessionView {
    pub(crate) fn new(quota: QuotaState) -> Self {
        Self {
            status: Observable::new(SessionStatus::Loading),
            current_item: Observable::new(None),
            cursor: Observable::new(0),
            quota: Observable::new(quota),
            liked: Observable::new(Vec::new()),
            countdown: Observable::new(Duration::ZERO),
            error_message: Observable::new(None),
            identity: Observable::new(None),
        }
    }
}
