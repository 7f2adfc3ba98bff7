//! Domain models for the daily deck session

mod deck_item;
mod queued_action;
mod quota;
mod snapshot;
mod status;

pub use deck_item::{DeckItem, Symbol};
pub use queued_action::QueuedAction;
pub use quota::{QuotaState, QuotaStatus};
pub use snapshot::SessionSnapshot;
pub use status::{LoadOutcome, SessionStatus, derive_status};

use serde::{Deserialize, Serialize};

/// Opaque per-install identity sent with every remote call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(pub String);

impl IdentityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
