//! Session status shown to the presentation layer

use serde::{Deserialize, Serialize};

/// What the presentation layer should display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Loading,
    Ready,
    LimitReached,
    Completed,
    Error,
}

impl SessionStatus {
    /// Terminal for the current day unless the user explicitly reloads
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::LimitReached | SessionStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Ready => "ready",
            SessionStatus::LimitReached => "limitReached",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the most recent load or action that affects status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fetch is outstanding
    Pending,
    /// A deck is loaded (from the remote or a same-day snapshot)
    Loaded,
    /// The remote refused further progress for today
    RateLimited,
    /// The fetch failed and no same-day snapshot was available
    Failed,
}

/// Derive the status from the session's state
///
/// `remaining` is the last known quota. An exhausted quota only completes the
/// session once at least one item has been acted on, so a freshly loaded deck
/// is shown even while the cached quota is stale.
pub fn derive_status(
    outcome: LoadOutcome,
    deck_len: usize,
    cursor: usize,
    remaining: u32,
) -> SessionStatus {
    match outcome {
        LoadOutcome::Pending => SessionStatus::Loading,
        LoadOutcome::Failed => SessionStatus::Error,
        LoadOutcome::RateLimited => SessionStatus::LimitReached,
        LoadOutcome::Loaded => {
            if cursor >= deck_len || (cursor > 0 && remaining == 0) {
                SessionStatus::Completed
            } else {
                SessionStatus::Ready
            }
        }
    }
}
