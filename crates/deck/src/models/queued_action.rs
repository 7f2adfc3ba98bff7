//! Actions waiting for confirmed delivery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Symbol;

/// A like/dislike that could not be delivered when it was made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    pub symbol: Symbol,
    pub liked: bool,
    /// Failed delivery attempts so far
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedAction {
    pub fn new(symbol: impl Into<Symbol>, liked: bool) -> Self {
        Self {
            symbol: symbol.into(),
            liked,
            attempts: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Record one more failed delivery
    pub fn failed(mut self) -> Self {
        self.attempts = self.attempts.saturating_add(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_action_has_no_attempts() {
        let action = QueuedAction::new("AAPL", true);
        assert_eq!(action.attempts, 0);
        assert!(action.liked);
    }

    #[test]
    fn test_failed_increments_attempts() {
        let action = QueuedAction::new("AAPL", false).failed().failed();
        assert_eq!(action.attempts, 2);
    }
}
