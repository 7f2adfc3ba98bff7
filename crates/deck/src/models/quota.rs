//! Daily action quota

use serde::{Deserialize, Serialize};

/// Last known quota for the day
///
/// The remote is authoritative. The core only adopts values the remote
/// reported and otherwise keeps its possibly stale cached copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub remaining: u32,
    pub daily_limit: u32,
}

impl QuotaState {
    /// Quota before the remote has reported anything
    pub fn with_limit(daily_limit: u32) -> Self {
        Self {
            remaining: daily_limit,
            daily_limit,
        }
    }

    /// Adopt a remaining count from a remote response; `None` keeps the cached value
    pub fn adopt(&mut self, remaining: Option<u32>) {
        if let Some(remaining) = remaining {
            self.remaining = remaining;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Quota as reported by the remote status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub can_swipe: bool,
    pub daily_limit: u32,
    pub remaining: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adopt_none_keeps_cached_value() {
        let mut quota = QuotaState::with_limit(20);
        quota.adopt(Some(7));
        quota.adopt(None);
        assert_eq!(quota.remaining, 7);
        assert_eq!(quota.daily_limit, 20);
    }

    #[test]
    fn test_exhausted() {
        let mut quota = QuotaState::with_limit(1);
        assert!(!quota.is_exhausted());
        quota.adopt(Some(0));
        assert!(quota.is_exhausted());
    }

    #[test]
    fn test_parse_status() {
        let status: QuotaStatus =
            serde_json::from_str(r#"{"canSwipe":true,"dailyLimit":20,"remaining":12}"#).unwrap();
        assert!(status.can_swipe);
        assert_eq!(status.remaining, 12);
    }
}
