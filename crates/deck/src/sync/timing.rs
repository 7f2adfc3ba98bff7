//! Timing utilities for retry backoff and the daily reset countdown
//!
//! Pure functions that can be tested without a runtime.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, TimeZone};
use std::time::Duration;

/// Exponential backoff for queued deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Wait before the next attempt of an item that already failed `attempts` times
    ///
    /// `min(max, base * 2^attempts)`; zero for an item that has never failed.
    pub fn delay(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// Calendar day used to decide whether a snapshot is still current
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Time left until the next local midnight, for display only
pub fn until_next_reset(now: DateTime<Local>) -> Duration {
    let next_day = now.date_naive() + ChronoDuration::days(1);
    let midnight = next_day
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match midnight {
        Some(midnight) => (midnight - now).to_std().unwrap_or(Duration::ZERO),
        // Midnight skipped by a DST transition; fall back to a 24h day
        None => {
            let elapsed = now.time().signed_duration_since(chrono::NaiveTime::MIN);
            (ChronoDuration::days(1) - elapsed)
                .to_std()
                .unwrap_or(Duration::ZERO)
        }
    }
}

/// Format a countdown as `HH:MM:SS`
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
