//! Session snapshot: the durable record of a day's progress

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DeckItem, Symbol};

/// Progress through one day's deck
///
/// Created on a successful fetch, mutated on every action, replaced wholesale
/// by the next fetch. A snapshot whose `issue_date` is not today is stale and
/// must be ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Day the deck was fetched for
    pub issue_date: NaiveDate,
    /// Ordered deck
    pub deck: Vec<DeckItem>,
    /// Index of the next unseen item (0..=deck.len())
    pub cursor: usize,
    /// Liked symbols in the order they were liked, without duplicates
    #[serde(default)]
    pub liked: Vec<Symbol>,
}

impl SessionSnapshot {
    /// Fresh snapshot for a newly fetched deck
    pub fn new(issue_date: NaiveDate, deck: Vec<DeckItem>) -> Self {
        Self {
            issue_date,
            deck,
            cursor: 0,
            liked: Vec::new(),
        }
    }

    /// Empty snapshot used before anything has been loaded
    pub fn empty(issue_date: NaiveDate) -> Self {
        Self::new(issue_date, Vec::new())
    }

    /// The item at the cursor, if any
    pub fn current_item(&self) -> Option<&DeckItem> {
        self.deck.get(self.cursor)
    }

    /// Whether every item has been seen
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.deck.len()
    }

    /// Whether this snapshot can be resumed on `today`
    pub fn is_usable_on(&self, today: NaiveDate) -> bool {
        self.issue_date == today && !self.deck.is_empty()
    }

    /// Record a like; re-liking a symbol is a no-op
    pub fn record_like(&mut self, symbol: &Symbol) {
        if !self.liked.contains(symbol) {
            self.liked.push(symbol.clone());
        }
    }

    /// Move past the current item. Never moves beyond the end of the deck.
    pub fn advance(&mut self) {
        if self.cursor < self.deck.len() {
            self.cursor += 1;
        }
    }

    /// Repair a snapshot read from storage so its invariants hold
    pub(crate) fn sanitized(mut self) -> Self {
        self.cursor = self.cursor.min(self.deck.len());
        let mut seen = Vec::with_capacity(self.liked.len());
        for symbol in self.liked.drain(..) {
            if !seen.contains(&symbol) {
                seen.push(symbol);
            }
        }
        self.liked = seen;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn deck(n: usize) -> Vec<DeckItem> {
        (0..n)
            .map(|i| DeckItem::new(format!("S{}", i), format!("Stock {}", i), "Tech", day()))
            .collect()
    }

    #[test]
    fn test_new_snapshot_starts_at_zero() {
        let snapshot = SessionSnapshot::new(day(), deck(3));
        assert_eq!(snapshot.cursor, 0);
        assert!(snapshot.liked.is_empty());
        assert_eq!(snapshot.current_item().unwrap().symbol.as_str(), "S0");
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut snapshot = SessionSnapshot::new(day(), deck(2));
        snapshot.advance();
        snapshot.advance();
        snapshot.advance();
        assert_eq!(snapshot.cursor, 2);
        assert!(snapshot.is_exhausted());
        assert!(snapshot.current_item().is_none());
    }

    #[test]
    fn test_record_like_is_idempotent() {
        let mut snapshot = SessionSnapshot::new(day(), deck(2));
        let symbol = Symbol::new("S0");
        snapshot.record_like(&symbol);
        snapshot.record_like(&symbol);
        assert_eq!(snapshot.liked, vec![symbol]);
    }

    #[test]
    fn test_usable_only_on_same_day_with_items() {
        let snapshot = SessionSnapshot::new(day(), deck(1));
        assert!(snapshot.is_usable_on(day()));
        assert!(!snapshot.is_usable_on(day().succ_opt().unwrap()));
        assert!(!SessionSnapshot::empty(day()).is_usable_on(day()));
    }

    #[test]
    fn test_sanitized_clamps_cursor_and_dedupes() {
        let mut snapshot = SessionSnapshot::new(day(), deck(2));
        snapshot.cursor = 9;
        snapshot.liked = vec![Symbol::new("S0"), Symbol::new("S0"), Symbol::new("S1")];

        let repaired = snapshot.sanitized();
        assert_eq!(repaired.cursor, 2);
        assert_eq!(repaired.liked, vec![Symbol::new("S0"), Symbol::new("S1")]);
    }
}
