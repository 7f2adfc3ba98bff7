//! Deck item model: one card in the daily deck

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ticker symbol; unique key of an item within a deck
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single item of the daily deck
///
/// Produced only by the remote; the session core never mutates it. Field names
/// follow the remote's camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckItem {
    /// Ticker symbol (unique within a deck)
    pub symbol: Symbol,
    /// Display name (e.g., "Apple Inc.")
    pub name: String,
    /// Category the item belongs to
    pub sector: String,
    /// Dividend yield in percent
    #[serde(default)]
    pub dividend_yield: f64,
    /// Last known price
    #[serde(default)]
    pub price: f64,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Day this deck was issued for
    pub deck_date: NaiveDate,
}

impl DeckItem {
    /// Create an item with empty numeric attributes and description
    pub fn new(
        symbol: impl Into<Symbol>,
        name: impl Into<String>,
        sector: impl Into<String>,
        deck_date: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
            dividend_yield: 0.0,
            price: 0.0,
            description: String::new(),
            deck_date,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_item() {
        let json = r#"{
            "symbol": "KO",
            "name": "Coca-Cola",
            "sector": "Consumer Staples",
            "dividendYield": 3.1,
            "price": 61.25,
            "description": "Beverages",
            "deckDate": "2026-10-19"
        }"#;

        let item: DeckItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.symbol.as_str(), "KO");
        assert_eq!(item.sector, "Consumer Staples");
        assert_eq!(item.dividend_yield, 3.1);
        assert_eq!(item.deck_date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{"symbol":"T","name":"AT&T","sector":"Telecom","deckDate":"2026-10-19"}"#;
        let item: DeckItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price, 0.0);
        assert!(item.description.is_empty());
    }

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let json = serde_json::to_string(&Symbol::new("MSFT")).unwrap();
        assert_eq!(json, "\"MSFT\"");
    }
}
