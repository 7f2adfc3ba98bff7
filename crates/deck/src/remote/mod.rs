//! Remote session integration
//!
//! This module provides:
//! - The [`RemoteSession`] abstraction over the operations the core needs
//! - An HTTP implementation against the deck API
//! - Wire types for the API's JSON bodies

mod http;

pub use http::HttpRemoteSession;

use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::models::{DeckItem, IdentityToken, QuotaStatus, Symbol};

/// Deck fetched from the remote
#[derive(Debug, Clone, PartialEq)]
pub struct DeckResponse {
    /// Ordered items of today's deck
    pub items: Vec<DeckItem>,
    /// Remaining quota; `None` means unknown, keep the cached value
    pub remaining: Option<u32>,
}

/// The remote operations the session core depends on
///
/// The remote owns the quota. `record_action` may be called more than once
/// for the same user action (queue retries); the client never counts a
/// retry as a new gesture.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Fetch today's deck for `identity`
    async fn fetch_deck(&self, identity: &IdentityToken) -> RemoteResult<DeckResponse>;

    /// Record a like/dislike; returns the remaining quota if reported
    async fn record_action(
        &self,
        identity: &IdentityToken,
        symbol: &Symbol,
        liked: bool,
    ) -> RemoteResult<Option<u32>>;

    /// Ask for the current quota without acting
    async fn check_status(&self, identity: &IdentityToken) -> RemoteResult<QuotaStatus>;
}
