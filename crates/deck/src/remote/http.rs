//! Deck API HTTP client
//!
//! The request methods use synchronous HTTP (ureq) to stay executor-agnostic.
//! The [`RemoteSession`] implementation runs them on tokio's blocking pool so
//! the engine's executor is never blocked while a request is in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{DeckResponse, RemoteSession};
use crate::error::{RemoteError, RemoteResult};
use crate::models::{DeckItem, IdentityToken, QuotaStatus, Symbol};

/// Header carrying the identity token
const IDENTITY_HEADER: &str = "X-Device-Id";

/// Header carrying the remaining daily quota
const REMAINING_HEADER: &str = "X-RateLimit-Remaining";

/// Status code the API uses once the daily quota is used up
const TOO_MANY_REQUESTS: u16 = 429;

/// HTTP implementation of [`RemoteSession`]
#[derive(Clone)]
pub struct HttpRemoteSession {
    inner: Arc<Inner>,
}

struct Inner {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpRemoteSession {
    /// Create a client for the API rooted at `base_url` (e.g. `https://host/api/stocks`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            inner: Arc::new(Inner {
                agent: ureq::Agent::new_with_config(config),
                base_url,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Fetch today's deck (blocking)
    pub fn fetch_deck_blocking(&self, identity: &IdentityToken) -> RemoteResult<DeckResponse> {
        let url = format!("{}/deck", self.inner.base_url);

        let mut response = self
            .inner
            .agent
            .get(&url)
            .header(IDENTITY_HEADER, identity.as_str())
            .call()
            .map_err(map_error)?;

        let remaining = remaining_from_headers(response.headers());
        let items: Vec<DeckItem> = response
            .body_mut()
            .read_json()
            .map_err(|e| RemoteError::unavailable(format!("Failed to parse deck response: {}", e)))?;

        debug!("Fetched {} deck items (remaining {:?})", items.len(), remaining);
        Ok(DeckResponse { items, remaining })
    }

    /// Record a like/dislike (blocking)
    pub fn record_action_blocking(
        &self,
        identity: &IdentityToken,
        symbol: &Symbol,
        liked: bool,
    ) -> RemoteResult<Option<u32>> {
        let url = swipe_url(&self.inner.base_url, symbol, liked);

        let response = self
            .inner
            .agent
            .post(&url)
            .header(IDENTITY_HEADER, identity.as_str())
            .send_empty()
            .map_err(map_error)?;

        Ok(remaining_from_headers(response.headers()))
    }

    /// Read the current quota (blocking)
    pub fn check_status_blocking(&self, identity: &IdentityToken) -> RemoteResult<QuotaStatus> {
        let url = format!("{}/swipe-status", self.inner.base_url);

        let mut response = self
            .inner
            .agent
            .get(&url)
            .header(IDENTITY_HEADER, identity.as_str())
            .call()
            .map_err(map_error)?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| RemoteError::unavailable(format!("Failed to parse status response: {}", e)))
    }
}

#[async_trait]
impl RemoteSession for HttpRemoteSession {
    async fn fetch_deck(&self, identity: &IdentityToken) -> RemoteResult<DeckResponse> {
        let client = self.clone();
        let identity = identity.clone();
        run_blocking(move || client.fetch_deck_blocking(&identity)).await
    }

    async fn record_action(
        &self,
        identity: &IdentityToken,
        symbol: &Symbol,
        liked: bool,
    ) -> RemoteResult<Option<u32>> {
        let client = self.clone();
        let identity = identity.clone();
        let symbol = symbol.clone();
        run_blocking(move || client.record_action_blocking(&identity, &symbol, liked)).await
    }

    async fn check_status(&self, identity: &IdentityToken) -> RemoteResult<QuotaStatus> {
        let client = self.clone();
        let identity = identity.clone();
        run_blocking(move || client.check_status_blocking(&identity)).await
    }
}

async fn run_blocking<T, F>(f: F) -> RemoteResult<T>
where
    F: FnOnce() -> RemoteResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RemoteError::unavailable(format!("Request task failed: {}", e)))?
}

fn swipe_url(base_url: &str, symbol: &Symbol, liked: bool) -> String {
    format!(
        "{}/swipe?symbol={}&liked={}",
        base_url,
        urlencoding::encode(symbol.as_str()),
        liked
    )
}

fn map_error(e: ureq::Error) -> RemoteError {
    match e {
        ureq::Error::StatusCode(TOO_MANY_REQUESTS) => RemoteError::RateLimited,
        ureq::Error::StatusCode(code) => RemoteError::unavailable(format!("HTTP {}", code)),
        other => RemoteError::unavailable(other),
    }
}

fn remaining_from_headers(headers: &ureq::http::HeaderMap) -> Option<u32> {
    parse_remaining(headers.get(REMAINING_HEADER).and_then(|v| v.to_str().ok()))
}

/// Parse the remaining-quota header; absent or malformed means unknown
fn parse_remaining(value: Option<&str>) -> Option<u32> {
    value?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remaining() {
        assert_eq!(parse_remaining(Some("12")), Some(12));
        assert_eq!(parse_remaining(Some(" 0 ")), Some(0));
        assert_eq!(parse_remaining(Some("-1")), None);
        assert_eq!(parse_remaining(Some("lots")), None);
        assert_eq!(parse_remaining(None), None);
    }

    #[test]
    fn test_swipe_url_encodes_symbol() {
        let url = swipe_url("http://api/stocks", &Symbol::new("BRK.B&X"), true);
        assert_eq!(url, "http://api/stocks/swipe?symbol=BRK.B%26X&liked=true");
    }

    #[test]
    fn test_map_error() {
        assert_eq!(
            map_error(ureq::Error::StatusCode(429)),
            RemoteError::RateLimited
        );
        assert!(matches!(
            map_error(ureq::Error::StatusCode(503)),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpRemoteSession::new("http://localhost:8080/api/stocks/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8080/api/stocks");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = HttpRemoteSession::new("http://127.0.0.1:9/api/stocks", Duration::from_millis(500));
        let result = client.fetch_deck(&IdentityToken::new("device")).await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
    }
}
