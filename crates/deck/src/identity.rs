//! Per-install identity token
//!
//! The token is created once, persisted under [`keys::IDENTITY`], and sent
//! with every remote call. When storage is unavailable the provider keeps a
//! process-local token instead: the current run keeps working, and the next
//! run simply gets a new identity.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::models::IdentityToken;
use crate::storage::{DurableStore, keys};

/// Anything that can tell the engine which identity to use
///
/// `None` means the identity is not known yet (a bootstrap race); callers
/// defer instead of failing.
pub trait IdentitySource: Send + Sync {
    fn resolve(&self) -> Option<IdentityToken>;
}

/// Durable identity provider backed by a [`DurableStore`]
pub struct IdentityProvider {
    store: Arc<dyn DurableStore>,
    /// Token handed out by this process; the only copy when storage is down
    in_process: Mutex<Option<IdentityToken>>,
}

impl IdentityProvider {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            in_process: Mutex::new(None),
        }
    }

    /// Return the install's token, creating and persisting it on first use
    ///
    /// Idempotent: repeated calls return the same token for as long as either
    /// the store or this process remembers it. Never fails.
    pub fn get_or_create(&self) -> IdentityToken {
        match self.store.get(keys::IDENTITY) {
            Ok(Some(bytes)) => {
                if let Some(token) = parse_token(&bytes) {
                    self.remember(&token);
                    return token;
                }
                warn!("Stored identity is unreadable, replacing it");
            }
            Ok(None) => {}
            Err(e) => debug!("Identity store unavailable: {}", e),
        }

        let mut in_process = self.in_process.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = in_process.as_ref() {
            return token.clone();
        }

        let token = generate_token();
        match self.store.set(keys::IDENTITY, token.as_str().as_bytes()) {
            Ok(()) => debug!("Created identity {}", token),
            Err(e) => warn!("Identity could not be persisted, using memory-only token: {}", e),
        }
        *in_process = Some(token.clone());
        token
    }

    fn remember(&self, token: &IdentityToken) {
        let mut in_process = self.in_process.lock().unwrap_or_else(|e| e.into_inner());
        *in_process = Some(token.clone());
    }
}

impl IdentitySource for IdentityProvider {
    fn resolve(&self) -> Option<IdentityToken> {
        Some(self.get_or_create())
    }
}

fn parse_token(bytes: &[u8]) -> Option<IdentityToken> {
    let token = std::str::from_utf8(bytes).ok()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(IdentityToken::new(token))
    }
}

fn generate_token() -> IdentityToken {
    IdentityToken::new(uuid::Uuid::new_v4().to_string())
}
