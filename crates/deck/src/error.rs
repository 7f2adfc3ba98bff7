//! Error types for the session core
//!
//! Neither type is ever surfaced to the user directly: callers translate them
//! into state transitions (`limitReached`, retry, silent degrade).

/// Failure of a remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote reports the daily quota is used up. Authoritative; never retried automatically.
    #[error("Daily limit reached")]
    RateLimited,

    /// Network or server failure. Transient.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        RemoteError::Unavailable(reason.to_string())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited)
    }
}

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of local durable storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Storage is disabled or blocked
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write would exceed the available capacity
    #[error("Storage quota exceeded: need {needed} bytes, capacity {capacity}")]
    QuotaExceeded { needed: usize, capacity: usize },

    /// Underlying backend failed
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for durable store operations
pub type StoreResult<T> = Result<T, StoreError>;
