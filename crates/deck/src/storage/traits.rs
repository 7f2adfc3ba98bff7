//! Storage trait definitions

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreResult;

/// Key/value persistence with best-effort availability
///
/// Implementations never panic past this boundary. Every failure (storage
/// disabled, quota exceeded, backend error) comes back as a `StoreError` so the
/// caller can choose to degrade. Writes replace the whole value; concurrent
/// writers simply race and the last write wins.
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete the value stored under `key` (missing keys are not an error)
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Read and decode a JSON record
///
/// Absent keys, unavailable storage and undecodable values all read as `None`;
/// the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable record {}: {}", key, e);
            None
        }
    }
}

/// Encode and store a JSON record
pub fn save_json<T: Serialize + ?Sized>(store: &dyn DurableStore, key: &str, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes)
}
