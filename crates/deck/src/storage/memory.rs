//! In-memory storage implementation
//!
//! Used by tests and as the fallback when the on-disk store cannot be opened.
//! It can also simulate blocked storage and a byte quota, the two ways a
//! browser-style store fails in practice.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::DurableStore;
use crate::error::{StoreError, StoreResult};

/// In-memory implementation of DurableStore
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    /// When set, every operation fails with `StoreError::Unavailable`
    blocked: AtomicBool,
    /// Maximum total bytes across all values
    capacity: Option<usize>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            blocked: AtomicBool::new(false),
            capacity: None,
        }
    }

    /// Create a store that rejects writes once values total more than `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Create a store that behaves like disabled storage
    pub fn blocked() -> Self {
        let store = Self::new();
        store.set_blocked(true);
        store
    }

    /// Toggle simulated unavailability
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.blocked.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage is blocked".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_available()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if let Some(capacity) = self.capacity {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > capacity {
                return Err(StoreError::QuotaExceeded { needed, capacity });
            }
        }

        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
