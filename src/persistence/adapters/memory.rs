//! In-memory key-value store for tests and ephemeral boards.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::persistence::ports::{KeyValueStore, PersistenceError, PersistenceResult};

/// Thread-safe in-memory key-value store.
///
/// Clones share the same underlying map, so a clone handed to a second
/// [`crate::Workboard`] behaves like a process restart over the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the lock is poisoned.
    pub fn keys(&self) -> PersistenceResult<Vec<String>> {
        let state = self.state.read().map_err(PersistenceError::unavailable)?;
        let mut keys: Vec<String> = state.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        let state = self
            .state
            .read()
            .map_err(|err| PersistenceError::read(key, std::io::Error::other(err.to_string())))?;
        Ok(state.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> PersistenceResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PersistenceError::write(key, std::io::Error::other(err.to_string())))?;
        state.insert(key.to_owned(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PersistenceError::remove(key, std::io::Error::other(err.to_string())))?;
        state.remove(key);
        Ok(())
    }
}
