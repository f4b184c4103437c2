//! Store port for durable JSON documents keyed by string.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for key-value store operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable key to JSON document store.
///
/// Writes are synchronous from the caller's point of view and expected to be
/// atomic per key. Implementations must surface every failure instead of
/// dropping it.
pub trait KeyValueStore: Send + Sync {
    /// Reads the document stored under `key`.
    ///
    /// Returns `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Read`] when the backing store cannot be
    /// read or [`PersistenceError::Codec`] when the stored bytes are not JSON.
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>>;

    /// Replaces the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Write`] when the document cannot be stored.
    fn set(&self, key: &str, value: &Value) -> PersistenceResult<()>;

    /// Removes the document stored under `key`. Removing an absent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Remove`] when the backing store rejects the
    /// removal.
    fn remove(&self, key: &str) -> PersistenceResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> PersistenceResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        (**self).remove(key)
    }
}

/// Errors returned by key-value store implementations.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// Reading a key failed.
    #[error("failed to read '{key}': {source}")]
    Read {
        /// Key being read.
        key: String,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Writing a key failed.
    #[error("failed to write '{key}': {source}")]
    Write {
        /// Key being written.
        key: String,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Removing a key failed.
    #[error("failed to remove '{key}': {source}")]
    Remove {
        /// Key being removed.
        key: String,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// A stored document could not be encoded or decoded.
    #[error("invalid document under '{key}': {source}")]
    Codec {
        /// Key holding the document.
        key: String,
        /// Underlying serde failure.
        source: Arc<serde_json::Error>,
    },

    /// In-memory engine state is unusable (for example a poisoned lock).
    #[error("state unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Wraps a read failure.
    #[must_use]
    pub fn read(key: &str, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Read {
            key: key.to_owned(),
            source: Arc::new(err),
        }
    }

    /// Wraps a write failure.
    #[must_use]
    pub fn write(key: &str, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Write {
            key: key.to_owned(),
            source: Arc::new(err),
        }
    }

    /// Wraps a removal failure.
    #[must_use]
    pub fn remove(key: &str, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Remove {
            key: key.to_owned(),
            source: Arc::new(err),
        }
    }

    /// Wraps a serde failure for the document under `key`.
    #[must_use]
    pub fn codec(key: &str, err: serde_json::Error) -> Self {
        Self::Codec {
            key: key.to_owned(),
            source: Arc::new(err),
        }
    }

    /// Reports an unusable in-memory state, such as a poisoned lock.
    #[must_use]
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::Unavailable(reason.to_string())
    }

    /// Returns `true` when the error came from decoding a stored document.
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self, Self::Codec { .. })
    }
}

/// Reads and decodes the document under `key`.
///
/// # Errors
///
/// Returns the store's read error, or [`PersistenceError::Codec`] when the
/// document does not match `T`.
pub fn load_json<T, S>(store: &S, key: &str) -> PersistenceResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    store
        .get(key)?
        .map(|value| serde_json::from_value(value).map_err(|err| PersistenceError::codec(key, err)))
        .transpose()
}

/// Encodes `value` and writes it under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError::Codec`] when `value` cannot be encoded, or the
/// store's write error.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> PersistenceResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let document = serde_json::to_value(value).map_err(|err| PersistenceError::codec(key, err))?;
    store.set(key, &document)
}
