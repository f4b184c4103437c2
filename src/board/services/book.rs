//! Owned, persisted task list.

use crate::board::domain::{Task, TaskId};
use crate::notify::EventHub;
use crate::persistence::ports::{
    KeyValueStore, PersistenceError, PersistenceResult, load_json, save_json,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// The ordered task list, written through to the store on every change.
///
/// List order doubles as column order: a column's members appear in the
/// relative order they hold in the list.
pub struct TaskBook<S>
where
    S: KeyValueStore,
{
    tasks: Arc<Mutex<Vec<Task>>>,
    store: Arc<S>,
    key: String,
    events: EventHub,
}

impl<S> Clone for TaskBook<S>
where
    S: KeyValueStore,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S> TaskBook<S>
where
    S: KeyValueStore,
{
    /// Loads the persisted task list stored under `key`, starting empty when
    /// nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the list cannot be read or decoded.
    pub fn load(store: Arc<S>, key: impl Into<String>, events: EventHub) -> PersistenceResult<Self> {
        let storage_key = key.into();
        let tasks: Vec<Task> = load_json(&*store, &storage_key)?.unwrap_or_default();
        Ok(Self {
            tasks: Arc::new(Mutex::new(tasks)),
            store,
            key: storage_key,
            events,
        })
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Vec<Task>>> {
        self.tasks.lock().map_err(PersistenceError::unavailable)
    }

    /// Returns a copy of the ordered task list.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the state lock is
    /// poisoned.
    pub fn snapshot(&self) -> PersistenceResult<Vec<Task>> {
        Ok(self.lock()?.clone())
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the state lock is
    /// poisoned.
    pub fn find(&self, id: &TaskId) -> PersistenceResult<Option<Task>> {
        Ok(self.lock()?.iter().find(|task| task.id() == id).cloned())
    }

    /// Applies `change` to the list and persists the result.
    ///
    /// The change is all-or-nothing: when `change` fails or the write is
    /// rejected, the list is restored to the last persisted state and the
    /// error is returned. Subscribers are notified only after a successful
    /// write.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `change`, or the store's write error
    /// converted into `E`.
    pub fn update<T, E>(&self, change: impl FnOnce(&mut Vec<Task>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<PersistenceError>,
    {
        let mut tasks = self.lock()?;
        let previous = tasks.clone();
        let outcome = match change(&mut tasks) {
            Ok(outcome) => outcome,
            Err(err) => {
                *tasks = previous;
                return Err(err);
            }
        };
        if let Err(err) = save_json(&*self.store, &self.key, &*tasks) {
            warn!(key = %self.key, error = %err, "task list write failed; rolling back");
            *tasks = previous;
            return Err(err.into());
        }
        self.events.publish_tasks(&tasks);
        Ok(outcome)
    }
}
