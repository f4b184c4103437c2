//! Append-only time entry log.

use crate::board::aggregation::logged_hours;
use crate::board::domain::{Task, TaskId};
use crate::board::services::TaskBook;
use crate::persistence::ports::{
    KeyValueStore, PersistenceError, PersistenceResult, load_json, save_json,
};
use crate::tracking::domain::{EntryAmendment, TimeEntry, TimeEntryId, TimeEntryInput, TimerSession};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use super::{TrackingError, TrackingResult};

const HOURS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Default)]
struct EntryLog {
    entries: Vec<TimeEntry>,
    /// Entry produced by the latest timer stop, open for amendment until the
    /// next timer start.
    amendable: Option<TimeEntryId>,
}

/// Records time entries and keeps each task's logged-hours cache current.
pub struct TimeEntryRecorder<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    log: Arc<Mutex<EntryLog>>,
    store: Arc<S>,
    clock: Arc<C>,
    book: TaskBook<S>,
    key: String,
    auto_description: String,
}

impl<S, C> Clone for TimeEntryRecorder<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            book: self.book.clone(),
            key: self.key.clone(),
            auto_description: self.auto_description.clone(),
        }
    }
}

impl<S, C> TimeEntryRecorder<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Loads the persisted entry log stored under `key`.
    ///
    /// `auto_description` is used for timer entries whose session carries no
    /// note.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the log cannot be read or decoded.
    pub fn load(
        store: Arc<S>,
        clock: Arc<C>,
        book: TaskBook<S>,
        key: impl Into<String>,
        auto_description: impl Into<String>,
    ) -> PersistenceResult<Self> {
        let storage_key = key.into();
        let entries: Vec<TimeEntry> = load_json(&*store, &storage_key)?.unwrap_or_default();
        Ok(Self {
            log: Arc::new(Mutex::new(EntryLog {
                entries,
                amendable: None,
            })),
            store,
            clock,
            book,
            key: storage_key,
            auto_description: auto_description.into(),
        })
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, EntryLog>> {
        self.log.lock().map_err(PersistenceError::unavailable)
    }

    /// Returns the task list this recorder attributes hours to.
    #[must_use]
    pub const fn book(&self) -> &TaskBook<S> {
        &self.book
    }

    /// Returns every entry in recording order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the state lock is
    /// poisoned.
    pub fn entries(&self) -> PersistenceResult<Vec<TimeEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    /// Returns the entries logged against `task_id` in recording order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the state lock is
    /// poisoned.
    pub fn entries_for_task(&self, task_id: &TaskId) -> PersistenceResult<Vec<TimeEntry>> {
        Ok(self
            .lock()?
            .entries
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .cloned()
            .collect())
    }

    /// Sums the hours logged against `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] when the state lock is
    /// poisoned.
    pub fn logged_hours(&self, task_id: &TaskId) -> PersistenceResult<f64> {
        Ok(logged_hours(task_id, &self.lock()?.entries))
    }

    /// Records a manual entry against an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Domain`] for invalid input,
    /// [`TrackingError::TaskNotFound`] for an unknown task, or
    /// [`TrackingError::Persistence`] when the write fails (nothing is
    /// recorded in that case).
    pub fn record(&self, input: TimeEntryInput) -> TrackingResult<TimeEntry> {
        let task = self
            .book
            .find(input.task_id())?
            .ok_or_else(|| TrackingError::TaskNotFound(input.task_id().clone()))?;
        let entry = TimeEntry::manual(input, task.project(), self.clock.utc())?;
        self.append(&entry, false)?;
        info!(entry = %entry.id(), task = %entry.task_id(), hours = entry.hours(), "recorded manual time entry");
        Ok(entry)
    }

    /// Corrects the entry produced by the most recent timer stop for
    /// `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::NoAmendableEntry`] when no timer entry for the
    /// task is open for amendment, [`TrackingError::Domain`] for invalid
    /// hours, or [`TrackingError::Persistence`] when the write fails.
    pub fn amend_last(
        &self,
        task_id: &TaskId,
        amendment: EntryAmendment,
    ) -> TrackingResult<TimeEntry> {
        let mut log = self.lock()?;
        let not_amendable = || TrackingError::NoAmendableEntry(task_id.clone());
        let position = log
            .amendable
            .as_ref()
            .and_then(|id| {
                log.entries
                    .iter()
                    .position(|entry| entry.id() == id && entry.task_id() == task_id)
            })
            .ok_or_else(not_amendable)?;

        let previous = log.entries.clone();
        let entry = log.entries.get_mut(position).ok_or_else(not_amendable)?;
        entry.amend(amendment)?;
        let amended = entry.clone();

        if let Err(err) = save_json(&*self.store, &self.key, &log.entries) {
            log.entries = previous;
            return Err(err.into());
        }
        let total = logged_hours(task_id, &log.entries);
        if let Err(err) = self.refresh_task(task_id, |task| task.set_logged_hours(total)) {
            log.entries = previous;
            self.restore(&log.entries);
            return Err(err);
        }
        info!(entry = %amended.id(), task = %task_id, hours = amended.hours(), "amended time entry");
        Ok(amended)
    }

    /// Recomputes every task's logged-hours cache from the entry log,
    /// persisting only when a cache was stale. Returns the number of tasks
    /// corrected.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the corrected task list
    /// cannot be written.
    pub fn reconcile(&self) -> TrackingResult<usize> {
        let log = self.lock()?;
        let stale: Vec<(TaskId, f64)> = self
            .book
            .snapshot()?
            .iter()
            .filter_map(|task| {
                let total = logged_hours(task.id(), &log.entries);
                ((task.logged_hours() - total).abs() > HOURS_TOLERANCE)
                    .then(|| (task.id().clone(), total))
            })
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        self.book.update(|tasks| {
            for task in tasks.iter_mut() {
                if let Some((_, total)) = stale.iter().find(|(id, _)| id == task.id()) {
                    task.set_logged_hours(*total);
                }
            }
            Ok::<_, TrackingError>(())
        })?;
        warn!(count = stale.len(), "corrected stale logged-hours caches");
        Ok(stale.len())
    }

    /// Records the entry for a finished timer session and opens it for
    /// amendment.
    pub(crate) fn record_session(
        &self,
        session: &TimerSession,
        elapsed: TimeDelta,
    ) -> TrackingResult<TimeEntry> {
        let project = self
            .book
            .find(session.task_id())?
            .map(|task| task.project().to_owned())
            .unwrap_or_default();
        let entry = TimeEntry::from_session(
            session,
            elapsed,
            project,
            &self.auto_description,
            self.clock.utc(),
        );
        self.append(&entry, true)?;
        Ok(entry)
    }

    /// Removes an entry recorded by a transition that could not complete.
    pub(crate) fn retract(&self, entry_id: &TimeEntryId) -> TrackingResult<()> {
        let mut log = self.lock()?;
        let Some(entry) = log.entries.iter().find(|entry| entry.id() == entry_id).cloned() else {
            return Ok(());
        };
        let previous = log.entries.clone();
        log.entries.retain(|candidate| candidate.id() != entry_id);
        if let Err(err) = save_json(&*self.store, &self.key, &log.entries) {
            log.entries = previous;
            return Err(err.into());
        }
        let total = logged_hours(entry.task_id(), &log.entries);
        if let Err(err) = self.refresh_task(entry.task_id(), |task| task.detach_entry(entry_id, total))
        {
            log.entries = previous;
            self.restore(&log.entries);
            return Err(err);
        }
        if log.amendable.as_ref() == Some(entry_id) {
            log.amendable = None;
        }
        Ok(())
    }

    /// Closes the amendment window opened by the last timer stop.
    pub(crate) fn close_amend_window(&self) -> PersistenceResult<()> {
        self.lock()?.amendable = None;
        Ok(())
    }

    fn append(&self, entry: &TimeEntry, amendable: bool) -> TrackingResult<()> {
        let mut log = self.lock()?;
        let recorded = log.entries.len();
        log.entries.push(entry.clone());
        if let Err(err) = save_json(&*self.store, &self.key, &log.entries) {
            log.entries.truncate(recorded);
            return Err(err.into());
        }

        let total = logged_hours(entry.task_id(), &log.entries);
        let entry_id = entry.id().clone();
        if let Err(err) =
            self.refresh_task(entry.task_id(), |task| task.attach_entry(entry_id.clone(), total))
        {
            log.entries.truncate(recorded);
            self.restore(&log.entries);
            return Err(err);
        }
        if amendable {
            log.amendable = Some(entry_id);
        }
        Ok(())
    }

    fn refresh_task(
        &self,
        task_id: &TaskId,
        refresh: impl FnOnce(&mut Task),
    ) -> TrackingResult<()> {
        self.book.update(|tasks| {
            if let Some(task) = tasks.iter_mut().find(|task| task.id() == task_id) {
                refresh(task);
            }
            Ok(())
        })
    }

    /// Rewrites the log after a later step of a transition failed.
    fn restore(&self, entries: &[TimeEntry]) {
        if let Err(err) = save_json(&*self.store, &self.key, entries) {
            error!(key = %self.key, error = %err, "failed to restore time entry log after rollback");
        }
    }
}
