//! Wires the engine services over one store and one clock.

use crate::board::aggregation::{BoardStats, TaskFilter, board_stats};
use crate::board::domain::KanbanColumn;
use crate::board::services::{TaskBook, TaskWorkflowEngine, WorkflowError};
use crate::config::WorkboardConfig;
use crate::error::ErrorKind;
use crate::notify::EventHub;
use crate::persistence::ports::{KeyValueStore, PersistenceError};
use crate::tracking::services::{TimeEntryRecorder, TimerSessionManager, TrackingError};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while opening or querying the engine.
#[derive(Debug, Clone, Error)]
pub enum WorkboardError {
    /// Persisted state could not be loaded.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Timer or recorder startup failed.
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// A workflow query failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl WorkboardError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Tracking(err) => err.kind(),
            Self::Workflow(err) => err.kind(),
        }
    }
}

/// The assembled engine: task workflow, time entries and the live timer.
pub struct Workboard<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    config: WorkboardConfig,
    clock: Arc<C>,
    events: EventHub,
    timer: Arc<TimerSessionManager<S, C>>,
    workflow: TaskWorkflowEngine<S, C>,
}

impl<S, C> Workboard<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    /// Loads persisted state from `store` and restores any live timer
    /// session.
    ///
    /// Stale logged-hours caches are corrected on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`WorkboardError`] when a stored document cannot be read or
    /// decoded, or a correction cannot be written.
    pub fn open(store: Arc<S>, clock: Arc<C>, config: WorkboardConfig) -> Result<Self, WorkboardError> {
        let events = EventHub::default();
        let book = TaskBook::load(Arc::clone(&store), &config.storage.tasks, events.clone())?;
        let recorder = TimeEntryRecorder::load(
            Arc::clone(&store),
            Arc::clone(&clock),
            book.clone(),
            &config.storage.time_entries,
            &config.auto_entry_description,
        )?;
        let corrected = recorder.reconcile()?;
        let timer = Arc::new(TimerSessionManager::restore(
            store,
            Arc::clone(&clock),
            recorder,
            events.clone(),
            &config.storage.timer_session,
            config.tick_interval(),
        )?);
        let workflow = TaskWorkflowEngine::new(
            book,
            Arc::clone(&timer),
            Arc::clone(&clock),
            config.wip_limits,
        );
        info!(corrected, "workboard opened");
        Ok(Self {
            config,
            clock,
            events,
            timer,
            workflow,
        })
    }

    /// Returns the configuration the engine was opened with.
    #[must_use]
    pub const fn config(&self) -> &WorkboardConfig {
        &self.config
    }

    /// Returns the notification hub.
    #[must_use]
    pub const fn events(&self) -> &EventHub {
        &self.events
    }

    /// Returns the timer session manager.
    #[must_use]
    pub fn timer(&self) -> &TimerSessionManager<S, C> {
        &self.timer
    }

    /// Returns the time entry recorder.
    #[must_use]
    pub fn recorder(&self) -> &TimeEntryRecorder<S, C> {
        self.timer.recorder()
    }

    /// Returns the task workflow engine.
    #[must_use]
    pub const fn workflow(&self) -> &TaskWorkflowEngine<S, C> {
        &self.workflow
    }

    /// Returns the board columns, filtered.
    ///
    /// # Errors
    ///
    /// Returns [`WorkboardError::Workflow`] when the task list is
    /// unavailable.
    pub fn columns(&self, filter: &TaskFilter) -> Result<Vec<KanbanColumn>, WorkboardError> {
        Ok(self.workflow.columns(filter)?)
    }

    /// Computes board statistics for the clock's current local day.
    ///
    /// # Errors
    ///
    /// Returns [`WorkboardError`] when the task list or entry log is
    /// unavailable.
    pub fn stats(&self) -> Result<BoardStats, WorkboardError> {
        let tasks = self.workflow.tasks()?;
        let entries = self.recorder().entries()?;
        Ok(board_stats(&tasks, &entries, self.clock.local().fixed_offset()))
    }
}
