//! Task workflow: CRUD and the capacity-checked move protocol.

use crate::board::aggregation::{TaskFilter, columns_view};
use crate::board::domain::{
    BoardDomainError, KanbanColumn, NewTask, Task, TaskId, TaskPatch, TaskStatus, WipLimits,
};
use crate::error::ErrorKind;
use crate::persistence::ports::{KeyValueStore, PersistenceError};
use crate::tracking::domain::TimeEntry;
use crate::tracking::services::{StoppedSession, TimerSessionManager, TrackingError};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::TaskBook;

/// Service-level errors for workflow operations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The destination column is at its work-in-progress limit.
    #[error("column '{status}' is at its limit of {limit} tasks")]
    Capacity {
        /// Destination column.
        status: TaskStatus,
        /// Configured capacity.
        limit: usize,
    },

    /// Stopping the task's timer failed.
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// The persistence collaborator failed; the task list and any timer
    /// stopped on the way were rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl WorkflowError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::Capacity { .. } => ErrorKind::Capacity,
            Self::Tracking(err) => err.kind(),
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// The task after the move.
    pub task: Task,
    /// Column the task left.
    pub from: TaskStatus,
    /// Entry recorded when the move stopped the task's timer.
    pub stopped_entry: Option<TimeEntry>,
}

/// Owns task status transitions and column order.
pub struct TaskWorkflowEngine<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    book: TaskBook<S>,
    timer: Arc<TimerSessionManager<S, C>>,
    clock: Arc<C>,
    limits: WipLimits,
}

/// Global list positions of the members of `status`, in column order.
fn column_positions(tasks: &[Task], status: TaskStatus) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| task.status() == status)
        .map(|(position, _)| position)
        .collect()
}

/// List position at which a task becomes member `column_index` of a column
/// whose current members sit at `positions`.
fn insertion_point(positions: &[usize], column_index: usize, list_len: usize) -> usize {
    positions
        .get(column_index)
        .copied()
        .or_else(|| positions.last().map(|last| last + 1))
        .unwrap_or(list_len)
}

fn position_of(tasks: &[Task], id: &TaskId) -> WorkflowResult<usize> {
    tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or_else(|| WorkflowError::TaskNotFound(id.clone()))
}

impl<S, C> TaskWorkflowEngine<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a workflow engine over `book`, stopping timers through
    /// `timer`.
    #[must_use]
    pub const fn new(
        book: TaskBook<S>,
        timer: Arc<TimerSessionManager<S, C>>,
        clock: Arc<C>,
        limits: WipLimits,
    ) -> Self {
        Self {
            book,
            timer,
            clock,
            limits,
        }
    }

    /// Returns the configured column capacities.
    #[must_use]
    pub const fn limits(&self) -> &WipLimits {
        &self.limits
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
    pub fn task(&self, id: &TaskId) -> WorkflowResult<Task> {
        self.book
            .find(id)?
            .ok_or_else(|| WorkflowError::TaskNotFound(id.clone()))
    }

    /// Returns every task in list order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Persistence`] when the state lock is
    /// poisoned.
    pub fn tasks(&self) -> WorkflowResult<Vec<Task>> {
        Ok(self.book.snapshot()?)
    }

    /// Returns the board columns, applying `filter` to their members.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Persistence`] when the state lock is
    /// poisoned.
    pub fn columns(&self, filter: &TaskFilter) -> WorkflowResult<Vec<KanbanColumn>> {
        Ok(columns_view(&self.book.snapshot()?, &self.limits, filter))
    }

    /// Creates a task at the end of the `todo` column.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Domain`] for invalid input or
    /// [`WorkflowError::Persistence`] when the write fails.
    pub fn create_task(&self, payload: NewTask) -> WorkflowResult<Task> {
        let task = Task::new(payload, &*self.clock)?;
        self.book.update(|tasks| {
            tasks.push(task.clone());
            Ok::<_, WorkflowError>(())
        })?;
        info!(task = %task.id(), title = task.title(), "task created");
        Ok(task)
    }

    /// Edits a task's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], [`WorkflowError::Domain`] or
    /// [`WorkflowError::Persistence`].
    pub fn update_task(&self, id: &TaskId, patch: TaskPatch) -> WorkflowResult<Task> {
        let updated = self.book.update(|tasks| {
            let position = position_of(tasks, id)?;
            let task = tasks
                .get_mut(position)
                .ok_or_else(|| WorkflowError::TaskNotFound(id.clone()))?;
            task.apply_patch(patch, &*self.clock)?;
            Ok::<_, WorkflowError>(task.clone())
        })?;
        info!(task = %id, "task updated");
        Ok(updated)
    }

    /// Deletes a task, first stopping its timer if one is live.
    ///
    /// Time entries logged against the task are kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], a tracking error from
    /// stopping the timer, or [`WorkflowError::Persistence`]; on a failed
    /// write the task and its timer are left as they were.
    pub fn delete_task(&self, id: &TaskId) -> WorkflowResult<Task> {
        self.task(id)?;
        let stopped = self.stop_timer_for(id)?;
        let removal = self.book.update(|tasks| {
            let position = position_of(tasks, id)?;
            Ok::<_, WorkflowError>(tasks.remove(position))
        });
        let removed = match removal {
            Ok(task) => task,
            Err(err) => {
                self.undo_stop(stopped);
                return Err(err);
            }
        };
        info!(task = %id, "task deleted");
        Ok(removed)
    }

    /// Moves a task to `target` at `target_index` within that column.
    ///
    /// A move within the current column is a reorder and never hits the
    /// capacity check. A move into `done` stops the task's live timer first.
    /// Indexes past the end of the column append.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Capacity`] when the destination column is
    /// full (nothing changes), [`WorkflowError::TaskNotFound`], a tracking
    /// error from stopping the timer, or [`WorkflowError::Persistence`] when
    /// the write fails. A failed write leaves the list and the timer as they
    /// were before the call.
    pub fn move_task(
        &self,
        id: &TaskId,
        target: TaskStatus,
        target_index: usize,
    ) -> WorkflowResult<MoveOutcome> {
        let current = self.task(id)?;
        let from = current.status();
        if from == target {
            let task = self.reorder(id, target, target_index)?;
            return Ok(MoveOutcome {
                task,
                from,
                stopped_entry: None,
            });
        }

        self.check_capacity(&self.book.snapshot()?, target)?;
        let stopped = if target.is_done() {
            self.stop_timer_for(id)?
        } else {
            None
        };

        let moved = self.book.update(|tasks| {
            self.check_capacity(tasks, target)?;
            let position = position_of(tasks, id)?;
            let mut moving = tasks.remove(position);
            moving.transition_to(target, &*self.clock);
            let positions = column_positions(tasks, target);
            let insert_at = insertion_point(&positions, target_index, tasks.len());
            tasks.insert(insert_at, moving.clone());
            Ok::<_, WorkflowError>(moving)
        });
        let task = match moved {
            Ok(task) => task,
            Err(err) => {
                self.undo_stop(stopped);
                return Err(err);
            }
        };
        info!(task = %id, %from, to = %target, index = target_index, "task moved");
        Ok(MoveOutcome {
            task,
            from,
            stopped_entry: stopped.map(StoppedSession::into_entry),
        })
    }

    fn reorder(&self, id: &TaskId, status: TaskStatus, target_index: usize) -> WorkflowResult<Task> {
        let snapshot = self.book.snapshot()?;
        let members = column_positions(&snapshot, status);
        let current_index = members
            .iter()
            .position(|position| snapshot.get(*position).is_some_and(|task| task.id() == id));
        let last_index = members.len().saturating_sub(1);
        if current_index == Some(target_index.min(last_index)) {
            debug!(task = %id, "reorder ignored: task already at target index");
            return self.task(id);
        }

        self.book.update(|tasks| {
            let position = position_of(tasks, id)?;
            let moving = tasks.remove(position);
            let positions = column_positions(tasks, status);
            let insert_at = insertion_point(&positions, target_index, tasks.len());
            tasks.insert(insert_at, moving.clone());
            Ok::<_, WorkflowError>(moving)
        })
    }

    fn check_capacity(&self, tasks: &[Task], target: TaskStatus) -> WorkflowResult<()> {
        let Some(limit) = self.limits.limit_for(target) else {
            return Ok(());
        };
        let occupants = tasks.iter().filter(|task| task.status() == target).count();
        if occupants >= limit {
            warn!(status = %target, limit, "move rejected: column at capacity");
            return Err(WorkflowError::Capacity {
                status: target,
                limit,
            });
        }
        Ok(())
    }

    fn stop_timer_for(&self, id: &TaskId) -> WorkflowResult<Option<StoppedSession>> {
        let stopped = self.timer.stop_tracking(id)?;
        if let Some(recorded) = stopped.as_ref() {
            info!(task = %id, entry = %recorded.entry().id(), "stopped timer for task leaving active work");
        }
        Ok(stopped)
    }

    fn undo_stop(&self, stopped: Option<StoppedSession>) {
        let Some(stopped) = stopped else {
            return;
        };
        let entry = stopped.entry().id().clone();
        if let Err(err) = self.timer.reinstate(stopped) {
            error!(entry = %entry, error = %err, "failed to undo timer stop after task write failed");
        }
    }
}
