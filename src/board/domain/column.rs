//! Kanban column view and work-in-progress limits.

use super::{Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// Per-column capacity; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipLimits {
    /// Capacity of the `todo` column.
    pub todo: Option<usize>,
    /// Capacity of the `in-progress` column.
    pub in_progress: Option<usize>,
    /// Capacity of the `review` column.
    pub review: Option<usize>,
    /// Capacity of the `done` column.
    pub done: Option<usize>,
}

impl Default for WipLimits {
    fn default() -> Self {
        Self {
            todo: Some(10),
            in_progress: Some(5),
            review: Some(3),
            done: None,
        }
    }
}

impl WipLimits {
    /// Limits with no capacity restriction on any column.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            todo: None,
            in_progress: None,
            review: None,
            done: None,
        }
    }

    /// Returns the capacity configured for `status`.
    #[must_use]
    pub const fn limit_for(&self, status: TaskStatus) -> Option<usize> {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Done => self.done,
        }
    }

    /// Returns a copy with the capacity for `status` replaced.
    #[must_use]
    pub const fn with_limit(mut self, status: TaskStatus, limit: Option<usize>) -> Self {
        match status {
            TaskStatus::Todo => self.todo = limit,
            TaskStatus::InProgress => self.in_progress = limit,
            TaskStatus::Review => self.review = limit,
            TaskStatus::Done => self.done = limit,
        }
        self
    }
}

/// Read-only view of one workflow column.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn {
    status: TaskStatus,
    tasks: Vec<Task>,
    wip_limit: Option<usize>,
}

impl KanbanColumn {
    /// Creates a column view over already-ordered members.
    #[must_use]
    pub const fn new(status: TaskStatus, tasks: Vec<Task>, wip_limit: Option<usize>) -> Self {
        Self {
            status,
            tasks,
            wip_limit,
        }
    }

    /// Returns the column's status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the column identifier (its status string).
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.status.as_str()
    }

    /// Returns the ordered members.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn wip_limit(&self) -> Option<usize> {
        self.wip_limit
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when the column has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns `true` when the column cannot accept another task.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.wip_limit.is_some_and(|limit| self.tasks.len() >= limit)
    }
}
