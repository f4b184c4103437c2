//! Derived board views: per-task hours, columns and statistics.
//!
//! Everything here is a pure function of the current task list and entry
//! log; nothing is cached.

use crate::board::domain::{KanbanColumn, Priority, Task, TaskId, TaskStatus, WipLimits};
use crate::tracking::domain::TimeEntry;
use chrono::{DateTime, FixedOffset};

/// Sums the hours of every entry logged against `task_id`.
#[must_use]
pub fn logged_hours(task_id: &TaskId, entries: &[TimeEntry]) -> f64 {
    total_hours(
        entries
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .map(TimeEntry::hours),
    )
}

/// Adds up hours starting from positive zero; an empty sum is `0.0`.
fn total_hours(hours: impl Iterator<Item = f64>) -> f64 {
    hours.fold(0.0, |total, value| total + value)
}

/// Board filter applied before tasks are partitioned into columns.
///
/// Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    project: Option<String>,
    assignee: Option<String>,
    priority: Option<Priority>,
    search: Option<String>,
}

impl TaskFilter {
    /// Creates a filter matching every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one project.
    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Restricts to one assignee.
    #[must_use]
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Restricts to one priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts to tasks whose title or description contains `text`,
    /// ignoring case.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into().to_lowercase());
        self
    }

    /// Returns `true` when `task` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let project_ok = self
            .project
            .as_deref()
            .is_none_or(|project| task.project() == project);
        let assignee_ok = self
            .assignee
            .as_deref()
            .is_none_or(|assignee| task.assignee() == assignee);
        let priority_ok = self
            .priority
            .is_none_or(|priority| task.priority() == priority);
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            needle.is_empty()
                || task.title().to_lowercase().contains(needle)
                || task.description().to_lowercase().contains(needle)
        });
        project_ok && assignee_ok && priority_ok && search_ok
    }
}

/// Partitions `tasks` into one column per status, in board order.
///
/// Members keep their relative order from the task list, which is the order
/// left by the last move or reorder.
#[must_use]
pub fn columns_view(tasks: &[Task], limits: &WipLimits, filter: &TaskFilter) -> Vec<KanbanColumn> {
    TaskStatus::ALL
        .iter()
        .map(|status| {
            let members = tasks
                .iter()
                .filter(|task| task.status() == *status && filter.matches(task))
                .cloned()
                .collect();
            KanbanColumn::new(*status, members, limits.limit_for(*status))
        })
        .collect()
}

/// Aggregate read-only metrics for the board.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoardStats {
    /// Number of tasks on the board.
    pub total_tasks: usize,
    /// Tasks in `done`.
    pub completed_tasks: usize,
    /// Tasks in `in-progress`.
    pub in_progress_tasks: usize,
    /// Sum of every task's logged hours.
    pub total_logged_hours: f64,
    /// Hours of entries whose work started on the current local day.
    pub today_hours: f64,
    /// Logged hours over estimated hours; zero without estimates.
    pub efficiency: f64,
}

impl BoardStats {
    /// Efficiency as a percentage, as shown on the dashboard.
    #[must_use]
    pub fn efficiency_percent(&self) -> f64 {
        self.efficiency * 100.0
    }
}

/// Computes board statistics as of `now`.
///
/// The current day is `now`'s calendar day in `now`'s own offset, and entry
/// start instants are read in that offset before they are compared with it.
#[must_use]
pub fn board_stats(tasks: &[Task], entries: &[TimeEntry], now: DateTime<FixedOffset>) -> BoardStats {
    let count = |status: TaskStatus| tasks.iter().filter(|task| task.status() == status).count();
    let offset = now.offset();
    let today = now.date_naive();
    let total_logged_hours = total_hours(tasks.iter().map(Task::logged_hours));
    let total_estimated = total_hours(tasks.iter().map(Task::estimated_hours));
    let today_hours = total_hours(
        entries
            .iter()
            .filter(|entry| entry.started_at().with_timezone(offset).date_naive() == today)
            .map(TimeEntry::hours),
    );
    let efficiency = if total_estimated > 0.0 {
        total_logged_hours / total_estimated
    } else {
        0.0
    };

    BoardStats {
        total_tasks: tasks.len(),
        completed_tasks: count(TaskStatus::Done),
        in_progress_tasks: count(TaskStatus::InProgress),
        total_logged_hours,
        today_hours,
        efficiency,
    }
}
