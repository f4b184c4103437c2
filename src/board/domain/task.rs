//! Task aggregate and its creation/edit payloads.

use super::{BoardDomainError, Priority, TaskId, TaskStatus};
use crate::tracking::domain::TimeEntryId;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A unit of work tracked on the board.
///
/// `status` and `updated_at` only change through the workflow engine;
/// `logged_hours` is a cache of the summed hours of the task's time entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: String,
    status: TaskStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    project: String,
    #[serde(default)]
    assignee: String,
    #[serde(default)]
    estimated_hours: f64,
    #[serde(default)]
    logged_hours: f64,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    time_entries: Vec<TimeEntryId>,
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    title: String,
    description: String,
    priority: Priority,
    project: String,
    assignee: String,
    estimated_hours: f64,
    due_date: Option<NaiveDate>,
    tags: Vec<String>,
}

impl NewTask {
    /// Creates a payload with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            project: String::new(),
            assignee: String::new(),
            estimated_hours: 0.0,
            due_date: None,
            tags: Vec::new(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the task priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the owning project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    /// Sets the estimate in hours.
    #[must_use]
    pub const fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the task tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }
}

/// Partial edit of a task's descriptive fields. Status is not editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    project: Option<String>,
    assignee: Option<String>,
    estimated_hours: Option<f64>,
    due_date: Option<Option<NaiveDate>>,
    tags: Option<Vec<String>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the project.
    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Replaces the assignee.
    #[must_use]
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Replaces the estimate in hours.
    #[must_use]
    pub const fn estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Replaces or clears the due date.
    #[must_use]
    pub const fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Replaces the tags.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }
}

fn validated_title(title: &str) -> Result<String, BoardDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(BoardDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

fn validated_estimate(hours: f64) -> Result<f64, BoardDomainError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(BoardDomainError::InvalidEstimate(hours));
    }
    Ok(hours)
}

impl Task {
    /// Creates a `todo` task from a validated payload.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTitle`] for a blank title or
    /// [`BoardDomainError::InvalidEstimate`] for a negative or non-finite
    /// estimate.
    pub fn new(payload: NewTask, clock: &impl Clock) -> Result<Self, BoardDomainError> {
        let title = validated_title(&payload.title)?;
        let estimated_hours = validated_estimate(payload.estimated_hours)?;
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            title,
            description: payload.description,
            status: TaskStatus::Todo,
            priority: payload.priority,
            project: payload.project,
            assignee: payload.assignee,
            estimated_hours,
            logged_hours: 0.0,
            due_date: payload.due_date,
            tags: payload.tags,
            created_at: timestamp,
            updated_at: timestamp,
            time_entries: Vec::new(),
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the owning project.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the assignee.
    #[must_use]
    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    /// Returns the estimate in hours.
    #[must_use]
    pub const fn estimated_hours(&self) -> f64 {
        self.estimated_hours
    }

    /// Returns the cached sum of logged hours.
    #[must_use]
    pub const fn logged_hours(&self) -> f64 {
        self.logged_hours
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest workflow timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the ordered references to the task's time entries.
    #[must_use]
    pub fn time_entries(&self) -> &[TimeEntryId] {
        &self.time_entries
    }

    /// Logged hours as a percentage of the estimate; zero without an estimate.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.estimated_hours > 0.0 {
            self.logged_hours / self.estimated_hours * 100.0
        } else {
            0.0
        }
    }

    /// Returns `true` when the due date has passed and the task is not done.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_done() && self.due_date.is_some_and(|due| today > due)
    }

    /// Applies a descriptive edit, validating every replaced field first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError`] when the patched title or estimate is
    /// invalid; the task is left unchanged in that case.
    pub fn apply_patch(
        &mut self,
        patch: TaskPatch,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let title = patch.title.as_deref().map(validated_title).transpose()?;
        let estimate = patch.estimated_hours.map(validated_estimate).transpose()?;

        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = estimate {
            self.estimated_hours = value;
        }
        if let Some(value) = patch.description {
            self.description = value;
        }
        if let Some(value) = patch.priority {
            self.priority = value;
        }
        if let Some(value) = patch.project {
            self.project = value;
        }
        if let Some(value) = patch.assignee {
            self.assignee = value;
        }
        if let Some(value) = patch.due_date {
            self.due_date = value;
        }
        if let Some(value) = patch.tags {
            self.tags = value;
        }
        self.touch(clock);
        Ok(())
    }

    /// Moves the task to `status` and stamps `updated_at`.
    pub(crate) fn transition_to(&mut self, status: TaskStatus, clock: &impl Clock) {
        self.status = status;
        self.touch(clock);
    }

    /// Attaches a time entry reference and refreshes the logged-hours cache.
    pub(crate) fn attach_entry(&mut self, entry_id: TimeEntryId, logged_hours: f64) {
        if !self.time_entries.contains(&entry_id) {
            self.time_entries.push(entry_id);
        }
        self.logged_hours = logged_hours;
    }

    /// Detaches a time entry reference and refreshes the logged-hours cache.
    pub(crate) fn detach_entry(&mut self, entry_id: &TimeEntryId, logged_hours: f64) {
        self.time_entries.retain(|id| id != entry_id);
        self.logged_hours = logged_hours;
    }

    /// Replaces the logged-hours cache.
    pub(crate) const fn set_logged_hours(&mut self, logged_hours: f64) {
        self.logged_hours = logged_hours;
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
