//! Immutable time entries and the payloads that create or amend them.

use super::{SessionId, TimeEntryId, TimerSession, TrackingDomainError, UserId};
use crate::board::domain::TaskId;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Converts an active duration into decimal hours.
#[must_use]
pub fn hours_from(elapsed: TimeDelta) -> f64 {
    #[expect(
        clippy::cast_precision_loss,
        reason = "durations above 2^53 ms are far outside any tracked session"
    )]
    let millis = elapsed.num_milliseconds().max(0) as f64;
    millis / MILLIS_PER_HOUR
}

/// How a time entry was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntrySource {
    /// Recorded when a timer session was stopped.
    Timer {
        /// Session the entry was derived from.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// Entered directly by the user.
    Manual,
}

/// A finalized record of hours worked on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    id: TimeEntryId,
    task_id: TaskId,
    user_id: UserId,
    #[serde(default)]
    project_id: String,
    hours: f64,
    description: String,
    entry_date: NaiveDate,
    started_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    source: EntrySource,
}

/// Payload for recording a manual time entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntryInput {
    task_id: TaskId,
    user_id: String,
    hours: f64,
    description: String,
    started_at: Option<DateTime<Utc>>,
}

impl TimeEntryInput {
    /// Creates a payload with the required fields.
    #[must_use]
    pub fn new(
        task_id: &TaskId,
        user_id: impl Into<String>,
        hours: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.clone(),
            user_id: user_id.into(),
            hours,
            description: description.into(),
            started_at: None,
        }
    }

    /// Sets when the work started; defaults to the recording instant.
    #[must_use]
    pub const fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Returns the task the entry is for.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }
}

/// Correction applied to the entry produced by the most recent timer stop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryAmendment {
    description: Option<String>,
    hours: Option<f64>,
}

impl EntryAmendment {
    /// Creates an empty amendment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the recorded hours.
    #[must_use]
    pub const fn hours(mut self, hours: f64) -> Self {
        self.hours = Some(hours);
        self
    }
}

fn validated_hours(hours: f64) -> Result<f64, TrackingDomainError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(TrackingDomainError::InvalidHours(hours));
    }
    Ok(hours)
}

impl TimeEntry {
    /// Builds a manual entry from validated input.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError`] when hours are not positive, the user
    /// is blank, or the description is blank.
    pub fn manual(
        input: TimeEntryInput,
        project_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, TrackingDomainError> {
        let hours = validated_hours(input.hours)?;
        let user_id = UserId::new(input.user_id)?;
        let description = input.description.trim().to_owned();
        if description.is_empty() {
            return Err(TrackingDomainError::EmptyDescription);
        }
        let started_at = input.started_at.unwrap_or(now);

        Ok(Self {
            id: TimeEntryId::new(),
            task_id: input.task_id,
            user_id,
            project_id: project_id.into(),
            hours,
            description,
            entry_date: started_at.date_naive(),
            started_at,
            created_at: now,
            source: EntrySource::Manual,
        })
    }

    /// Builds the entry for a finished timer session.
    ///
    /// `hours` is the session's active time; a zero-length session yields a
    /// zero-hour entry.
    #[must_use]
    pub fn from_session(
        session: &TimerSession,
        elapsed: TimeDelta,
        project_id: impl Into<String>,
        default_description: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let description = session
            .description()
            .map_or_else(|| default_description.to_owned(), str::to_owned);

        Self {
            id: TimeEntryId::new(),
            task_id: session.task_id().clone(),
            user_id: session.user_id().clone(),
            project_id: project_id.into(),
            hours: hours_from(elapsed),
            description,
            entry_date: session.start_time().date_naive(),
            started_at: session.start_time(),
            created_at: now,
            source: EntrySource::Timer {
                session_id: session.id().clone(),
            },
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> &TimeEntryId {
        &self.id
    }

    /// Returns the task the hours were logged against.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the user who logged the hours.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the project copied from the task at record time.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the logged hours.
    #[must_use]
    pub const fn hours(&self) -> f64 {
        self.hours
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the calendar day (UTC) the work started on.
    #[must_use]
    pub const fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    /// Returns when the work started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the entry was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns how the entry was produced.
    #[must_use]
    pub const fn source(&self) -> &EntrySource {
        &self.source
    }

    /// Applies a correction. Hours, when given, must be positive.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError::InvalidHours`] for non-positive hours;
    /// the entry is left unchanged in that case.
    pub fn amend(&mut self, amendment: EntryAmendment) -> Result<(), TrackingDomainError> {
        let hours = amendment.hours.map(validated_hours).transpose()?;
        if let Some(value) = hours {
            self.hours = value;
        }
        if let Some(value) = amendment.description {
            self.description = value;
        }
        Ok(())
    }
}
