//! Timer session state and elapsed-time arithmetic.

use super::{SessionId, UserId};
use crate::board::domain::TaskId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// The live (running or paused) timer for one task.
///
/// Elapsed time is derived from wall-clock instants: `accumulated_ms` holds
/// the total of finished running segments and `resumed_at` marks the start of
/// the segment in flight. Paused wall-clock time is never counted, and
/// elapsed time keeps accruing while the process is not running.
///
/// Documents written by the dashboard carry neither field. A running one
/// counts from `start_time`; a paused one is settled by
/// [`TimerSession::settle_legacy`] when it is first read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    id: SessionId,
    task_id: TaskId,
    user_id: UserId,
    start_time: DateTime<Utc>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    is_active: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accumulated_ms: Option<i64>,
    #[serde(default)]
    resumed_at: Option<DateTime<Utc>>,
}

impl TimerSession {
    /// Starts a running session at `now`.
    #[must_use]
    pub fn start(
        task_id: TaskId,
        user_id: UserId,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            task_id,
            user_id,
            start_time: now,
            end_time: None,
            is_active: true,
            description,
            accumulated_ms: Some(0),
            resumed_at: Some(now),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the tracked task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the tracking user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the instant the session was started.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns the instant the session was finished, if it has been.
    #[must_use]
    pub const fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns `true` while time is accruing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the session note, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Start of the running segment; sessions persisted without a segment
    /// anchor count from `start_time`.
    fn running_since(&self) -> Option<DateTime<Utc>> {
        if self.is_active {
            Some(self.resumed_at.unwrap_or(self.start_time))
        } else {
            None
        }
    }

    /// Active time accrued up to `now`, excluding paused intervals.
    ///
    /// A clock that moved backwards contributes nothing rather than a
    /// negative segment.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> TimeDelta {
        let accumulated = TimeDelta::milliseconds(self.accumulated_ms.unwrap_or(0).max(0));
        let running = self
            .running_since()
            .map_or_else(TimeDelta::zero, |since| (now - since).max(TimeDelta::zero()));
        accumulated + running
    }

    /// Freezes elapsed time at `now`. Returns `false` when already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.accumulated_ms = Some(self.elapsed_at(now).num_milliseconds());
        self.is_active = false;
        self.resumed_at = None;
        true
    }

    /// Opens a new running segment at `now`. Returns `false` when already
    /// running.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active {
            return false;
        }
        self.is_active = true;
        self.resumed_at = Some(now);
        true
    }

    /// Finalizes the session at `now`, returning the total active time.
    pub fn finish(&mut self, now: DateTime<Utc>) -> TimeDelta {
        let elapsed = self.elapsed_at(now);
        self.accumulated_ms = Some(elapsed.num_milliseconds());
        self.is_active = false;
        self.resumed_at = None;
        self.end_time = Some(now);
        elapsed
    }

    /// Gives a dashboard-written session explicit accounting fields.
    ///
    /// The dashboard never recorded when a session was paused, so a paused
    /// document is credited with the time from `start_time` (or up to
    /// `end_time` when present) to `now`, and frozen there. Returns `false`
    /// when the session already carries its accounting.
    pub(crate) fn settle_legacy(&mut self, now: DateTime<Utc>) -> bool {
        if self.accumulated_ms.is_some() {
            return false;
        }
        if self.is_active {
            self.accumulated_ms = Some(0);
            self.resumed_at = Some(self.resumed_at.unwrap_or(self.start_time));
        } else {
            let until = self.end_time.unwrap_or(now);
            let credited = (until - self.start_time).max(TimeDelta::zero());
            self.accumulated_ms = Some(credited.num_milliseconds());
        }
        true
    }
}
