//! Change notifications for the presentation layer.
//!
//! Each stream is a `tokio::sync::broadcast` channel: subscribing returns a
//! receiver and dropping it unsubscribes. Events on one subscription arrive in
//! publication order; a receiver that falls more than the channel capacity
//! behind observes `RecvError::Lagged` and resumes with the newest events.

use crate::board::domain::{Task, TaskId};
use crate::tracking::domain::{SessionId, TimerSession};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of buffered events per stream.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Periodic elapsed-time reading for the running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElapsedTick {
    /// Session the reading belongs to.
    pub session_id: SessionId,
    /// Task being tracked.
    pub task_id: TaskId,
    /// Active time accrued so far.
    pub elapsed: TimeDelta,
    /// Instant the reading was taken.
    pub at: DateTime<Utc>,
}

impl ElapsedTick {
    /// Reads the session's elapsed time at `now`.
    #[must_use]
    pub fn read(session: &TimerSession, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id().clone(),
            task_id: session.task_id().clone(),
            elapsed: session.elapsed_at(now),
            at: now,
        }
    }
}

/// Fan-out hub for timer-session, task-list and tick notifications.
#[derive(Debug, Clone)]
pub struct EventHub {
    sessions: broadcast::Sender<Option<TimerSession>>,
    tasks: broadcast::Sender<Arc<[Task]>>,
    ticks: broadcast::Sender<ElapsedTick>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventHub {
    /// Creates a hub buffering up to `capacity` events per stream.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let bounded = capacity.max(1);
        let (sessions, _) = broadcast::channel(bounded);
        let (tasks, _) = broadcast::channel(bounded);
        let (ticks, _) = broadcast::channel(bounded);
        Self {
            sessions,
            tasks,
            ticks,
        }
    }

    /// Subscribes to timer-session changes; `None` means no live session.
    #[must_use]
    pub fn subscribe_sessions(&self) -> broadcast::Receiver<Option<TimerSession>> {
        self.sessions.subscribe()
    }

    /// Subscribes to task-list snapshots, published after every committed
    /// task mutation.
    #[must_use]
    pub fn subscribe_tasks(&self) -> broadcast::Receiver<Arc<[Task]>> {
        self.tasks.subscribe()
    }

    /// Subscribes to elapsed-time ticks of the running session.
    #[must_use]
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<ElapsedTick> {
        self.ticks.subscribe()
    }

    pub(crate) fn publish_session(&self, session: Option<&TimerSession>) {
        if self.sessions.receiver_count() == 0 {
            return;
        }
        if self.sessions.send(session.cloned()).is_err() {
            tracing::trace!("session subscribers left before delivery");
        }
    }

    pub(crate) fn publish_tasks(&self, tasks: &[Task]) {
        if self.tasks.receiver_count() == 0 {
            return;
        }
        if self.tasks.send(Arc::from(tasks)).is_err() {
            tracing::trace!("task subscribers left before delivery");
        }
    }

    pub(crate) fn publish_tick(&self, tick: ElapsedTick) {
        if self.ticks.receiver_count() == 0 {
            return;
        }
        if self.ticks.send(tick).is_err() {
            tracing::trace!("tick subscribers left before delivery");
        }
    }
}
