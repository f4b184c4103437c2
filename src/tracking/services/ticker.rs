//! Periodic elapsed-time publication for the running session.

use crate::notify::{ElapsedTick, EventHub};
use crate::tracking::domain::{SessionId, TimerSession};
use mockable::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Shared slot holding the live timer session.
pub(crate) type SessionSlot = Arc<Mutex<Option<TimerSession>>>;

/// Publishes a tick for `session_id` if it is still the live, running
/// session. Returns `false` once the session is paused, stopped or replaced.
///
/// The reading is published while the slot is locked, so a pause or stop
/// that has returned can never be followed by a tick.
pub(crate) fn emit_tick<C>(
    slot: &SessionSlot,
    session_id: &SessionId,
    clock: &C,
    events: &EventHub,
) -> bool
where
    C: Clock + ?Sized,
{
    let Ok(guard) = slot.lock() else {
        return false;
    };
    match guard.as_ref() {
        Some(session) if session.id() == session_id && session.is_active() => {
            events.publish_tick(ElapsedTick::read(session, clock.utc()));
            true
        }
        _ => false,
    }
}

/// Cancellable interval task recomputing elapsed time from timestamps.
///
/// Ticks are readings, not an accumulator: a missed or late tick never
/// changes the recorded duration.
#[derive(Debug)]
pub struct ElapsedTicker {
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ElapsedTicker {
    /// Creates an idle ticker firing every `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            handle: Mutex::new(None),
        }
    }

    /// Returns the tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` while an interval task is scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.handle
            .lock()
            .is_ok_and(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
    }

    /// Replaces any scheduled task with one ticking for `session_id`.
    ///
    /// Without a tokio runtime nothing is scheduled; readings are then only
    /// published through [`super::TimerSessionManager::tick`].
    pub(crate) fn schedule<C>(
        &self,
        session_id: SessionId,
        slot: SessionSlot,
        clock: Arc<C>,
        events: EventHub,
    ) where
        C: Clock + Send + Sync + 'static,
    {
        self.cancel();
        let Ok(runtime) = Handle::try_current() else {
            debug!(session = %session_id, "no async runtime; ticks are published on demand only");
            return;
        };
        let period = self.period;
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !emit_tick(&slot, &session_id, &*clock, &events) {
                    debug!(session = %session_id, "ticker stopped: session no longer running");
                    break;
                }
            }
        });
        if let Ok(mut handle) = self.handle.lock() {
            *handle = Some(task);
        } else {
            task.abort();
        }
    }

    /// De-schedules the interval task, if any.
    pub(crate) fn cancel(&self) {
        let scheduled = self.handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(task) = scheduled {
            task.abort();
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
