//! Timer session lifecycle: start, pause, resume, stop and restore.

use crate::board::domain::TaskId;
use crate::notify::{ElapsedTick, EventHub};
use crate::persistence::ports::{
    KeyValueStore, PersistenceError, PersistenceResult, load_json, save_json,
};
use crate::tracking::domain::{TimeEntry, TimerSession, UserId};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::ticker::SessionSlot;
use super::{ElapsedTicker, TimeEntryRecorder, TrackingError, TrackingResult};

/// A session stopped as one step of a larger transition, together with the
/// entry the stop recorded. Handing it back to
/// [`TimerSessionManager::reinstate`] undoes the stop.
#[derive(Debug)]
pub(crate) struct StoppedSession {
    session: TimerSession,
    entry: TimeEntry,
}

impl StoppedSession {
    pub(crate) const fn entry(&self) -> &TimeEntry {
        &self.entry
    }

    pub(crate) fn into_entry(self) -> TimeEntry {
        self.entry
    }
}

/// Owns the single live timer session.
///
/// Every transition is written through to the store before it becomes
/// visible in memory, so a failed write leaves both sides on the last
/// committed state.
pub struct TimerSessionManager<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    slot: SessionSlot,
    store: Arc<S>,
    clock: Arc<C>,
    recorder: TimeEntryRecorder<S, C>,
    events: EventHub,
    ticker: ElapsedTicker,
    key: String,
}

impl<S, C> TimerSessionManager<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync + 'static,
{
    /// Restores the session persisted under `key`, resuming ticks when it was
    /// running. Elapsed time accrued while the process was down is counted.
    ///
    /// A session document that cannot be decoded is discarded. A paused
    /// session written without accounting fields is settled and rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the store cannot be read,
    /// or when a corrupt document cannot be removed.
    pub fn restore(
        store: Arc<S>,
        clock: Arc<C>,
        recorder: TimeEntryRecorder<S, C>,
        events: EventHub,
        key: impl Into<String>,
        tick_period: Duration,
    ) -> TrackingResult<Self> {
        let storage_key = key.into();
        let session = match load_json::<TimerSession, _>(&*store, &storage_key) {
            Ok(session) => session,
            Err(err) if err.is_codec() => {
                warn!(key = %storage_key, error = %err, "discarding unreadable timer session");
                store.remove(&storage_key)?;
                None
            }
            Err(err) => return Err(err.into()),
        };
        let session = match session {
            Some(mut legacy) => {
                if legacy.settle_legacy(clock.utc()) {
                    save_json(&*store, &storage_key, &legacy)?;
                    debug!(session = %legacy.id(), "settled timer session accounting");
                }
                Some(legacy)
            }
            None => None,
        };

        let manager = Self {
            slot: Arc::new(Mutex::new(session.clone())),
            store,
            clock,
            recorder,
            events,
            ticker: ElapsedTicker::new(tick_period),
            key: storage_key,
        };
        if let Some(live) = session {
            info!(
                session = %live.id(),
                task = %live.task_id(),
                running = live.is_active(),
                "restored timer session"
            );
            if live.is_active() {
                manager.schedule_ticks(&live);
            }
        }
        Ok(manager)
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Option<TimerSession>>> {
        self.slot.lock().map_err(PersistenceError::unavailable)
    }

    fn schedule_ticks(&self, session: &TimerSession) {
        self.ticker.schedule(
            session.id().clone(),
            Arc::clone(&self.slot),
            Arc::clone(&self.clock),
            self.events.clone(),
        );
    }

    /// Returns the recorder that finished sessions are written to.
    #[must_use]
    pub const fn recorder(&self) -> &TimeEntryRecorder<S, C> {
        &self.recorder
    }

    /// Returns the tick scheduler.
    #[must_use]
    pub const fn ticker(&self) -> &ElapsedTicker {
        &self.ticker
    }

    /// Returns a copy of the live session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the state lock is
    /// poisoned.
    pub fn current_session(&self) -> TrackingResult<Option<TimerSession>> {
        Ok(self.lock()?.clone())
    }

    /// Returns the task tracked by the live session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the state lock is
    /// poisoned.
    pub fn tracked_task(&self) -> TrackingResult<Option<TaskId>> {
        Ok(self.lock()?.as_ref().map(|session| session.task_id().clone()))
    }

    /// Active time of the live session at this instant; zero without one.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the state lock is
    /// poisoned.
    pub fn current_elapsed(&self) -> TrackingResult<TimeDelta> {
        let now = self.clock.utc();
        Ok(self
            .lock()?
            .as_ref()
            .map_or_else(TimeDelta::zero, |session| session.elapsed_at(now)))
    }

    /// Starts tracking `task_id` for `user_id`.
    ///
    /// A session that is already live is stopped and recorded first, so
    /// starting never discards tracked time.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Domain`] for a blank user,
    /// [`TrackingError::TaskNotFound`] for an unknown task, or
    /// [`TrackingError::Persistence`] when a write fails.
    pub fn start(&self, task_id: &TaskId, user_id: &str) -> TrackingResult<TimerSession> {
        self.start_with_note(task_id, user_id, None)
    }

    /// Starts tracking with a note that becomes the recorded entry's
    /// description.
    ///
    /// When the new session cannot be written, a session stopped on the way
    /// is put back and its entry withdrawn.
    ///
    /// # Errors
    ///
    /// See [`Self::start`].
    pub fn start_with_note(
        &self,
        task_id: &TaskId,
        user_id: &str,
        description: Option<String>,
    ) -> TrackingResult<TimerSession> {
        let user = UserId::new(user_id)?;
        if self.recorder.book().find(task_id)?.is_none() {
            return Err(TrackingError::TaskNotFound(task_id.clone()));
        }

        let mut slot = self.lock()?;
        let previous = self.stop_locked(&mut slot)?;
        if let Some(stopped) = previous.as_ref() {
            info!(entry = %stopped.entry().id(), "finalized previous session before starting a new one");
        }
        let session = TimerSession::start(task_id.clone(), user, description, self.clock.utc());
        if let Err(err) = save_json(&*self.store, &self.key, &session) {
            if let Some(stopped) = previous {
                self.undo_stop(&mut slot, stopped);
            }
            return Err(err.into());
        }
        *slot = Some(session.clone());
        self.recorder.close_amend_window()?;
        self.events.publish_session(Some(&session));
        self.schedule_ticks(&session);
        info!(session = %session.id(), task = %task_id, "timer started");
        Ok(session)
    }

    /// Pauses the running session, freezing its elapsed time.
    ///
    /// Returns `false` without a live session or when already paused.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the write fails; the
    /// session keeps running in that case.
    pub fn pause(&self) -> TrackingResult<bool> {
        let mut slot = self.lock()?;
        let Some(live) = slot.as_ref() else {
            debug!("pause ignored: no live session");
            return Ok(false);
        };
        let mut paused = live.clone();
        if !paused.pause(self.clock.utc()) {
            debug!(session = %paused.id(), "pause ignored: already paused");
            return Ok(false);
        }
        save_json(&*self.store, &self.key, &paused)?;
        self.ticker.cancel();
        self.events.publish_session(Some(&paused));
        info!(session = %paused.id(), elapsed_ms = paused.elapsed_at(self.clock.utc()).num_milliseconds(), "timer paused");
        *slot = Some(paused);
        Ok(true)
    }

    /// Resumes a paused session; elapsed time continues from the frozen
    /// value.
    ///
    /// Returns `false` without a live session or when already running.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the write fails; the
    /// session stays paused in that case.
    pub fn resume(&self) -> TrackingResult<bool> {
        let mut slot = self.lock()?;
        let Some(live) = slot.as_ref() else {
            debug!("resume ignored: no live session");
            return Ok(false);
        };
        let mut resumed = live.clone();
        if !resumed.resume(self.clock.utc()) {
            debug!(session = %resumed.id(), "resume ignored: already running");
            return Ok(false);
        }
        save_json(&*self.store, &self.key, &resumed)?;
        *slot = Some(resumed.clone());
        self.events.publish_session(Some(&resumed));
        self.schedule_ticks(&resumed);
        info!(session = %resumed.id(), "timer resumed");
        Ok(true)
    }

    /// Stops the live session and records its active time as a time entry.
    ///
    /// Returns `None` without a live session. A paused session is recorded
    /// with the time accrued before the pause.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the entry or the session
    /// removal cannot be written; the session stays live and no entry is
    /// kept in that case.
    pub fn stop(&self) -> TrackingResult<Option<TimeEntry>> {
        let mut slot = self.lock()?;
        Ok(self.stop_locked(&mut slot)?.map(StoppedSession::into_entry))
    }

    /// Stops the live session only when it tracks `task_id`.
    pub(crate) fn stop_tracking(&self, task_id: &TaskId) -> TrackingResult<Option<StoppedSession>> {
        let mut slot = self.lock()?;
        if slot.as_ref().map(TimerSession::task_id) != Some(task_id) {
            return Ok(None);
        }
        self.stop_locked(&mut slot)
    }

    /// Undoes a stop whose enclosing transition failed: the session is live
    /// again, exactly as it was, and its entry is withdrawn.
    ///
    /// Nothing is restored when another session went live in the meantime.
    pub(crate) fn reinstate(&self, stopped: StoppedSession) -> TrackingResult<()> {
        let mut slot = self.lock()?;
        self.reinstate_locked(&mut slot, stopped)
    }

    fn stop_locked(&self, slot: &mut Option<TimerSession>) -> TrackingResult<Option<StoppedSession>> {
        let Some(live) = slot.clone() else {
            debug!("stop ignored: no live session");
            return Ok(None);
        };
        let mut finished = live.clone();
        let elapsed = finished.finish(self.clock.utc());
        let entry = self.recorder.record_session(&finished, elapsed)?;

        if let Err(err) = self.store.remove(&self.key) {
            warn!(session = %finished.id(), error = %err, "timer session removal failed; retracting entry");
            if let Err(retract_err) = self.recorder.retract(entry.id()) {
                error!(entry = %entry.id(), error = %retract_err, "failed to retract time entry");
            }
            return Err(err.into());
        }

        *slot = None;
        self.ticker.cancel();
        self.events.publish_session(None);
        info!(
            session = %finished.id(),
            task = %finished.task_id(),
            entry = %entry.id(),
            hours = entry.hours(),
            "timer stopped"
        );
        Ok(Some(StoppedSession {
            session: live,
            entry,
        }))
    }

    fn reinstate_locked(
        &self,
        slot: &mut Option<TimerSession>,
        stopped: StoppedSession,
    ) -> TrackingResult<()> {
        let StoppedSession { session, entry } = stopped;
        if let Some(current) = slot.as_ref() {
            warn!(
                session = %session.id(),
                current = %current.id(),
                "stopped session not restored: another session is live"
            );
            return Ok(());
        }
        save_json(&*self.store, &self.key, &session)?;
        if let Err(err) = self.recorder.retract(entry.id()) {
            if let Err(remove_err) = self.store.remove(&self.key) {
                error!(session = %session.id(), error = %remove_err, "failed to remove restored timer session");
            }
            return Err(err);
        }

        *slot = Some(session.clone());
        self.events.publish_session(Some(&session));
        if session.is_active() {
            self.schedule_ticks(&session);
        }
        info!(session = %session.id(), entry = %entry.id(), "timer stop undone");
        Ok(())
    }

    fn undo_stop(&self, slot: &mut Option<TimerSession>, stopped: StoppedSession) {
        let entry_id = stopped.entry().id().clone();
        if let Err(err) = self.reinstate_locked(slot, stopped) {
            error!(entry = %entry_id, error = %err, "failed to undo timer stop");
        }
    }

    /// Publishes an elapsed-time reading for the running session now.
    ///
    /// Returns `None` (and publishes nothing) when no session is running.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Persistence`] when the state lock is
    /// poisoned.
    pub fn tick(&self) -> TrackingResult<Option<ElapsedTick>> {
        let slot = self.lock()?;
        let reading = slot
            .as_ref()
            .filter(|session| session.is_active())
            .map(|session| ElapsedTick::read(session, self.clock.utc()));
        if let Some(tick) = reading.as_ref() {
            self.events.publish_tick(tick.clone());
        }
        Ok(reading)
    }
}
