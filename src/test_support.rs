//! Shared fixtures for unit tests: a hand-driven clock and a store whose
//! writes can be made to fail.

use crate::config::WorkboardConfig;
use crate::persistence::adapters::InMemoryStore;
use crate::persistence::ports::{KeyValueStore, PersistenceError, PersistenceResult};
use crate::workboard::Workboard;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use mockall::mock;
use serde_json::Value;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub(crate) fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub(crate) fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock");
        *now += delta;
    }

    pub(crate) fn advance_secs(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0)
                .single()
                .expect("valid start instant"),
        )
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

mock! {
    pub Store {}

    impl KeyValueStore for Store {
        fn get(&self, key: &str) -> PersistenceResult<Option<Value>>;
        fn set(&self, key: &str, value: &Value) -> PersistenceResult<()>;
        fn remove(&self, key: &str) -> PersistenceResult<()>;
    }
}

/// Switch shared between a test and the store built by [`failing_store`].
#[derive(Debug, Clone, Default)]
pub(crate) struct FailSwitch {
    writes: Arc<AtomicBool>,
    removes: Arc<AtomicBool>,
    countdown: Arc<AtomicUsize>,
}

impl FailSwitch {
    pub(crate) fn fail_writes(&self, enabled: bool) {
        self.writes.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn fail_removes(&self, enabled: bool) {
        self.removes.store(enabled, Ordering::SeqCst);
    }

    /// Rejects only the `nth` write from now on, counting from one.
    pub(crate) fn fail_nth_write(&self, nth: usize) {
        self.countdown.store(nth, Ordering::SeqCst);
    }

    fn rejects_write(&self) -> bool {
        let counted = self
            .countdown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        self.writes.load(Ordering::SeqCst) || counted == Ok(1)
    }
}

/// Mock store delegating to `backing` until the switch rejects writes or
/// removals.
pub(crate) fn failing_store(backing: &InMemoryStore, switch: &FailSwitch) -> MockStore {
    let mut store = MockStore::new();

    let reader = backing.clone();
    store.expect_get().returning(move |key| reader.get(key));

    let writer = backing.clone();
    let writes = switch.clone();
    store.expect_set().returning(move |key, value| {
        if writes.rejects_write() {
            return Err(PersistenceError::write(key, io::Error::other("disk full")));
        }
        writer.set(key, value)
    });

    let remover = backing.clone();
    let removes = Arc::clone(&switch.removes);
    store.expect_remove().returning(move |key| {
        if removes.load(Ordering::SeqCst) {
            return Err(PersistenceError::remove(key, io::Error::other("disk full")));
        }
        remover.remove(key)
    });

    store
}

pub(crate) type TestBoard = Workboard<InMemoryStore, ManualClock>;

/// Opens a board with default configuration over `store`, sharing `clock`.
pub(crate) fn open_board(store: &InMemoryStore, clock: &ManualClock) -> TestBoard {
    Workboard::open(
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
        WorkboardConfig::default(),
    )
    .expect("board should open")
}

/// Opens a board over a store whose failures are controlled by `switch`.
pub(crate) fn open_failing_board(
    backing: &InMemoryStore,
    switch: &FailSwitch,
    clock: &ManualClock,
) -> Workboard<MockStore, ManualClock> {
    Workboard::open(
        Arc::new(failing_store(backing, switch)),
        Arc::new(clock.clone()),
        WorkboardConfig::default(),
    )
    .expect("board should open")
}
