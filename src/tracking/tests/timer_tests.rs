//! Timer session manager: transitions, write-through and restart.

use crate::ErrorKind;
use crate::board::domain::{NewTask, Task, TaskId};
use crate::persistence::adapters::InMemoryStore;
use crate::persistence::ports::{KeyValueStore, load_json};
use crate::test_support::{FailSwitch, ManualClock, TestBoard, open_board, open_failing_board};
use crate::tracking::domain::TimerSession;
use crate::tracking::services::TrackingError;
use chrono::TimeDelta;
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;

const SESSION_KEY: &str = "projectflow_timer_session";

struct Harness {
    store: InMemoryStore,
    clock: ManualClock,
    board: TestBoard,
    task: Task,
}

#[fixture]
fn harness() -> Harness {
    let store = InMemoryStore::new();
    let clock = ManualClock::default();
    let board = open_board(&store, &clock);
    let task = board
        .workflow()
        .create_task(NewTask::new("tracked"))
        .expect("task creation should succeed");
    Harness {
        store,
        clock,
        board,
        task,
    }
}

fn stored_session(store: &InMemoryStore) -> Option<TimerSession> {
    load_json(store, SESSION_KEY).expect("session document readable")
}

#[rstest]
fn pause_and_resume_exclude_paused_time_from_entry(harness: Harness) {
    let timer = harness.board.timer();
    timer.start(harness.task.id(), "sam").expect("start");
    harness.clock.advance(TimeDelta::minutes(10));
    assert!(timer.pause().expect("pause"));
    harness.clock.advance(TimeDelta::minutes(60));
    assert!(timer.resume().expect("resume"));
    harness.clock.advance(TimeDelta::minutes(20));

    let entry = timer.stop().expect("stop").expect("entry recorded");

    assert!((entry.hours() - 0.5).abs() < 1e-9);
    assert_eq!(entry.description(), "Time recorded automatically");
    let task = harness
        .board
        .workflow()
        .task(harness.task.id())
        .expect("task");
    assert!((task.logged_hours() - 0.5).abs() < 1e-9);
}

#[rstest]
fn stop_without_session_records_nothing(harness: Harness) {
    let stopped = harness.board.timer().stop().expect("stop");

    assert!(stopped.is_none());
    assert!(harness.board.recorder().entries().expect("entries").is_empty());
}

#[rstest]
fn pause_twice_is_a_no_op(harness: Harness) {
    let timer = harness.board.timer();
    timer.start(harness.task.id(), "sam").expect("start");
    harness.clock.advance_secs(30);
    assert!(timer.pause().expect("first pause"));
    let paused = timer.current_session().expect("session");
    harness.clock.advance_secs(30);

    assert!(!timer.pause().expect("second pause"));
    assert_eq!(timer.current_session().expect("session"), paused);
    assert_eq!(timer.current_elapsed().expect("elapsed"), TimeDelta::seconds(30));
}

#[rstest]
fn resume_without_paused_session_is_a_no_op(harness: Harness) {
    let timer = harness.board.timer();
    assert!(!timer.resume().expect("resume without session"));
    timer.start(harness.task.id(), "sam").expect("start");
    assert!(!timer.resume().expect("resume while running"));
}

#[rstest]
fn start_writes_session_through_to_store(harness: Harness) {
    let session = harness
        .board
        .timer()
        .start_with_note(harness.task.id(), "sam", Some("pairing".to_owned()))
        .expect("start");

    let stored = stored_session(&harness.store).expect("session persisted");
    assert_eq!(stored, session);
    assert!(stored.is_active());
    assert_eq!(stored.description(), Some("pairing"));
}

#[rstest]
fn start_rejects_unknown_task_and_blank_user(harness: Harness) {
    let timer = harness.board.timer();

    let missing = timer
        .start(&TaskId::new(), "sam")
        .expect_err("unknown task");
    let blank = timer
        .start(harness.task.id(), "  ")
        .expect_err("blank user");

    assert!(matches!(missing, TrackingError::TaskNotFound(_)));
    assert_eq!(blank.kind(), ErrorKind::Validation);
    assert!(timer.current_session().expect("session").is_none());
}

#[rstest]
fn starting_again_records_the_live_session_first(harness: Harness) {
    let other = harness
        .board
        .workflow()
        .create_task(NewTask::new("next"))
        .expect("task creation should succeed");
    let timer = harness.board.timer();
    timer.start(harness.task.id(), "sam").expect("first start");
    harness.clock.advance(TimeDelta::minutes(6));

    timer.start(other.id(), "sam").expect("second start");

    let entries = harness.board.recorder().entries().expect("entries");
    assert_eq!(entries.len(), 1);
    assert!(entries
        .first()
        .is_some_and(|entry| entry.task_id() == harness.task.id()));
    assert_eq!(timer.tracked_task().expect("session"), Some(other.id().clone()));
}

#[rstest]
fn stop_of_paused_session_records_time_before_pause(harness: Harness) {
    let timer = harness.board.timer();
    timer.start(harness.task.id(), "sam").expect("start");
    harness.clock.advance(TimeDelta::minutes(12));
    timer.pause().expect("pause");
    harness.clock.advance(TimeDelta::hours(3));

    let entry = timer.stop().expect("stop").expect("entry");

    assert!((entry.hours() - 0.2).abs() < 1e-9);
    assert!(stored_session(&harness.store).is_none());
}

#[rstest]
fn zero_length_session_yields_zero_hour_entry(harness: Harness) {
    let timer = harness.board.timer();
    timer.start(harness.task.id(), "sam").expect("start");

    let entry = timer.stop().expect("stop").expect("entry");

    assert!(entry.hours().abs() < f64::EPSILON);
}

#[rstest]
fn restart_resumes_session_and_counts_downtime(harness: Harness) {
    harness
        .board
        .timer()
        .start(harness.task.id(), "sam")
        .expect("start");
    harness.clock.advance(TimeDelta::minutes(15));
    let Harness {
        store,
        clock,
        board,
        task,
    } = harness;
    drop(board);
    clock.advance(TimeDelta::minutes(15));

    let restarted = open_board(&store, &clock);

    let restored = restarted
        .timer()
        .current_session()
        .expect("session")
        .expect("session restored");
    assert!(restored.is_active());
    assert_eq!(
        restarted.timer().current_elapsed().expect("elapsed"),
        TimeDelta::minutes(30)
    );
    let entry = restarted.timer().stop().expect("stop").expect("entry");
    assert!((entry.hours() - 0.5).abs() < 1e-9);
    assert_eq!(entry.task_id(), task.id());
}

#[rstest]
fn paused_session_survives_restart_frozen(harness: Harness) {
    harness
        .board
        .timer()
        .start(harness.task.id(), "sam")
        .expect("start");
    harness.clock.advance(TimeDelta::minutes(8));
    harness.board.timer().pause().expect("pause");
    harness.clock.advance(TimeDelta::hours(1));

    let restarted = open_board(&harness.store, &harness.clock);

    assert_eq!(
        restarted.timer().current_elapsed().expect("elapsed"),
        TimeDelta::minutes(8)
    );
}

#[rstest]
fn paused_dashboard_session_is_settled_on_restore() {
    let store = InMemoryStore::new();
    let clock = ManualClock::default();
    let started = clock.utc() - TimeDelta::minutes(12);
    store
        .set(
            SESSION_KEY,
            &json!({
                "id": "lx3k9a7f2q",
                "taskId": "1",
                "userId": "sam",
                "startTime": started,
                "isActive": false
            }),
        )
        .expect("seed dashboard session");

    let board = open_board(&store, &clock);
    clock.advance(TimeDelta::hours(1));

    assert_eq!(
        board.timer().current_elapsed().expect("elapsed"),
        TimeDelta::minutes(12)
    );
    let stored = store
        .get(SESSION_KEY)
        .expect("read")
        .expect("session kept");
    assert_eq!(stored.get("accumulatedMs"), Some(&json!(720_000)));
}

#[rstest]
fn corrupt_session_document_is_discarded() {
    let store = InMemoryStore::new();
    let clock = ManualClock::default();
    store
        .set(SESSION_KEY, &json!({"taskId": 7, "isActive": "yes"}))
        .expect("seed corrupt session");

    let board = open_board(&store, &clock);

    assert!(board.timer().current_session().expect("session").is_none());
    assert_eq!(store.get(SESSION_KEY).expect("read"), None);
}

#[rstest]
fn failed_pause_write_keeps_session_running() {
    let backing = InMemoryStore::new();
    let switch = FailSwitch::default();
    let clock = ManualClock::default();
    let board = open_failing_board(&backing, &switch, &clock);
    let task = board
        .workflow()
        .create_task(NewTask::new("fragile"))
        .expect("task creation should succeed");
    board.timer().start(task.id(), "sam").expect("start");

    switch.fail_writes(true);
    let err = board.timer().pause().expect_err("write should fail");

    assert_eq!(err.kind(), ErrorKind::Persistence);
    let live = board
        .timer()
        .current_session()
        .expect("session")
        .expect("still live");
    assert!(live.is_active());
    assert!(stored_session(&backing).is_some_and(|stored| stored.is_active()));
}

#[rstest]
fn failed_session_removal_keeps_session_and_drops_entry() {
    let backing = InMemoryStore::new();
    let switch = FailSwitch::default();
    let clock = ManualClock::default();
    let board = open_failing_board(&backing, &switch, &clock);
    let task = board
        .workflow()
        .create_task(NewTask::new("fragile"))
        .expect("task creation should succeed");
    board.timer().start(task.id(), "sam").expect("start");
    clock.advance(TimeDelta::minutes(5));

    switch.fail_removes(true);
    let err = board.timer().stop().expect_err("removal should fail");

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(board.timer().current_session().expect("session").is_some());
    assert!(board.recorder().entries().expect("entries").is_empty());
    let cached = board.workflow().task(task.id()).expect("task");
    assert!(cached.logged_hours().abs() < f64::EPSILON);
    assert!(cached.time_entries().is_empty());
}

#[rstest]
fn tick_reads_elapsed_for_running_session_only(harness: Harness) {
    let timer = harness.board.timer();
    assert!(timer.tick().expect("tick").is_none());

    let session = timer.start(harness.task.id(), "sam").expect("start");
    harness.clock.advance_secs(5);
    let tick = timer.tick().expect("tick").expect("running session");
    assert_eq!(&tick.session_id, session.id());
    assert_eq!(tick.elapsed, TimeDelta::seconds(5));

    timer.pause().expect("pause");
    assert!(timer.tick().expect("tick").is_none());
}

#[rstest]
fn failed_start_while_live_keeps_previous_session() {
    let backing = InMemoryStore::new();
    let switch = FailSwitch::default();
    let clock = ManualClock::default();
    let board = open_failing_board(&backing, &switch, &clock);
    let workflow = board.workflow();
    let first = workflow
        .create_task(NewTask::new("first"))
        .expect("task creation should succeed");
    let second = workflow
        .create_task(NewTask::new("second"))
        .expect("task creation should succeed");
    let session = board.timer().start(first.id(), "sam").expect("start");
    clock.advance(TimeDelta::minutes(9));

    // Stopping the live session writes the entry log and the task list; the
    // third write is the new session.
    switch.fail_nth_write(3);
    let err = board
        .timer()
        .start(second.id(), "sam")
        .expect_err("session write should fail");

    assert_eq!(err.kind(), ErrorKind::Persistence);
    let live = board
        .timer()
        .current_session()
        .expect("session")
        .expect("previous session is live");
    assert_eq!(live.id(), session.id());
    assert_eq!(live.task_id(), first.id());
    assert_eq!(stored_session(&backing), Some(session));
    assert!(board.recorder().entries().expect("entries").is_empty());
    assert!(
        board
            .workflow()
            .task(first.id())
            .expect("task")
            .logged_hours()
            .abs()
            < f64::EPSILON
    );
    assert_eq!(
        board.timer().current_elapsed().expect("elapsed"),
        TimeDelta::minutes(9)
    );
}
