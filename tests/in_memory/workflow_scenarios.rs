//! Kanban workflow scenarios through the assembled engine.

use std::sync::Arc;

use crate::test_helpers::{StepClock, hours_eq};
use rstest::{fixture, rstest};
use workboard::board::aggregation::TaskFilter;
use workboard::board::domain::{NewTask, Priority, TaskStatus};
use workboard::board::services::WorkflowError;
use workboard::persistence::adapters::InMemoryStore;
use workboard::tracking::domain::TimeEntryInput;
use workboard::{ErrorKind, Workboard, WorkboardConfig};

type Board = Workboard<InMemoryStore, StepClock>;

struct Env {
    clock: StepClock,
    board: Board,
}

#[fixture]
fn env() -> Env {
    let clock = StepClock::new();
    let config = WorkboardConfig::from_toml_str(
        r"
        [wip_limits]
        in_progress = 2
        ",
    )
    .expect("config parses");
    let board = Workboard::open(
        Arc::new(InMemoryStore::new()),
        Arc::new(clock.clone()),
        config,
    )
    .expect("board opens");
    Env { clock, board }
}

#[rstest]
fn in_progress_limit_from_config_is_enforced(env: Env) -> Result<(), eyre::Report> {
    let workflow = env.board.workflow();
    let ids: Vec<_> = ["one", "two", "three"]
        .into_iter()
        .map(|title| workflow.create_task(NewTask::new(title)).map(|task| task.id().clone()))
        .collect::<Result<_, _>>()?;
    let [first, second, third] = ids.as_slice() else {
        eyre::bail!("expected three tasks");
    };

    workflow.move_task(first, TaskStatus::InProgress, 0)?;
    workflow.move_task(second, TaskStatus::InProgress, 1)?;
    let rejected = workflow.move_task(third, TaskStatus::InProgress, 0);

    eyre::ensure!(
        matches!(
            rejected,
            Err(WorkflowError::Capacity {
                status: TaskStatus::InProgress,
                limit: 2
            })
        ),
        "third move should hit the limit"
    );
    let columns = env.board.columns(&TaskFilter::new())?;
    let in_progress = columns
        .iter()
        .find(|column| column.status() == TaskStatus::InProgress)
        .ok_or_else(|| eyre::eyre!("missing in-progress column"))?;
    eyre::ensure!(in_progress.is_at_capacity(), "column should report full");
    eyre::ensure!(in_progress.wip_limit() == Some(2), "limit should be exposed");
    Ok(())
}

#[rstest]
fn task_can_leave_done_again(env: Env) -> Result<(), eyre::Report> {
    let workflow = env.board.workflow();
    let task = workflow.create_task(NewTask::new("reopened"))?;

    workflow.move_task(task.id(), TaskStatus::Done, 0)?;
    let outcome = workflow.move_task(task.id(), TaskStatus::Review, 0)?;

    eyre::ensure!(outcome.from == TaskStatus::Done, "move should start from done");
    eyre::ensure!(outcome.task.status() == TaskStatus::Review, "task should be in review");
    Ok(())
}

#[rstest]
fn finishing_tracked_work_feeds_board_stats(env: Env) -> Result<(), eyre::Report> {
    let workflow = env.board.workflow();
    let task = workflow.create_task(
        NewTask::new("feature")
            .with_estimated_hours(2.0)
            .with_priority(Priority::High),
    )?;
    workflow.move_task(task.id(), TaskStatus::InProgress, 0)?;
    env.board.timer().start(task.id(), "sam")?;
    env.clock.advance_minutes(90);

    let outcome = workflow.move_task(task.id(), TaskStatus::Done, 0)?;

    let entry = outcome
        .stopped_entry
        .ok_or_else(|| eyre::eyre!("done move should record the timer"))?;
    eyre::ensure!(hours_eq(entry.hours(), 1.5), "entry should hold 1.5 hours");
    eyre::ensure!(
        env.board.timer().current_session()?.is_none(),
        "timer should be stopped"
    );
    let stats = env.board.stats()?;
    eyre::ensure!(stats.completed_tasks == 1, "one task should be done");
    eyre::ensure!(hours_eq(stats.total_logged_hours, 1.5), "logged hours");
    eyre::ensure!(hours_eq(stats.today_hours, 1.5), "today hours");
    eyre::ensure!(hours_eq(stats.efficiency_percent(), 75.0), "efficiency");
    Ok(())
}

#[rstest]
fn logged_hours_cache_matches_entry_sum(env: Env) -> Result<(), eyre::Report> {
    let workflow = env.board.workflow();
    let recorder = env.board.recorder();
    let task = workflow.create_task(NewTask::new("mixed"))?;

    recorder.record(TimeEntryInput::new(task.id(), "sam", 1.25, "design"))?;
    env.board.timer().start(task.id(), "sam")?;
    env.clock.advance_minutes(45);
    env.board.timer().stop()?;
    recorder.record(TimeEntryInput::new(task.id(), "kim", 0.5, "review"))?;

    let expected: f64 = recorder
        .entries_for_task(task.id())?
        .iter()
        .map(|entry| entry.hours())
        .sum();
    let cached = workflow.task(task.id())?.logged_hours();
    eyre::ensure!(hours_eq(expected, 2.5), "entries should sum to 2.5 hours");
    eyre::ensure!(hours_eq(cached, expected), "cache should equal entry sum");
    Ok(())
}

#[rstest]
fn errors_expose_their_category(env: Env) -> Result<(), eyre::Report> {
    let err = env
        .board
        .recorder()
        .record(TimeEntryInput::new(
            &workboard::board::domain::TaskId::new(),
            "sam",
            1.0,
            "orphan",
        ))
        .err()
        .ok_or_else(|| eyre::eyre!("recording against a missing task should fail"))?;

    eyre::ensure!(err.kind() == ErrorKind::NotFound, "unexpected kind {}", err.kind());
    Ok(())
}
