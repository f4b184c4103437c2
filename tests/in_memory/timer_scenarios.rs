//! Timer lifecycle scenarios across engine restarts.

use std::sync::Arc;

use crate::test_helpers::{StepClock, hours_eq};
use rstest::rstest;
use workboard::board::domain::NewTask;
use workboard::persistence::adapters::InMemoryStore;
use workboard::tracking::domain::EntryAmendment;
use workboard::{Workboard, WorkboardConfig};

fn open(store: &InMemoryStore, clock: &StepClock) -> eyre::Result<Workboard<InMemoryStore, StepClock>> {
    Ok(Workboard::open(
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
        WorkboardConfig::default(),
    )?)
}

#[rstest]
fn session_survives_restart_and_records_full_duration() -> eyre::Result<()> {
    let store = InMemoryStore::new();
    let clock = StepClock::new();
    let board = open(&store, &clock)?;
    let task = board.workflow().create_task(NewTask::new("long haul"))?;
    board.timer().start(task.id(), "sam")?;
    clock.advance_minutes(20);
    board.timer().pause()?;
    clock.advance_minutes(60);
    drop(board);

    let restarted = open(&store, &clock)?;
    restarted.timer().resume()?;
    clock.advance_minutes(10);
    let entry = restarted
        .timer()
        .stop()?
        .ok_or_else(|| eyre::eyre!("stop should record an entry"))?;

    eyre::ensure!(hours_eq(entry.hours(), 0.5), "got {} hours", entry.hours());
    let reloaded = open(&store, &clock)?;
    eyre::ensure!(
        reloaded.timer().current_session()?.is_none(),
        "no session should remain after stop"
    );
    eyre::ensure!(
        hours_eq(reloaded.workflow().task(task.id())?.logged_hours(), 0.5),
        "cache should survive restart"
    );
    Ok(())
}

#[rstest]
fn last_timer_entry_can_be_amended_once_stopped() -> eyre::Result<()> {
    let store = InMemoryStore::new();
    let clock = StepClock::new();
    let board = open(&store, &clock)?;
    let task = board.workflow().create_task(NewTask::new("amend"))?;
    board.timer().start(task.id(), "sam")?;
    clock.advance_minutes(30);
    board.timer().stop()?;

    let amended = board.recorder().amend_last(
        task.id(),
        EntryAmendment::new().description("Pairing on parser"),
    )?;

    eyre::ensure!(amended.description() == "Pairing on parser", "description");
    eyre::ensure!(hours_eq(amended.hours(), 0.5), "hours unchanged");
    Ok(())
}
