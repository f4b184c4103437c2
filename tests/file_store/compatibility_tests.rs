//! Reading documents in the shape the dashboard writes them.

use std::sync::Arc;

use crate::test_helpers::{StepClock, hours_eq};
use camino::Utf8PathBuf;
use mockable::Clock;
use rstest::rstest;
use serde_json::json;
use workboard::board::domain::{TaskId, TaskStatus};
use workboard::persistence::adapters::JsonFileStore;
use workboard::persistence::ports::KeyValueStore;
use workboard::{Workboard, WorkboardConfig};

const TASK_ID: &str = "lx3k9a7f2q";

#[rstest]
fn dashboard_documents_are_loaded() -> eyre::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = Utf8PathBuf::from_path_buf(temp.path().join("board"))
        .map_err(|path| eyre::eyre!("non UTF-8 temp path {}", path.display()))?;
    let clock = StepClock::new();
    let started = clock.utc();
    let store = JsonFileStore::open(&root)?;
    store.set(
        "projectflow_tasks",
        &json!([{
            "id": TASK_ID,
            "title": "Legacy task",
            "status": "in_progress",
            "priority": "urgent",
            "estimatedHours": 3.0,
            "loggedHours": 0.0,
            "createdAt": started,
            "updatedAt": started
        }]),
    )?;
    store.set(
        "projectflow_timer_session",
        &json!({
            "id": "lx3kb1c9zz",
            "taskId": TASK_ID,
            "userId": "sam",
            "startTime": started,
            "isActive": true,
            "description": "Imported"
        }),
    )?;
    clock.advance_minutes(12);

    let board = Workboard::open(Arc::new(store), Arc::new(clock.clone()), WorkboardConfig::default())?;

    let task = board
        .workflow()
        .tasks()?
        .into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("legacy task should load"))?;
    eyre::ensure!(task.status() == TaskStatus::InProgress, "legacy status alias");
    eyre::ensure!(task.id() == &TaskId::from(TASK_ID), "identifier kept as written");
    let entry = board
        .timer()
        .stop()?
        .ok_or_else(|| eyre::eyre!("legacy session should be live"))?;
    eyre::ensure!(hours_eq(entry.hours(), 0.2), "got {} hours", entry.hours());
    eyre::ensure!(entry.description() == "Imported", "session note becomes description");
    Ok(())
}

#[rstest]
fn seeded_numeric_ids_survive_moves_and_restart() -> eyre::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = Utf8PathBuf::from_path_buf(temp.path().join("board"))
        .map_err(|path| eyre::eyre!("non UTF-8 temp path {}", path.display()))?;
    let clock = StepClock::new();
    let created = clock.utc();
    let seeded = |id: &str, title: &str| {
        json!({
            "id": id,
            "title": title,
            "status": "todo",
            "createdAt": created,
            "updatedAt": created
        })
    };
    JsonFileStore::open(&root)?.set(
        "projectflow_tasks",
        &json!([seeded("1", "Design"), seeded("2", "Build")]),
    )?;

    let board = Workboard::open(
        Arc::new(JsonFileStore::open(&root)?),
        Arc::new(clock.clone()),
        WorkboardConfig::default(),
    )?;
    let build = TaskId::from("2");
    board.workflow().move_task(&build, TaskStatus::InProgress, 0)?;
    board.timer().start(&build, "sam")?;
    drop(board);
    clock.advance_minutes(6);

    let reopened = Workboard::open(
        Arc::new(JsonFileStore::open(&root)?),
        Arc::new(clock.clone()),
        WorkboardConfig::default(),
    )?;
    eyre::ensure!(
        reopened.timer().tracked_task()? == Some(build.clone()),
        "session for a numeric task id should be restored"
    );
    let entry = reopened
        .timer()
        .stop()?
        .ok_or_else(|| eyre::eyre!("session should be live"))?;
    eyre::ensure!(entry.task_id() == &build, "entry logged against the seeded id");
    eyre::ensure!(hours_eq(entry.hours(), 0.1), "got {} hours", entry.hours());
    Ok(())
}
