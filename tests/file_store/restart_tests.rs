//! Reopening a board directory after a shutdown.

use std::sync::Arc;

use crate::test_helpers::{StepClock, hours_eq};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use workboard::board::domain::{NewTask, TaskStatus};
use workboard::persistence::adapters::JsonFileStore;
use workboard::{Workboard, WorkboardConfig};

struct BoardDir {
    _temp: TempDir,
    root: Utf8PathBuf,
    clock: StepClock,
}

impl BoardDir {
    fn open(&self) -> eyre::Result<Workboard<JsonFileStore, StepClock>> {
        let store = JsonFileStore::open(&self.root)?;
        Ok(Workboard::open(
            Arc::new(store),
            Arc::new(self.clock.clone()),
            WorkboardConfig::default(),
        )?)
    }
}

#[fixture]
fn board_dir() -> BoardDir {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().join("workboard"))
        .expect("temp path should be UTF-8");
    BoardDir {
        _temp: temp,
        root,
        clock: StepClock::new(),
    }
}

#[rstest]
fn running_timer_is_restored_from_disk(board_dir: BoardDir) -> eyre::Result<()> {
    let board = board_dir.open()?;
    let task = board.workflow().create_task(NewTask::new("persisted"))?;
    board
        .workflow()
        .move_task(task.id(), TaskStatus::InProgress, 0)?;
    board.timer().start(task.id(), "sam")?;
    board_dir.clock.advance_minutes(25);
    drop(board);
    eyre::ensure!(
        board_dir.root.join("projectflow_timer_session.json").exists(),
        "session document should be on disk"
    );

    board_dir.clock.advance_minutes(5);
    let reopened = board_dir.open()?;
    let restored = reopened
        .timer()
        .current_session()?
        .ok_or_else(|| eyre::eyre!("session should be restored"))?;
    eyre::ensure!(restored.task_id() == task.id(), "restored the wrong task");
    eyre::ensure!(
        reopened.workflow().task(task.id())?.status() == TaskStatus::InProgress,
        "status should survive restart"
    );

    let entry = reopened
        .timer()
        .stop()?
        .ok_or_else(|| eyre::eyre!("stop should record an entry"))?;
    eyre::ensure!(hours_eq(entry.hours(), 0.5), "got {} hours", entry.hours());
    eyre::ensure!(
        !board_dir.root.join("projectflow_timer_session.json").exists(),
        "session document should be removed"
    );
    Ok(())
}

#[rstest]
fn column_order_survives_restart(board_dir: BoardDir) -> eyre::Result<()> {
    let board = board_dir.open()?;
    let workflow = board.workflow();
    let first = workflow.create_task(NewTask::new("first"))?;
    let second = workflow.create_task(NewTask::new("second"))?;
    workflow.move_task(second.id(), TaskStatus::Todo, 0)?;
    drop(board);

    let reopened = board_dir.open()?;
    let order: Vec<_> = reopened
        .workflow()
        .tasks()?
        .iter()
        .map(|task| task.id().clone())
        .collect();

    eyre::ensure!(order == vec![second.id().clone(), first.id().clone()], "unexpected order");
    Ok(())
}
