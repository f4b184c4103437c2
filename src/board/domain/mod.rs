//! Domain model for tasks and Kanban columns.
//!
//! Task values carry no infrastructure concerns; persistence and timer
//! side effects live in [`crate::board::services`].

mod column;
mod error;
mod ids;
mod status;
mod task;

pub use column::{KanbanColumn, WipLimits};
pub use error::{BoardDomainError, ParseTaskStatusError};
pub use ids::TaskId;
pub use status::{Priority, TaskStatus};
pub use task::{NewTask, Task, TaskPatch};
