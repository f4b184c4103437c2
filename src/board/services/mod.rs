//! Application services for the task workflow.

mod book;
mod workflow;

pub use book::TaskBook;
pub use workflow::{MoveOutcome, TaskWorkflowEngine, WorkflowError, WorkflowResult};
