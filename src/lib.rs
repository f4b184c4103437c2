//! Workboard: timer sessions, time entries and a Kanban task workflow.
//!
//! The engine tracks time against tasks with a single live timer, records
//! finished sessions and manual logs as time entries, and moves tasks across
//! capacity-limited workflow columns. Every mutation is written through to a
//! key-value store before it becomes visible.
//!
//! # Architecture
//!
//! Workboard follows hexagonal architecture principles:
//!
//! - **Domain**: Tasks, sessions and entries with no infrastructure
//!   dependencies
//! - **Ports**: The [`persistence::ports::KeyValueStore`] trait
//! - **Adapters**: In-memory and JSON file stores
//! - **Services**: The timer, the recorder and the workflow engine
//!
//! # Modules
//!
//! - [`board`]: Tasks, Kanban columns, the workflow engine and aggregation
//! - [`tracking`]: Timer sessions and time entries
//! - [`persistence`]: Storage port and adapters
//! - [`notify`]: Change notifications
//! - [`config`]: TOML configuration
//! - [`workboard`]: The assembled engine

pub mod board;
pub mod config;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod tracking;
pub mod workboard;

pub use config::WorkboardConfig;
pub use error::ErrorKind;
pub use workboard::{Workboard, WorkboardError};

#[cfg(test)]
mod test_support;
