//! Kanban task workflow for the work-tracking engine.
//!
//! Tasks move through `todo → in-progress → review → done` columns under
//! per-column work-in-progress limits. Moving a task to `done` stops any
//! timer still tracking it. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]
//! - Derived read models in [`aggregation`]

pub mod aggregation;
pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
