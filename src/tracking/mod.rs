//! Time tracking for the work-tracking engine.
//!
//! A single timer session per user/device accrues active time across
//! pause/resume cycles and process restarts; stopping it records an immutable
//! time entry against the task. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
