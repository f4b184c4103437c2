//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or editing task values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoardDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The estimate is negative or not a finite number.
    #[error("invalid estimated hours {0}, expected a finite value >= 0")]
    InvalidEstimate(f64),
}

/// Error returned while parsing task statuses from external input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
