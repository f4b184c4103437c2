//! Error types for time-tracking domain validation.

use thiserror::Error;

/// Errors returned while constructing or amending time-tracking values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingDomainError {
    /// Recorded hours must be a finite value greater than zero.
    #[error("invalid hours {0}, expected a finite value > 0")]
    InvalidHours(f64),

    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// A manual entry needs a description.
    #[error("time entry description must not be empty")]
    EmptyDescription,
}
