//! Service-level errors for time tracking.

use crate::board::domain::TaskId;
use crate::error::ErrorKind;
use crate::persistence::ports::PersistenceError;
use crate::tracking::domain::TrackingDomainError;
use thiserror::Error;

/// Errors returned by the timer session manager and time entry recorder.
#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TrackingDomainError),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// No timer-generated entry for the task is open for amendment.
    #[error("no amendable time entry for task {0}")]
    NoAmendableEntry(TaskId),

    /// The persistence collaborator failed; in-memory state was rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TrackingError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::NoAmendableEntry(_) => ErrorKind::NotFound,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Result type for time-tracking service operations.
pub type TrackingResult<T> = Result<T, TrackingError>;
