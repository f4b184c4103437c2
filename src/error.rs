//! Error classification shared by every engine service.

use std::fmt;

/// Coarse error category reported to the presentation layer.
///
/// `Validation` and `Capacity` leave state untouched and are safe to show as
/// a message; `Persistence` means the operation was rolled back and may be
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input failed validation.
    Validation,
    /// A referenced task, entry or session does not exist.
    NotFound,
    /// A work-in-progress limit would be exceeded.
    Capacity,
    /// The persistence collaborator failed.
    Persistence,
}

impl ErrorKind {
    /// Returns the canonical name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Capacity => "capacity",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
