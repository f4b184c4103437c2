//! Domain model for timer sessions and time entries.

mod entry;
mod error;
mod ids;
mod session;

pub use entry::{EntryAmendment, EntrySource, TimeEntry, TimeEntryInput, hours_from};
pub use error::TrackingDomainError;
pub use ids::{SessionId, TimeEntryId, UserId};
pub use session::TimerSession;
