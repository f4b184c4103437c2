//! Application services for timer sessions and time entries.

mod error;
mod recorder;
mod ticker;
mod timer;

pub use error::{TrackingError, TrackingResult};
pub use recorder::TimeEntryRecorder;
pub use ticker::ElapsedTicker;
pub use timer::TimerSessionManager;
pub(crate) use timer::StoppedSession;
