//! Shared fixtures for workboard integration tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock advanced explicitly by the test.
#[derive(Debug, Clone)]
pub struct StepClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl StepClock {
    /// Creates a clock reading Monday 2024-03-11 09:00 UTC.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 3, 11, 9, 0, 0)
            .single()
            .expect("valid start instant");
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `minutes`.
    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().expect("clock lock");
        *now += TimeDelta::minutes(minutes);
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StepClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Returns `true` when two hour values agree to within a nanosecond-hour.
pub fn hours_eq(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}
