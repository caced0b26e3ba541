//! Injectable wall clock.
//!
//! Profile history entries, avatar file names, and the dataset's
//! `last_updated` marker all read the current time through [`Clock`] so the
//! sync logic can be exercised without depending on the real time of day.

use chrono::{Local, NaiveDateTime};

/// Format used for every timestamp written into a dataset.
///
/// Naive local time with microseconds, e.g. `2024-03-01T09:15:02.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
