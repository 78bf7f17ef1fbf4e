//! Wall-clock abstraction so time-dependent rules stay testable.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// The registration engine reads the clock exactly once per
/// transaction, at its start, so the temporal-validity check is
/// evaluated against a single instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
