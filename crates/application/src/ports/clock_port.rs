//! Clock port
//!
//! Forecast horizon checks, freshness checks and cache timestamps all read
//! time through this port.

use chrono::{DateTime, Duration, NaiveDate, Utc};
#[cfg(test)]
use mockall::automock;
use parking_lot::RwLock;

/// Source of the current time
#[cfg_attr(test, automock)]
pub trait ClockPort: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar day
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// A clock that only moves when told to
///
/// Used for tests and for replaying a search as of a given moment.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// A clock standing at noon UTC on `day`
    #[must_use]
    pub fn at_noon(day: NaiveDate) -> Self {
        Self::new(day.and_time(chrono::NaiveTime::MIN).and_utc() + Duration::hours(12))
    }

    /// Move the clock forward (or backward for a negative duration)
    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
