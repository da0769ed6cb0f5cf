//! Wall-clock adapter

use application::ClockPort;
use chrono::{DateTime, Utc};

/// The system clock, in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
