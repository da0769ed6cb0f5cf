//! Per-class cache freshness rules

use chrono::{DateTime, Duration, Utc};

use super::DataClass;

/// How long a cached record of each class stays usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    forecast_ttl: Duration,
    historical_ttl: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with explicit time-to-live values
    #[must_use]
    pub const fn new(forecast_ttl: Duration, historical_ttl: Duration) -> Self {
        Self {
            forecast_ttl,
            historical_ttl,
        }
    }

    /// Time-to-live for a data class
    #[must_use]
    pub const fn ttl(&self, class: DataClass) -> Duration {
        match class {
            DataClass::Forecast => self.forecast_ttl,
            DataClass::Historical => self.historical_ttl,
        }
    }

    /// Whether a record fetched at `fetched_at` is still fresh at `now`
    ///
    /// Timestamps from the future (clock skew) count as fresh.
    #[must_use]
    pub fn is_fresh(&self, class: DataClass, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(fetched_at) < self.ttl(class)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(6), Duration::days(7))
    }
}
