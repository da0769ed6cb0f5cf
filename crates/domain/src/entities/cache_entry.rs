//! Cached daily record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::DailyWeatherRecord;
use crate::value_objects::{DataClass, FreshnessPolicy, LocationId};

/// A daily record stored under `(location_id, date, class)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub location_id: LocationId,
    pub class: DataClass,
    pub record: DailyWeatherRecord,
    /// When the record was obtained from a source or computed
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub const fn new(
        location_id: LocationId,
        class: DataClass,
        record: DailyWeatherRecord,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location_id,
            class,
            record,
            fetched_at,
        }
    }

    /// Calendar day of the stored record
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.record.date
    }

    /// Whether this entry is still usable at `now`
    #[must_use]
    pub fn is_fresh(&self, policy: &FreshnessPolicy, now: DateTime<Utc>) -> bool {
        policy.is_fresh(self.class, self.fetched_at, now)
    }
}
