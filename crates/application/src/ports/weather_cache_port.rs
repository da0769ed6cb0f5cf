//! Weather cache port
//!
//! A dumb keyed store of daily records. Entries are keyed by
//! `(location id, date, data class)` and the store never judges freshness;
//! the resolution service does that with the entry's fetch timestamp.

use async_trait::async_trait;
use domain::{CacheEntry, DateRange, LocationId};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;

/// Port for the weather record cache
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherCachePort: Send + Sync {
    /// Every stored entry for `location_id` whose date lies in `range`
    ///
    /// A date may have one entry per data class. Missing dates are simply
    /// absent from the result.
    async fn get(
        &self,
        location_id: &LocationId,
        range: DateRange,
    ) -> Result<Vec<CacheEntry>, ApplicationError>;

    /// Upsert a batch of entries for one location
    ///
    /// The batch is applied atomically: a concurrent reader sees all of it
    /// or none of it. Later writes replace earlier ones per key.
    async fn put(
        &self,
        location_id: &LocationId,
        entries: Vec<CacheEntry>,
    ) -> Result<(), ApplicationError>;

    /// Get cache statistics (hits, misses, size)
    fn stats(&self) -> CacheStats;
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requested days that had at least one stored entry
    pub hits: u64,
    /// Requested days with nothing stored
    pub misses: u64,
    /// Current number of stored entries
    pub entries: u64,
}

impl CacheStats {
    /// Calculate the hit rate as a fraction (0.0 - 1.0)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            // Precision loss is acceptable for statistics display
            self.hits as f64 / total as f64
        }
    }
}
