//! Moka in-memory weather cache
//!
//! One immutable snapshot per location. Writers for the whole cache are
//! serialized and replace a location's snapshot in a single insert, so a
//! reader holding the previous `Arc` never sees a half-applied batch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use application::{ApplicationError, CacheStats, WeatherCachePort};
use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{CacheEntry, DataClass, DateRange, LocationId};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Default bound on cached locations
pub const DEFAULT_MAX_LOCATIONS: u64 = 10_000;

type Snapshot = Arc<BTreeMap<(NaiveDate, DataClass), CacheEntry>>;

/// In-memory cache backend
///
/// Capacity is counted in locations; moka evicts whole location snapshots
/// once the bound is reached. Nothing expires by age, freshness is judged by
/// the resolution service.
pub struct MokaWeatherCache {
    cache: Cache<LocationId, Snapshot>,
    write_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for MokaWeatherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaWeatherCache")
            .field("locations", &self.cache.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl MokaWeatherCache {
    #[must_use]
    pub fn new(max_locations: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_locations.max(1)).build(),
            write_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn entry_count(&self) -> u64 {
        self.cache.iter().map(|(_, snapshot)| snapshot.len() as u64).sum()
    }
}

impl Default for MokaWeatherCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOCATIONS)
    }
}

#[async_trait]
impl WeatherCachePort for MokaWeatherCache {
    #[instrument(skip(self), level = "debug", fields(location_id = %location_id))]
    async fn get(
        &self,
        location_id: &LocationId,
        range: DateRange,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        let Some(snapshot) = self.cache.get(location_id).await else {
            self.misses
                .fetch_add(u64::from(range.len_days()), Ordering::Relaxed);
            debug!("Cache miss (no snapshot)");
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let (mut hits, mut misses) = (0u64, 0u64);
        for day in range.days() {
            let before = found.len();
            found.extend(
                snapshot
                    .range((day, DataClass::Forecast)..=(day, DataClass::Historical))
                    .map(|(_, entry)| entry.clone()),
            );
            if found.len() > before {
                hits += 1;
            } else {
                misses += 1;
            }
        }

        self.hits.fetch_add(hits, Ordering::Relaxed);
        self.misses.fetch_add(misses, Ordering::Relaxed);
        debug!(hits, misses, "Cache lookup");
        Ok(found)
    }

    #[instrument(skip(self, entries), level = "debug", fields(location_id = %location_id, count = entries.len()))]
    async fn put(
        &self,
        location_id: &LocationId,
        entries: Vec<CacheEntry>,
    ) -> Result<(), ApplicationError> {
        if entries.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut next = self
            .cache
            .get(location_id)
            .await
            .map(|current| (*current).clone())
            .unwrap_or_default();
        for entry in entries {
            next.insert((entry.date(), entry.class), entry);
        }
        self.cache.insert(location_id.clone(), Arc::new(next)).await;

        debug!("Cache batch stored");
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
        }
    }
}
