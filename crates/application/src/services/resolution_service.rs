//! Weather resolution service
//!
//! Produces one record per requested day for a location by combining the
//! cache, the forecast source, the historical source and the averaging
//! fallback, then writes every newly obtained record back as one batch.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    CacheEntry, DailyWeatherRecord, DataClass, DateRange, FreshnessPolicy, GeoLocation,
    LocationId, Provenance,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    ports::{ClockPort, WeatherCachePort, WeatherSourcePort},
    services::averaging_fallback::{AveragingFallback, DEFAULT_FALLBACK_YEARS},
};

/// Resolved records for one location and date range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// One record per resolved day, in date order
    pub records: Vec<DailyWeatherRecord>,
    /// `None` when no day could be resolved
    pub provenance: Option<Provenance>,
    /// Days produced by the averaging fallback during this call
    pub estimated: Vec<NaiveDate>,
    /// Days no source or fallback could produce
    pub missing: Vec<NaiveDate>,
}

impl Resolution {
    /// Whether no day could be resolved at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Where a requested day must come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    /// Before today: direct history
    Past,
    /// Today through the forecast horizon
    Forecast,
    /// After the forecast horizon: averaged history
    BeyondHorizon,
}

impl Segment {
    const fn class(self) -> DataClass {
        match self {
            Self::Forecast => DataClass::Forecast,
            Self::Past | Self::BeyondHorizon => DataClass::Historical,
        }
    }
}

/// Records obtained during one resolution, before the merge
#[derive(Default)]
struct Gathered {
    resolved: BTreeMap<NaiveDate, (DataClass, DailyWeatherRecord)>,
    writes: Vec<CacheEntry>,
    estimated: Vec<NaiveDate>,
    missing: Vec<NaiveDate>,
}

/// Service resolving daily weather for a location and date range
pub struct WeatherResolutionService {
    cache: Arc<dyn WeatherCachePort>,
    forecast: Arc<dyn WeatherSourcePort>,
    historical: Arc<dyn WeatherSourcePort>,
    fallback: AveragingFallback,
    clock: Arc<dyn ClockPort>,
    freshness: FreshnessPolicy,
}

impl fmt::Debug for WeatherResolutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherResolutionService")
            .field("forecast", &self.forecast.name())
            .field("historical", &self.historical.name())
            .field("fallback", &self.fallback)
            .field("freshness", &self.freshness)
            .finish_non_exhaustive()
    }
}

impl WeatherResolutionService {
    /// Create a resolution service with the default freshness policy and
    /// a five-year averaging fallback over the historical source
    pub fn new(
        cache: Arc<dyn WeatherCachePort>,
        forecast: Arc<dyn WeatherSourcePort>,
        historical: Arc<dyn WeatherSourcePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let fallback = AveragingFallback::new(Arc::clone(&historical), DEFAULT_FALLBACK_YEARS);
        Self {
            cache,
            forecast,
            historical,
            fallback,
            clock,
            freshness: FreshnessPolicy::default(),
        }
    }

    /// Override the cache freshness policy
    #[must_use]
    pub const fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    /// Override how many prior years the averaging fallback samples
    #[must_use]
    pub fn with_fallback_years(mut self, years: u32) -> Self {
        self.fallback = AveragingFallback::new(Arc::clone(&self.historical), years);
        self
    }

    /// Resolve every day of `range` for one location
    ///
    /// Never fails as a whole: days nothing could produce are reported in
    /// [`Resolution::missing`] and left out of the records.
    #[instrument(skip_all, fields(location_id = %location_id, start = %range.start(), end = %range.end()))]
    pub async fn resolve(
        &self,
        location_id: &LocationId,
        location: &GeoLocation,
        range: DateRange,
    ) -> Resolution {
        let now = self.clock.now();
        let today = self.clock.today();

        let mut cached = self.cached_entries(location_id, range).await;
        let mut gathered = Gathered::default();
        let mut pending: Vec<(NaiveDate, Segment)> = Vec::new();

        for day in range.days() {
            let segment = self.segment_for(day, today);
            let class = segment.class();
            match cached.remove(&(day, class)) {
                Some(entry) if entry.is_fresh(&self.freshness, now) => {
                    gathered.resolved.insert(day, (class, entry.record));
                },
                stale => {
                    if let Some(entry) = stale {
                        debug!(date = %day, class = %class, fetched_at = %entry.fetched_at, "Stale cache entry");
                    }
                    pending.push((day, segment));
                },
            }
        }
        debug!(
            hits = gathered.resolved.len(),
            misses = pending.len(),
            "Cache lookup complete"
        );

        for (segment, run) in runs_by_segment(&pending) {
            self.fill_run(location_id, location, segment, run, now, &cached, &mut gathered)
                .await;
        }

        self.write_back(location_id, std::mem::take(&mut gathered.writes))
            .await;

        let provenance = Provenance::from_classes(gathered.resolved.values().map(|(c, _)| *c));
        if !gathered.missing.is_empty() {
            warn!(missing = gathered.missing.len(), "Some days could not be resolved");
        }
        info!(
            resolved = gathered.resolved.len(),
            estimated = gathered.estimated.len(),
            provenance = ?provenance,
            "Resolved weather"
        );

        Resolution {
            records: gathered.resolved.into_values().map(|(_, r)| r).collect(),
            provenance,
            estimated: gathered.estimated,
            missing: gathered.missing,
        }
    }

    fn segment_for(&self, day: NaiveDate, today: NaiveDate) -> Segment {
        if day < today {
            Segment::Past
        } else if self.forecast.supports_range(DateRange::single(day)) {
            Segment::Forecast
        } else {
            Segment::BeyondHorizon
        }
    }

    /// Cache contents keyed by `(date, class)`; a failed read counts as empty
    async fn cached_entries(
        &self,
        location_id: &LocationId,
        range: DateRange,
    ) -> HashMap<(NaiveDate, DataClass), CacheEntry> {
        match self.cache.get(location_id, range).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| range.contains(e.date()))
                .map(|e| ((e.date(), e.class), e))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Cache read failed, resolving from sources");
                HashMap::new()
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn fill_run(
        &self,
        location_id: &LocationId,
        location: &GeoLocation,
        segment: Segment,
        run: DateRange,
        now: DateTime<Utc>,
        cached: &HashMap<(NaiveDate, DataClass), CacheEntry>,
        gathered: &mut Gathered,
    ) {
        let source = match segment {
            Segment::Past => Some(&self.historical),
            Segment::Forecast => Some(&self.forecast),
            Segment::BeyondHorizon => None,
        }
        .filter(|source| source.supports_range(run));

        let mut unanswered: Vec<NaiveDate> = run.days().collect();

        if let Some(source) = source {
            let class = segment.class();
            match source.fetch(location, run).await {
                Ok(records) => {
                    debug!(source = source.name(), run = %run, returned = records.len(), "Fetched run");
                    for record in records {
                        if !run.contains(record.date) {
                            continue;
                        }
                        unanswered.retain(|d| *d != record.date);
                        gathered.writes.push(CacheEntry::new(
                            location_id.clone(),
                            class,
                            record.clone(),
                            now,
                        ));
                        gathered.resolved.insert(record.date, (class, record));
                    }
                },
                Err(e) => {
                    warn!(source = source.name(), run = %run, error = %e, "Source failed, falling back to averages");
                },
            }
        }

        for day in unanswered {
            self.fill_with_fallback(location_id, location, segment, day, now, cached, gathered)
                .await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn fill_with_fallback(
        &self,
        location_id: &LocationId,
        location: &GeoLocation,
        segment: Segment,
        day: NaiveDate,
        now: DateTime<Utc>,
        cached: &HashMap<(NaiveDate, DataClass), CacheEntry>,
        gathered: &mut Gathered,
    ) {
        // A forecast day may still hold a fresh averaged estimate from an
        // earlier forecast outage.
        if segment == Segment::Forecast {
            if let Some(entry) = cached
                .get(&(day, DataClass::Historical))
                .filter(|e| e.is_fresh(&self.freshness, now))
            {
                debug!(date = %day, "Using cached estimate for unreachable forecast day");
                gathered
                    .resolved
                    .insert(day, (DataClass::Historical, entry.record.clone()));
                return;
            }
        }

        match self.fallback.estimate(location, day).await {
            Ok(record) => {
                gathered.writes.push(CacheEntry::new(
                    location_id.clone(),
                    DataClass::Historical,
                    record.clone(),
                    now,
                ));
                gathered
                    .resolved
                    .insert(day, (DataClass::Historical, record));
                gathered.estimated.push(day);
            },
            Err(e) => {
                warn!(date = %day, error = %e, "Averaging fallback failed");
                gathered.missing.push(day);
            },
        }
    }

    async fn write_back(&self, location_id: &LocationId, writes: Vec<CacheEntry>) {
        if writes.is_empty() {
            return;
        }
        let count = writes.len();
        match self.cache.put(location_id, writes).await {
            Ok(()) => debug!(written = count, "Cached resolved records"),
            Err(e) => warn!(error = %e, "Cache write failed, returning in-memory results"),
        }
    }
}

/// Group pending days into contiguous runs that share one segment
fn runs_by_segment(pending: &[(NaiveDate, Segment)]) -> Vec<(Segment, DateRange)> {
    let mut runs = Vec::new();
    for segment in [Segment::Past, Segment::Forecast, Segment::BeyondHorizon] {
        let days: Vec<NaiveDate> = pending
            .iter()
            .filter(|(_, s)| *s == segment)
            .map(|(d, _)| *d)
            .collect();
        runs.extend(
            DateRange::contiguous_runs(&days)
                .into_iter()
                .map(|run| (segment, run)),
        );
    }
    runs
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Duration;

    use super::*;
    use crate::{
        ports::{FixedClock, MockWeatherCachePort},
        services::test_support::{FakeSource, MemoryCache, clock, day, range},
    };

    struct Harness {
        cache: Arc<MemoryCache>,
        forecast: Arc<FakeSource>,
        historical: Arc<FakeSource>,
        clock: Arc<FixedClock>,
        service: WeatherResolutionService,
    }

    fn harness() -> Harness {
        let clock = clock();
        let cache = Arc::new(MemoryCache::default());
        let forecast = Arc::new(FakeSource::forecast(Arc::clone(&clock), 16));
        let historical = Arc::new(FakeSource::historical(Arc::clone(&clock)));
        let service = WeatherResolutionService::new(
            cache.clone(),
            forecast.clone(),
            historical.clone(),
            clock.clone(),
        );
        Harness {
            cache,
            forecast,
            historical,
            clock,
            service,
        }
    }

    fn id() -> LocationId {
        LocationId::new("grid-7").unwrap()
    }

    fn point() -> GeoLocation {
        GeoLocation::new(75.0, -100.0).unwrap()
    }

    #[tokio::test]
    async fn forecast_range_is_forecast() {
        let h = harness();
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 2), day(2025, 7, 5)))
            .await;

        assert_eq!(res.records.len(), 4);
        assert_eq!(res.provenance, Some(Provenance::Forecast));
        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.historical.calls(), 0);
        assert_eq!(h.cache.len(), 4);
        assert!(res.estimated.is_empty() && res.missing.is_empty());
    }

    #[tokio::test]
    async fn past_range_is_historical() {
        let h = harness();
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 6, 1), day(2025, 6, 3)))
            .await;

        assert_eq!(res.provenance, Some(Provenance::Historical));
        assert_eq!(h.historical.calls(), 1);
        assert_eq!(h.forecast.calls(), 0);
        assert_eq!(
            h.cache.classes_for(&id(), day(2025, 6, 2)),
            vec![DataClass::Historical]
        );
    }

    #[tokio::test]
    async fn second_resolution_is_served_from_cache() {
        let h = harness();
        let r = range(day(2025, 6, 29), day(2025, 7, 3));
        let first = h.service.resolve(&id(), &point(), r).await;
        let second = h.service.resolve(&id(), &point(), r).await;

        assert_eq!(first.records, second.records);
        assert_eq!(first.provenance, Some(Provenance::Mixed));
        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.historical.calls(), 1);
        assert_eq!(h.cache.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_forecast_is_refetched() {
        let h = harness();
        let r = range(day(2025, 7, 2), day(2025, 7, 3));
        h.service.resolve(&id(), &point(), r).await;
        h.clock.advance(Duration::hours(7));
        h.service.resolve(&id(), &point(), r).await;

        assert_eq!(h.forecast.calls(), 2);
        assert_eq!(h.cache.puts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn forecast_failure_falls_back_to_averages() {
        let h = harness();
        h.forecast.fail.store(true, Ordering::SeqCst);
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 2), day(2025, 7, 3)))
            .await;

        assert_eq!(res.records.len(), 2);
        assert_eq!(res.provenance, Some(Provenance::Historical));
        assert_eq!(res.estimated, vec![day(2025, 7, 2), day(2025, 7, 3)]);
        // one single-day fetch per sampled year per date
        assert_eq!(h.historical.calls(), 10);
        assert_eq!(
            h.cache.classes_for(&id(), day(2025, 7, 2)),
            vec![DataClass::Historical]
        );
    }

    #[tokio::test]
    async fn cached_estimate_covers_repeated_forecast_outage() {
        let h = harness();
        h.forecast.fail.store(true, Ordering::SeqCst);
        let r = range(day(2025, 7, 2), day(2025, 7, 3));
        let first = h.service.resolve(&id(), &point(), r).await;
        let second = h.service.resolve(&id(), &point(), r).await;

        assert_eq!(first.records, second.records);
        assert_eq!(h.forecast.calls(), 2);
        assert_eq!(h.historical.calls(), 10);
        assert!(second.estimated.is_empty());
    }

    #[tokio::test]
    async fn beyond_horizon_is_estimated_and_mixed() {
        let h = harness();
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 16), day(2025, 7, 20)))
            .await;

        assert_eq!(res.records.len(), 5);
        assert_eq!(res.provenance, Some(Provenance::Mixed));
        // a 16-day horizon counts today, so July 16 is the last forecast day
        assert_eq!(
            res.estimated,
            vec![day(2025, 7, 17), day(2025, 7, 18), day(2025, 7, 19), day(2025, 7, 20)]
        );
        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.historical.calls(), 20);
    }

    #[tokio::test]
    async fn last_horizon_day_is_forecast() {
        let h = harness();
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 1), day(2025, 7, 16)))
            .await;

        assert_eq!(res.records.len(), 16);
        assert_eq!(res.provenance, Some(Provenance::Forecast));
        assert!(res.estimated.is_empty());
        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.historical.calls(), 0);
    }

    #[tokio::test]
    async fn unresolvable_days_are_missing_not_fabricated() {
        let h = harness();
        h.forecast.fail.store(true, Ordering::SeqCst);
        h.historical.fail.store(true, Ordering::SeqCst);
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 2), day(2025, 7, 4)))
            .await;

        assert!(res.is_empty());
        assert_eq!(res.provenance, None);
        assert_eq!(res.missing.len(), 3);
        assert_eq!(h.cache.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn partial_history_still_estimates() {
        let h = harness();
        *h.historical.failing_years.lock() = vec![2024, 2023];
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 8, 1), day(2025, 8, 1)))
            .await;
        assert_eq!(res.estimated, vec![day(2025, 8, 1)]);
    }

    #[tokio::test]
    async fn cache_write_failure_is_not_fatal() {
        let h = harness();
        h.cache.fail_writes.store(true, Ordering::SeqCst);
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 2), day(2025, 7, 3)))
            .await;

        assert_eq!(res.records.len(), 2);
        assert_eq!(h.cache.len(), 0);
    }

    #[tokio::test]
    async fn cache_read_failure_resolves_from_sources() {
        let h = harness();
        h.cache.fail_reads.store(true, Ordering::SeqCst);
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 6, 10), day(2025, 6, 11)))
            .await;
        assert_eq!(res.records.len(), 2);
        assert_eq!(h.historical.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_hit_splits_fetches_into_runs() {
        let h = harness();
        let cached = FakeSource::record(&point(), day(2025, 6, 3));
        h.cache.insert(CacheEntry::new(
            id(),
            DataClass::Historical,
            cached,
            h.clock.now(),
        ));

        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 6, 1), day(2025, 6, 5)))
            .await;
        assert_eq!(res.records.len(), 5);
        assert_eq!(h.historical.calls(), 2);
    }

    #[tokio::test]
    async fn past_day_ignores_forecast_class_entry() {
        let h = harness();
        let mut stale_forecast = FakeSource::record(&point(), day(2025, 6, 30));
        stale_forecast.temp_high_f = 10.0;
        h.cache.insert(CacheEntry::new(
            id(),
            DataClass::Forecast,
            stale_forecast,
            h.clock.now(),
        ));

        let res = h
            .service
            .resolve(&id(), &point(), DateRange::single(day(2025, 6, 30)))
            .await;
        assert_eq!(res.provenance, Some(Provenance::Historical));
        assert!((res.records[0].temp_high_f - 75.0).abs() < f64::EPSILON);
        assert_eq!(h.historical.calls(), 1);
    }

    #[tokio::test]
    async fn days_missing_from_a_response_use_the_fallback() {
        let h = harness();
        *h.forecast.gaps.lock() = vec![day(2025, 7, 3)];
        let res = h
            .service
            .resolve(&id(), &point(), range(day(2025, 7, 2), day(2025, 7, 4)))
            .await;

        assert_eq!(res.records.len(), 3);
        assert_eq!(res.estimated, vec![day(2025, 7, 3)]);
        assert_eq!(res.provenance, Some(Provenance::Mixed));
    }

    #[tokio::test]
    async fn fallback_years_are_configurable() {
        let h = harness();
        let service = WeatherResolutionService::new(
            h.cache.clone(),
            h.forecast.clone(),
            h.historical.clone(),
            h.clock.clone(),
        )
        .with_fallback_years(2);
        service
            .resolve(&id(), &point(), DateRange::single(day(2025, 9, 1)))
            .await;
        assert_eq!(h.historical.calls(), 2);
    }

    #[tokio::test]
    async fn fetched_days_are_written_back_as_one_batch() {
        let clock = clock();
        let mut cache = MockWeatherCachePort::new();
        cache.expect_get().times(1).returning(|_, _| Ok(Vec::new()));
        cache
            .expect_put()
            .times(1)
            .withf(|location_id, entries| {
                location_id.as_str() == "grid-7"
                    && entries.len() == 4
                    && entries.iter().filter(|e| e.class == DataClass::Historical).count() == 2
                    && entries.iter().filter(|e| e.class == DataClass::Forecast).count() == 2
            })
            .returning(|_, _| Ok(()));

        let service = WeatherResolutionService::new(
            Arc::new(cache),
            Arc::new(FakeSource::forecast(Arc::clone(&clock), 16)),
            Arc::new(FakeSource::historical(Arc::clone(&clock))),
            clock,
        );
        let res = service
            .resolve(&id(), &point(), range(day(2025, 6, 29), day(2025, 7, 2)))
            .await;

        assert_eq!(res.records.len(), 4);
        assert_eq!(res.provenance, Some(Provenance::Mixed));
    }
}
