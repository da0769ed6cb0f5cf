//! Batch search service
//!
//! Runs resolution and scoring over many candidate locations in fixed-size
//! concurrent batches and returns a ranked top-N.

use std::{fmt, sync::Arc};

use domain::{CandidateLocation, DateRange, ScoredLocation, WeatherFilters};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::LocationStorePort,
    services::{resolution_service::WeatherResolutionService, scoring_service::ScoringService},
};

/// Ranges longer than this many days carry a [`RangeNotice`]
pub const LONG_RANGE_DAYS: u32 = 30;

/// Batch sizing and early-stop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Locations resolved concurrently per batch
    pub batch_size: usize,
    /// Score at or above which a result counts as a high scorer
    pub high_score_threshold: u8,
    /// Stop once high scorers reach `early_stop_factor * limit`
    pub early_stop_factor: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            high_score_threshold: 70,
            early_stop_factor: 2,
        }
    }
}

/// Caller options for a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    pub min_score: u8,
    /// Upstream region filter, matched against location tags
    pub region: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_score: 0,
            region: None,
        }
    }
}

/// Client-visible warning attached to a search response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeNotice {
    /// The range is long enough that results lean on averaged estimates
    LongRange { days: u32 },
}

impl RangeNotice {
    /// Notice for a range, if it needs one
    pub fn for_range(range: DateRange) -> Option<Self> {
        let days = range.len_days();
        (days > LONG_RANGE_DAYS).then_some(Self::LongRange { days })
    }
}

/// Ranked results of [`BatchSearchService::search`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Sorted by score descending, at most `limit` entries
    pub results: Vec<ScoredLocation>,
    /// Results at or above `min_score` before truncation
    pub total: usize,
    /// Locations actually resolved and scored
    pub evaluated: usize,
    /// Whether the early-stop heuristic skipped remaining batches
    pub stopped_early: bool,
}

/// Response of [`BatchSearchService::search_locations`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredLocation>,
    pub total: usize,
    pub evaluated: usize,
    pub stopped_early: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_notice: Option<RangeNotice>,
}

/// Service ranking candidate locations for a date range
pub struct BatchSearchService {
    resolver: Arc<WeatherResolutionService>,
    scoring: ScoringService,
    settings: SearchSettings,
}

impl fmt::Debug for BatchSearchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSearchService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BatchSearchService {
    pub fn new(resolver: Arc<WeatherResolutionService>) -> Self {
        Self {
            resolver,
            scoring: ScoringService::new(),
            settings: SearchSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = SearchSettings {
            batch_size: settings.batch_size.max(1),
            ..settings
        };
        self
    }

    /// Rank `locations` for `range`
    ///
    /// A location whose resolution panics, or that has no data at all, is
    /// omitted without affecting its siblings.
    #[instrument(skip_all, fields(candidates = locations.len(), start = %range.start(), end = %range.end(), limit = limit, min_score = min_score))]
    pub async fn search(
        &self,
        locations: Vec<CandidateLocation>,
        range: DateRange,
        filters: &WeatherFilters,
        limit: usize,
        min_score: u8,
    ) -> SearchOutcome {
        if limit == 0 {
            return SearchOutcome::default();
        }

        let filters = Arc::new(filters.clone());
        let stop_at = self.settings.early_stop_factor.saturating_mul(limit);
        let mut kept: Vec<ScoredLocation> = Vec::new();
        let mut evaluated = 0;
        let mut stopped_early = false;

        let mut batches = locations.chunks(self.settings.batch_size).peekable();
        while let Some(batch) = batches.next() {
            let mut tasks = JoinSet::new();
            for candidate in batch.iter().cloned() {
                let resolver = Arc::clone(&self.resolver);
                let filters = Arc::clone(&filters);
                let scoring = self.scoring;
                tasks.spawn(async move {
                    let resolution = resolver
                        .resolve(&candidate.id, &candidate.location, range)
                        .await;
                    let provenance = resolution.provenance?;
                    scoring.score(candidate, &resolution.records, provenance, &filters)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                evaluated += 1;
                match joined {
                    Ok(Some(scored)) if scored.score >= min_score => kept.push(scored),
                    Ok(Some(scored)) => {
                        debug!(location_id = %scored.location.id, score = scored.score, "Below minimum score");
                    },
                    Ok(None) => debug!("Location produced no data"),
                    Err(e) => warn!(error = %e, "Location task failed"),
                }
            }

            let high = kept
                .iter()
                .filter(|s| s.score >= self.settings.high_score_threshold)
                .count();
            if high >= stop_at && batches.peek().is_some() {
                stopped_early = true;
                debug!(high, evaluated, "Enough high scorers, stopping early");
                break;
            }
        }

        kept.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.location.id.cmp(&b.location.id))
        });
        let total = kept.len();
        kept.truncate(limit);

        info!(
            evaluated,
            total,
            returned = kept.len(),
            stopped_early,
            "Search complete"
        );

        SearchOutcome {
            results: kept,
            total,
            evaluated,
            stopped_early,
        }
    }

    /// Caller-facing entry point: list candidates, rank them, attach notices
    ///
    /// # Errors
    ///
    /// Returns an error only if the location store cannot be read.
    #[instrument(skip_all, fields(region = ?options.region))]
    pub async fn search_locations(
        &self,
        store: &dyn LocationStorePort,
        filters: &WeatherFilters,
        range: DateRange,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApplicationError> {
        let candidates = store.list(options.region.as_deref()).await?;
        let outcome = self
            .search(candidates, range, filters, options.limit, options.min_score)
            .await;

        Ok(SearchResponse {
            results: outcome.results,
            total: outcome.total,
            evaluated: outcome.evaluated,
            stopped_early: outcome.stopped_early,
            range_notice: RangeNotice::for_range(range),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::services::test_support::{
        FakeSource, MemoryCache, StaticLocations, candidate, clock, day, range,
    };

    struct Harness {
        forecast: Arc<FakeSource>,
        service: BatchSearchService,
    }

    fn harness() -> Harness {
        let clock = clock();
        let forecast = Arc::new(FakeSource::forecast(Arc::clone(&clock), 16));
        let historical = Arc::new(FakeSource::historical(Arc::clone(&clock)));
        let resolver = WeatherResolutionService::new(
            Arc::new(MemoryCache::default()),
            forecast.clone(),
            historical,
            clock,
        );
        Harness {
            forecast,
            service: BatchSearchService::new(Arc::new(resolver)),
        }
    }

    fn week() -> DateRange {
        range(day(2025, 7, 2), day(2025, 7, 4))
    }

    /// High temperature equals latitude; with a 70°F ceiling a latitude of
    /// 70 scores 100 and every degree above costs 10 points.
    fn ceiling() -> WeatherFilters {
        WeatherFilters::new().with_temp_max(70.0)
    }

    #[tokio::test]
    async fn results_are_ranked_and_truncated() {
        let h = harness();
        let locations = vec![
            candidate("warm", 75.0),
            candidate("best", 60.0),
            candidate("hot", 78.0),
        ];
        let outcome = h.service.search(locations, week(), &ceiling(), 2, 0).await;

        let ids: Vec<_> = outcome.results.iter().map(|s| s.location.id.to_string()).collect();
        assert_eq!(ids, vec!["best", "warm"]);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.evaluated, 3);
        assert!(!outcome.stopped_early);
    }

    #[tokio::test]
    async fn results_below_min_score_are_dropped() {
        let h = harness();
        let locations = vec![candidate("ok", 72.0), candidate("bad", 79.0)];
        let outcome = h.service.search(locations, week(), &ceiling(), 10, 50).await;

        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].location.id.as_str(), "ok");
        assert_eq!(outcome.results[0].score, 80);
    }

    #[tokio::test]
    async fn early_stop_after_enough_high_scorers() {
        let h = harness();
        let mut locations: Vec<_> = (0..20).map(|i| candidate(&format!("good-{i:02}"), 60.0)).collect();
        locations.extend((0..30).map(|i| candidate(&format!("meh-{i:02}"), 75.0)));

        let outcome = h.service.search(locations, week(), &ceiling(), 10, 0).await;

        assert!(outcome.stopped_early);
        assert!(outcome.evaluated <= 30);
        assert_eq!(outcome.evaluated, 20);
        assert_eq!(outcome.results.len(), 10);
        assert_eq!(h.forecast.calls(), 20);
    }

    #[tokio::test]
    async fn early_stop_needs_remaining_batches() {
        let h = harness();
        let locations: Vec<_> = (0..20).map(|i| candidate(&format!("g{i}"), 60.0)).collect();
        let outcome = h.service.search(locations, week(), &ceiling(), 5, 0).await;
        assert_eq!(outcome.evaluated, 10);
        assert!(outcome.stopped_early);

        let h = harness();
        let locations: Vec<_> = (0..10).map(|i| candidate(&format!("g{i}"), 60.0)).collect();
        let outcome = h.service.search(locations, week(), &ceiling(), 5, 0).await;
        assert_eq!(outcome.evaluated, 10);
        assert!(!outcome.stopped_early);
    }

    #[tokio::test]
    async fn low_scorers_do_not_trigger_early_stop() {
        let h = harness();
        let locations: Vec<_> = (0..25).map(|i| candidate(&format!("m{i:02}"), 75.0)).collect();
        let outcome = h.service.search(locations, week(), &ceiling(), 1, 0).await;
        assert_eq!(outcome.evaluated, 25);
        assert!(!outcome.stopped_early);
    }

    #[tokio::test]
    async fn locations_without_data_are_omitted() {
        let clock = clock();
        let forecast = Arc::new(FakeSource::forecast(Arc::clone(&clock), 16));
        let historical = Arc::new(FakeSource::historical(Arc::clone(&clock)));
        forecast.fail.store(true, Ordering::SeqCst);
        historical.fail.store(true, Ordering::SeqCst);
        let resolver = WeatherResolutionService::new(
            Arc::new(MemoryCache::default()),
            forecast,
            historical,
            clock,
        );

        let outcome = BatchSearchService::new(Arc::new(resolver))
            .search(vec![candidate("dry", 60.0)], week(), &ceiling(), 10, 0)
            .await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.evaluated, 1);
    }

    #[tokio::test]
    async fn a_panicking_location_does_not_sink_its_batch() {
        let h = harness();
        *h.forecast.panic_latitude.lock() = Some(66.0);
        let locations = vec![candidate("a", 60.0), candidate("boom", 66.0), candidate("b", 61.0)];
        let outcome = h.service.search(locations, week(), &ceiling(), 10, 0).await;

        assert_eq!(outcome.evaluated, 3);
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn zero_limit_returns_nothing() {
        let h = harness();
        let outcome = h
            .service
            .search(vec![candidate("a", 60.0)], week(), &ceiling(), 0, 0)
            .await;
        assert_eq!(outcome, SearchOutcome::default());
        assert_eq!(h.forecast.calls(), 0);
    }

    #[tokio::test]
    async fn search_locations_applies_region_and_notice() {
        let h = harness();
        let store = StaticLocations(vec![
            candidate("co-1", 60.0).with_tag("CO"),
            candidate("ut-1", 60.0).with_tag("UT"),
        ]);
        let options = SearchOptions {
            region: Some("co".into()),
            ..SearchOptions::default()
        };

        let response = h
            .service
            .search_locations(&store, &ceiling(), week(), &options)
            .await
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].location.id.as_str(), "co-1");
        assert!(response.range_notice.is_none());

        let long = range(day(2025, 7, 2), day(2025, 8, 15));
        let response = h
            .service
            .search_locations(&store, &ceiling(), long, &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(response.range_notice, Some(RangeNotice::LongRange { days: 45 }));
    }

    #[test]
    fn range_notice_boundaries() {
        assert!(RangeNotice::for_range(range(day(2025, 7, 1), day(2025, 7, 30))).is_none());
        assert_eq!(
            RangeNotice::for_range(range(day(2025, 7, 1), day(2025, 7, 31))),
            Some(RangeNotice::LongRange { days: 31 })
        );
        let json = serde_json::to_value(RangeNotice::LongRange { days: 31 }).unwrap();
        assert_eq!(json["kind"], "long_range");
    }
}
