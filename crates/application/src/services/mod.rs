//! Application services - Use case implementations

mod averaging_fallback;
mod resolution_service;
mod scoring_service;
mod search_service;
#[cfg(test)]
pub(crate) mod test_support;

pub use averaging_fallback::{AveragingFallback, DEFAULT_FALLBACK_YEARS, aggregate};
pub use resolution_service::{Resolution, WeatherResolutionService};
pub use scoring_service::{DayEvaluation, ScoringService};
pub use search_service::{
    BatchSearchService, LONG_RANGE_DAYS, RangeNotice, SearchOptions, SearchOutcome,
    SearchResponse, SearchSettings,
};
