//! Weather source port
//!
//! A source answers daily weather for a coordinate over a date range. Two
//! variants exist: a live forecast source and a live historical source.

use async_trait::async_trait;
use domain::{DailyWeatherRecord, DateRange, GeoLocation};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for fetching daily weather records
///
/// Implementations normalize units (°F, mph, inches) and map their native
/// condition codes onto [`domain::PrecipitationType`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherSourcePort: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch records for every day in `range`, ordered by date
    ///
    /// Days the provider has no data for are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::SourceUnavailable` on transport, status,
    /// parse or timeout failures.
    async fn fetch(
        &self,
        location: &GeoLocation,
        range: DateRange,
    ) -> Result<Vec<DailyWeatherRecord>, ApplicationError>;

    /// Whether this source can answer the whole of `range`
    fn supports_range(&self, range: DateRange) -> bool;
}
