//! Weather source adapters - Implement WeatherSourcePort using integration_weather
//!
//! The provider speaks metric units and WMO condition codes. Both adapters
//! normalize to imperial units and map the condition code onto
//! [`PrecipitationType`] before records leave this module.

use std::fmt;
use std::sync::Arc;

use application::{ApplicationError, ClockPort, WeatherSourcePort};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use domain::{
    DailyWeatherRecord, DateRange, DomainError, GeoLocation, InvalidCoordinates,
    Percentage, PrecipitationType, round_hundredths, round_tenths,
};
use integration_weather::{DailyObservation, WeatherClient, WeatherError};
use tracing::{debug, instrument};

use crate::retry::{RetryConfig, retry};

const KMH_PER_MPH: f64 = 1.609_344;
const MM_PER_INCH: f64 = 25.4;

/// Convert °C to °F at one decimal
#[must_use]
pub fn fahrenheit_from_celsius(celsius: f64) -> f64 {
    round_tenths(celsius.mul_add(9.0 / 5.0, 32.0))
}

/// Convert km/h to mph at one decimal
#[must_use]
pub fn mph_from_kmh(kmh: f64) -> f64 {
    round_tenths(kmh / KMH_PER_MPH)
}

/// Convert millimetres to inches at two decimals
#[must_use]
pub fn inches_from_mm(mm: f64) -> f64 {
    round_hundredths(mm / MM_PER_INCH)
}

/// Precipitation category for a WMO weather interpretation code
///
/// Clear, cloudy and unmapped codes are `None`.
#[must_use]
pub const fn precipitation_type_for(code: u8) -> PrecipitationType {
    match code {
        45 | 48 => PrecipitationType::Fog,
        51 | 53 | 55 => PrecipitationType::Drizzle,
        56 | 57 | 66 | 67 => PrecipitationType::FreezingRain,
        61 | 63 | 65 | 80..=82 => PrecipitationType::Rain,
        71 | 73 | 75 | 85 | 86 => PrecipitationType::Snow,
        77 => PrecipitationType::IcePellets,
        95 => PrecipitationType::Thunderstorms,
        96 | 99 => PrecipitationType::Hail,
        _ => PrecipitationType::None,
    }
}

/// Normalize one provider day into a canonical record
///
/// Archive days carry no precipitation probability; for them, and for
/// forecast days that omit it, the chance is 100% when any precipitation
/// was recorded and 0% otherwise.
fn to_record(observation: &DailyObservation) -> DailyWeatherRecord {
    let precip_amount_in = inches_from_mm(observation.precipitation_sum);
    let precip_probability = observation.precipitation_probability.map_or_else(
        || {
            if precip_amount_in > 0.0 {
                Percentage::FULL
            } else {
                Percentage::ZERO
            }
        },
        Percentage::from_f64,
    );

    DailyWeatherRecord {
        date: observation.date,
        temp_high_f: fahrenheit_from_celsius(observation.temperature_max),
        temp_low_f: fahrenheit_from_celsius(observation.temperature_min),
        humidity: observation
            .humidity_mean
            .map_or(Percentage::ZERO, Percentage::from_f64),
        wind_speed_mph: mph_from_kmh(observation.wind_speed_max),
        wind_gust_mph: observation.wind_gusts_max.map(mph_from_kmh),
        precip_probability,
        precip_type: precipitation_type_for(observation.weather_code),
        precip_amount_in,
        uv_index: observation.uv_index_max.map(round_tenths),
        cloud_cover: observation.cloud_cover_mean.map(Percentage::from_f64),
        sunrise: observation.sunrise,
        sunset: observation.sunset,
    }
}

/// Map integration weather error to application error
fn map_error(source: &'static str, err: WeatherError) -> ApplicationError {
    match err {
        WeatherError::InvalidCoordinates => DomainError::from(InvalidCoordinates).into(),
        other => ApplicationError::SourceUnavailable(format!("{source}: {other}")),
    }
}

fn to_records(observations: &[DailyObservation], range: DateRange) -> Vec<DailyWeatherRecord> {
    observations
        .iter()
        .filter(|o| range.contains(o.date))
        .map(to_record)
        .collect()
}

/// Forecast source backed by the Open-Meteo forecast endpoint
///
/// The horizon counts days including today, so a 16-day horizon covers
/// `today..=today + 15`.
pub struct OpenMeteoForecastSource {
    client: Arc<dyn WeatherClient>,
    clock: Arc<dyn ClockPort>,
    horizon_days: u8,
    retry: RetryConfig,
}

impl fmt::Debug for OpenMeteoForecastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenMeteoForecastSource")
            .field("horizon_days", &self.horizon_days)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OpenMeteoForecastSource {
    pub const NAME: &'static str = "open-meteo-forecast";

    pub fn new(client: Arc<dyn WeatherClient>, clock: Arc<dyn ClockPort>, horizon_days: u8) -> Self {
        Self {
            client,
            clock,
            horizon_days: horizon_days.max(1),
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Last day the forecast endpoint can answer for
    pub fn last_forecast_day(&self) -> NaiveDate {
        self.clock.today() + Duration::days(i64::from(self.horizon_days) - 1)
    }
}

#[async_trait]
impl WeatherSourcePort for OpenMeteoForecastSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(skip_all, fields(source = Self::NAME, start = %range.start(), end = %range.end()))]
    async fn fetch(
        &self,
        location: &GeoLocation,
        range: DateRange,
    ) -> Result<Vec<DailyWeatherRecord>, ApplicationError> {
        let client = self.client.as_ref();
        let observations = retry(&self.retry, || async move {
            client
                .daily_forecast(location.latitude(), location.longitude(), range.start(), range.end())
                .await
                .map_err(|e| map_error(Self::NAME, e))
        })
        .await?;

        let records = to_records(&observations, range);
        debug!(days = records.len(), "Retrieved daily forecast");
        Ok(records)
    }

    fn supports_range(&self, range: DateRange) -> bool {
        range.start() >= self.clock.today() && range.end() <= self.last_forecast_day()
    }
}

/// Historical source backed by the Open-Meteo archive endpoint
///
/// Answers for any range that ends before today.
pub struct OpenMeteoHistoricalSource {
    client: Arc<dyn WeatherClient>,
    clock: Arc<dyn ClockPort>,
    retry: RetryConfig,
}

impl fmt::Debug for OpenMeteoHistoricalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenMeteoHistoricalSource")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OpenMeteoHistoricalSource {
    pub const NAME: &'static str = "open-meteo-archive";

    pub fn new(client: Arc<dyn WeatherClient>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            client,
            clock,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl WeatherSourcePort for OpenMeteoHistoricalSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(skip_all, fields(source = Self::NAME, start = %range.start(), end = %range.end()))]
    async fn fetch(
        &self,
        location: &GeoLocation,
        range: DateRange,
    ) -> Result<Vec<DailyWeatherRecord>, ApplicationError> {
        let client = self.client.as_ref();
        let observations = retry(&self.retry, || async move {
            client
                .daily_history(location.latitude(), location.longitude(), range.start(), range.end())
                .await
                .map_err(|e| map_error(Self::NAME, e))
        })
        .await?;

        let records = to_records(&observations, range);
        debug!(days = records.len(), "Retrieved archived days");
        Ok(records)
    }

    fn supports_range(&self, range: DateRange) -> bool {
        range.end() < self.clock.today()
    }
}
