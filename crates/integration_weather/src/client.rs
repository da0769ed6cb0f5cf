//! Open-Meteo weather client
//!
//! HTTP client for the Open-Meteo forecast and historical archive APIs.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{ApiErrorBody, ApiResponse, DailyData, DailyObservation};

/// Daily variables requested from the forecast endpoint
const FORECAST_DAILY: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
    relative_humidity_2m_mean,wind_speed_10m_max,wind_gusts_10m_max,precipitation_sum,\
    precipitation_probability_max,uv_index_max,cloud_cover_mean,sunrise,sunset";

/// Daily variables requested from the archive endpoint
const ARCHIVE_DAILY: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
    relative_humidity_2m_mean,wind_speed_10m_max,wind_gusts_10m_max,precipitation_sum,\
    cloud_cover_mean,sunrise,sunset";

/// Longest forecast horizon Open-Meteo serves, in days after today
pub const MAX_FORECAST_HORIZON_DAYS: u8 = 16;

/// Weather client errors
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Connection to the weather service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the weather service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Failed to parse response from weather service
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid coordinates provided
    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Weather service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast API base URL (default: <https://api.open-meteo.com/v1>)
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,

    /// Historical archive API base URL
    /// (default: <https://archive-api.open-meteo.com/v1>)
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Forecast days served, counting today (1-16, default: 16)
    #[serde(default = "default_forecast_horizon_days")]
    pub forecast_horizon_days: u8,
}

fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

const fn default_timeout() -> u64 {
    10
}

const fn default_forecast_horizon_days() -> u8 {
    MAX_FORECAST_HORIZON_DAYS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            archive_base_url: default_archive_base_url(),
            timeout_secs: default_timeout(),
            forecast_horizon_days: default_forecast_horizon_days(),
        }
    }
}

impl WeatherConfig {
    /// Forecast horizon clamped to what the provider serves
    #[must_use]
    pub fn horizon_days(&self) -> u8 {
        self.forecast_horizon_days.clamp(1, MAX_FORECAST_HORIZON_DAYS)
    }
}

/// Weather client trait for fetching daily weather data
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Daily forecast for `[start, end]`
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>, WeatherError>;

    /// Observed daily history for `[start, end]`
    async fn daily_history(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>, WeatherError>;
}

/// Open-Meteo HTTP client implementation
#[derive(Debug)]
pub struct OpenMeteoClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    /// Create a new Open-Meteo client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, WeatherError> {
        Self::new(WeatherConfig::default())
    }

    /// Configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Validate coordinates
    fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinates);
        }
        Ok(())
    }

    /// Query parameters shared by both endpoints
    fn daily_query(
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        daily: &str,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("daily", daily.to_string()),
            ("timezone", "auto".to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ]
    }

    async fn get_daily(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<DailyObservation>, WeatherError> {
        debug!(url = %url, "Fetching daily weather");

        let response = self.client.get(url).query(query).send().await.map_err(|e| {
            if e.is_timeout() {
                WeatherError::Timeout(e.to_string())
            } else if e.is_connect() {
                WeatherError::ConnectionFailed(e.to_string())
            } else {
                WeatherError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(WeatherError::RateLimitExceeded);
        }
        if status.is_server_error() {
            return Err(WeatherError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let reason = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.reason)
                .unwrap_or_default();
            return Err(WeatherError::RequestFailed(format!("HTTP {status} {reason}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.to_string()))?;

        let daily = api_response.daily.ok_or_else(|| {
            WeatherError::ParseError("No daily data in response".to_string())
        })?;

        Self::parse_daily(&daily)
    }

    /// Turn column arrays into one observation per day
    ///
    /// Days without both temperatures are skipped: the archive reports them
    /// as `null` until the data is available.
    fn parse_daily(daily: &DailyData) -> Result<Vec<DailyObservation>, WeatherError> {
        let mut days = Vec::with_capacity(daily.time.len());

        for (i, raw_date) in daily.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map_err(|e| WeatherError::ParseError(format!("Invalid date: {e}")))?;

            let (Some(temperature_max), Some(temperature_min)) =
                (at(&daily.temperature_2m_max, i), at(&daily.temperature_2m_min, i))
            else {
                debug!(date = %date, "Skipping day without temperatures");
                continue;
            };

            let weather_code = daily.weather_code.get(i).copied().flatten().unwrap_or(0);

            days.push(DailyObservation {
                date,
                weather_code,
                temperature_max,
                temperature_min,
                humidity_mean: at(&daily.relative_humidity_2m_mean, i),
                wind_speed_max: at(&daily.wind_speed_10m_max, i).unwrap_or(0.0),
                wind_gusts_max: at(&daily.wind_gusts_10m_max, i),
                precipitation_sum: at(&daily.precipitation_sum, i).unwrap_or(0.0),
                precipitation_probability: at(&daily.precipitation_probability_max, i),
                uv_index_max: at(&daily.uv_index_max, i),
                cloud_cover_mean: at(&daily.cloud_cover_mean, i),
                sunrise: Self::parse_local(daily.sunrise.get(i))?,
                sunset: Self::parse_local(daily.sunset.get(i))?,
            });
        }

        Ok(days)
    }

    fn parse_local(value: Option<&Option<String>>) -> Result<Option<NaiveDateTime>, WeatherError> {
        value
            .and_then(Option::as_deref)
            .map(Self::parse_datetime)
            .transpose()
    }

    /// Parse a local datetime string (`timezone=auto` responses carry no offset)
    fn parse_datetime(s: &str) -> Result<NaiveDateTime, WeatherError> {
        // Try ISO 8601 format first (2026-02-05T14:00)
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
            return Ok(dt);
        }

        // Try with seconds
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(dt);
        }

        // Try RFC 3339, keeping the wall-clock time
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Ok(dt.naive_local());
        }

        Err(WeatherError::ParseError(format!(
            "Invalid datetime format: {s}"
        )))
    }
}

fn at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten().filter(|v| v.is_finite())
}

#[async_trait]
impl WeatherClient for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;
        let url = format!("{}/forecast", self.config.forecast_base_url);
        let query = Self::daily_query(latitude, longitude, start, end, FORECAST_DAILY);
        self.get_daily(&url, &query).await
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn daily_history(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;
        let url = format!("{}/archive", self.config.archive_base_url);
        let query = Self::daily_query(latitude, longitude, start, end, ARCHIVE_DAILY);
        self.get_daily(&url, &query).await
    }
}
