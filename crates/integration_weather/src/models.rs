//! Weather data models
//!
//! Types for representing daily weather data from the Open-Meteo forecast and
//! archive APIs, in the metric units the provider delivers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One day of provider data, metric units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    /// Local calendar day
    pub date: NaiveDate,
    /// WMO weather code, 0 when the provider left it out
    pub weather_code: u8,
    /// Maximum temperature in °C
    pub temperature_max: f64,
    /// Minimum temperature in °C
    pub temperature_min: f64,
    /// Mean relative humidity in %
    pub humidity_mean: Option<f64>,
    /// Maximum wind speed in km/h
    pub wind_speed_max: f64,
    /// Maximum wind gust in km/h
    pub wind_gusts_max: Option<f64>,
    /// Total precipitation in mm
    pub precipitation_sum: f64,
    /// Maximum precipitation probability in % (forecast only)
    pub precipitation_probability: Option<f64>,
    /// Maximum UV index (forecast only)
    pub uv_index_max: Option<f64>,
    /// Mean cloud cover in %
    pub cloud_cover_mean: Option<f64>,
    /// Local sunrise time
    pub sunrise: Option<NaiveDateTime>,
    /// Local sunset time
    pub sunset: Option<NaiveDateTime>,
}

/// Raw daily data from API
///
/// Columns are parallel arrays indexed by day. The archive API reports
/// `null` for days it has no data for yet, so every value column is optional
/// per element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<u8>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gusts_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index_max: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<Option<String>>,
    #[serde(default)]
    pub sunset: Vec<Option<String>>,
}

/// Raw API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub daily: Option<DailyData>,
}

/// Error body returned by Open-Meteo on 400 responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub reason: Option<String>,
}
