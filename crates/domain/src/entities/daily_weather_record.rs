//! Daily weather record, the unit of weather data

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Percentage, PrecipitationType};

/// One calendar day of weather, in imperial units
///
/// Records are plain values: they are copied between the cache, the sources
/// and the scoring engine, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeatherRecord {
    /// Calendar day this record describes
    pub date: NaiveDate,
    /// Daily high temperature in °F
    pub temp_high_f: f64,
    /// Daily low temperature in °F
    pub temp_low_f: f64,
    /// Mean relative humidity
    pub humidity: Percentage,
    /// Maximum sustained wind speed in mph
    pub wind_speed_mph: f64,
    /// Maximum wind gust in mph, when reported
    pub wind_gust_mph: Option<f64>,
    /// Probability of precipitation
    pub precip_probability: Percentage,
    /// Dominant precipitation category
    pub precip_type: PrecipitationType,
    /// Total precipitation in inches
    pub precip_amount_in: f64,
    /// Maximum UV index, when reported
    pub uv_index: Option<f64>,
    /// Mean cloud cover, when reported
    pub cloud_cover: Option<Percentage>,
    /// Local sunrise time
    pub sunrise: Option<NaiveDateTime>,
    /// Local sunset time
    pub sunset: Option<NaiveDateTime>,
}

impl DailyWeatherRecord {
    /// A dry, calm record with only the temperatures set
    ///
    /// Useful as a starting point; sources fill in every field they know.
    #[must_use]
    pub const fn new(date: NaiveDate, temp_high_f: f64, temp_low_f: f64) -> Self {
        Self {
            date,
            temp_high_f,
            temp_low_f,
            humidity: Percentage::ZERO,
            wind_speed_mph: 0.0,
            wind_gust_mph: None,
            precip_probability: Percentage::ZERO,
            precip_type: PrecipitationType::None,
            precip_amount_in: 0.0,
            uv_index: None,
            cloud_cover: None,
            sunrise: None,
            sunset: None,
        }
    }

    /// Whether any measurable precipitation fell
    #[must_use]
    pub fn is_wet(&self) -> bool {
        self.precip_amount_in > 0.0
    }
}

/// Round to one decimal place (temperatures, wind speeds)
#[must_use]
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (precipitation amounts)
#[must_use]
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
