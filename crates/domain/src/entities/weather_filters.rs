//! User weather preferences
//!
//! Every field is optional. Only fields that are explicitly set take part in
//! scoring; an unset bound is not the same thing as a zero bound.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::value_objects::PrecipitationType;

/// Weather preferences used to score locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherFilters {
    /// Lowest acceptable daily low in °F
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_min_f: Option<f64>,
    /// Highest acceptable daily high in °F
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_max_f: Option<f64>,
    /// Highest acceptable relative humidity in %
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_max: Option<f64>,
    /// Highest acceptable wind speed in mph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_max_mph: Option<f64>,
    /// Highest acceptable precipitation probability in %
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_chance_max: Option<f64>,
    /// Whitelist of acceptable precipitation categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<BTreeSet<PrecipitationType>>,
    /// Blacklist of unacceptable precipitation categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_types: Option<BTreeSet<PrecipitationType>>,
    /// Highest acceptable air quality index (accepted, not scored)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi_max: Option<u16>,
}

impl WeatherFilters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_temp_min(mut self, fahrenheit: f64) -> Self {
        self.temp_min_f = Some(fahrenheit);
        self
    }

    #[must_use]
    pub const fn with_temp_max(mut self, fahrenheit: f64) -> Self {
        self.temp_max_f = Some(fahrenheit);
        self
    }

    #[must_use]
    pub const fn with_humidity_max(mut self, percent: f64) -> Self {
        self.humidity_max = Some(percent);
        self
    }

    #[must_use]
    pub const fn with_wind_speed_max(mut self, mph: f64) -> Self {
        self.wind_speed_max_mph = Some(mph);
        self
    }

    #[must_use]
    pub const fn with_precip_chance_max(mut self, percent: f64) -> Self {
        self.precip_chance_max = Some(percent);
        self
    }

    #[must_use]
    pub fn with_allowed_types(mut self, types: impl IntoIterator<Item = PrecipitationType>) -> Self {
        self.allowed_types = Some(types.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_excluded_types(
        mut self,
        types: impl IntoIterator<Item = PrecipitationType>,
    ) -> Self {
        self.excluded_types = Some(types.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn with_aqi_max(mut self, aqi: u16) -> Self {
        self.aqi_max = Some(aqi);
        self
    }

    /// Temperature participates when either bound is set
    #[must_use]
    pub const fn temperature_active(&self) -> bool {
        self.temp_min_f.is_some() || self.temp_max_f.is_some()
    }

    #[must_use]
    pub const fn humidity_active(&self) -> bool {
        self.humidity_max.is_some()
    }

    #[must_use]
    pub const fn wind_active(&self) -> bool {
        self.wind_speed_max_mph.is_some()
    }

    /// Precipitation participates when any of its three checks is set
    #[must_use]
    pub const fn precipitation_active(&self) -> bool {
        self.allowed_types.is_some()
            || self.excluded_types.is_some()
            || self.precip_chance_max.is_some()
    }

    /// Whether no scored category is active
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        !(self.temperature_active()
            || self.humidity_active()
            || self.wind_active()
            || self.precipitation_active())
    }
}
