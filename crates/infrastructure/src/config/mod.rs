//! Application configuration
//!
//! Split into focused sub-modules:
//! - `cache`: backend selection and freshness TTLs
//! - `search`: fallback depth and batch search tuning
//!
//! Weather client, retry and telemetry sections reuse the config types of
//! the modules they configure.

mod cache;
mod search;

use std::path::Path;

use application::ApplicationError;
use integration_weather::{MAX_FORECAST_HORIZON_DAYS, WeatherConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use cache::{CacheBackend, CacheConfig};
pub use search::{ResolutionConfig, SearchConfig};

use crate::retry::RetryConfig;
use crate::telemetry::TelemetryConfig;

/// Environment variable prefix, e.g. `FAIRWEATHER_SEARCH__BATCH_SIZE=20`
pub const ENV_PREFIX: &str = "FAIRWEATHER";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Open-Meteo endpoints, timeout and forecast horizon
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Retry configuration for source fetches
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and environment
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required) or `config.toml`
    /// (optional), then apply environment overrides and validate
    pub fn load_from(path: Option<&Path>) -> Result<Self, ApplicationError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., FAIRWEATHER_CACHE__BACKEND=redb)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;

        config.validate()?;
        debug!(backend = ?config.cache.backend, "Configuration loaded");
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let invalid = |msg: &str| Err(ApplicationError::Configuration(msg.to_string()));

        if self.search.batch_size == 0 {
            return invalid("search.batch_size must be at least 1");
        }
        if self.search.default_limit == 0 {
            return invalid("search.default_limit must be at least 1");
        }
        if self.resolution.fallback_years == 0 {
            return invalid("resolution.fallback_years must be at least 1");
        }
        if self.cache.forecast_ttl_hours == 0 || self.cache.historical_ttl_days == 0 {
            return invalid("cache TTLs must be positive");
        }
        if !(1..=MAX_FORECAST_HORIZON_DAYS).contains(&self.weather.forecast_horizon_days) {
            return Err(ApplicationError::Configuration(format!(
                "weather.forecast_horizon_days must be within 1..={MAX_FORECAST_HORIZON_DAYS}"
            )));
        }
        if self.weather.timeout_secs == 0 {
            return invalid("weather.timeout_secs must be positive");
        }
        Ok(())
    }
}
