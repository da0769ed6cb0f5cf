//! Cache backend and freshness configuration.

use std::path::PathBuf;

use chrono::Duration;
use domain::FreshnessPolicy;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_MAX_LOCATIONS;

/// Which cache backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-memory moka cache, lost on exit
    #[default]
    Memory,
    /// Persistent redb file
    Redb,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Database file for the redb backend
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Forecast-class entries go stale after this many hours (default: 6)
    #[serde(default = "default_forecast_ttl_hours")]
    pub forecast_ttl_hours: u32,

    /// Historical-class entries go stale after this many days (default: 7)
    #[serde(default = "default_historical_ttl_days")]
    pub historical_ttl_days: u32,

    /// Maximum number of locations held by the memory backend
    #[serde(default = "default_max_locations")]
    pub max_locations: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("fairweather-cache.redb")
}

const fn default_forecast_ttl_hours() -> u32 {
    6
}

const fn default_historical_ttl_days() -> u32 {
    7
}

const fn default_max_locations() -> u64 {
    DEFAULT_MAX_LOCATIONS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
            forecast_ttl_hours: default_forecast_ttl_hours(),
            historical_ttl_days: default_historical_ttl_days(),
            max_locations: default_max_locations(),
        }
    }
}

impl CacheConfig {
    /// Freshness policy built from the configured TTLs
    #[must_use]
    pub fn freshness(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::hours(i64::from(self.forecast_ttl_hours)),
            Duration::days(i64::from(self.historical_ttl_days)),
        )
    }
}
