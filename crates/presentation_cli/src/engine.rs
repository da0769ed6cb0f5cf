//! Wiring of ports, adapters and services from configuration

use std::fmt;
use std::sync::Arc;

use application::{
    ApplicationError, BatchSearchService, ClockPort, WeatherCachePort, WeatherResolutionService,
    WeatherSourcePort,
};
use infrastructure::{
    AppConfig, CacheBackend, MokaWeatherCache, OpenMeteoForecastSource,
    OpenMeteoHistoricalSource, RedbWeatherCache, SystemClock,
};
use integration_weather::{OpenMeteoClient, WeatherClient};
use tracing::debug;

/// Fully wired resolution and search services
pub struct Engine {
    pub cache: Arc<dyn WeatherCachePort>,
    pub resolver: Arc<WeatherResolutionService>,
    pub search: BatchSearchService,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build against the system clock
    pub fn build(config: &AppConfig) -> Result<Self, ApplicationError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &AppConfig,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, ApplicationError> {
        let cache = Self::cache(config)?;

        let client: Arc<dyn WeatherClient> = Arc::new(
            OpenMeteoClient::new(config.weather.clone())
                .map_err(|e| ApplicationError::Configuration(e.to_string()))?,
        );
        let forecast: Arc<dyn WeatherSourcePort> = Arc::new(
            OpenMeteoForecastSource::new(
                Arc::clone(&client),
                Arc::clone(&clock),
                config.weather.horizon_days(),
            )
            .with_retry(config.retry.clone()),
        );
        let historical: Arc<dyn WeatherSourcePort> = Arc::new(
            OpenMeteoHistoricalSource::new(client, Arc::clone(&clock))
                .with_retry(config.retry.clone()),
        );

        let resolver = Arc::new(
            WeatherResolutionService::new(Arc::clone(&cache), forecast, historical, clock)
                .with_freshness(config.cache.freshness())
                .with_fallback_years(config.resolution.fallback_years),
        );
        let search =
            BatchSearchService::new(Arc::clone(&resolver)).with_settings(config.search.settings());

        Ok(Self {
            cache,
            resolver,
            search,
        })
    }

    fn cache(config: &AppConfig) -> Result<Arc<dyn WeatherCachePort>, ApplicationError> {
        debug!(backend = ?config.cache.backend, "Opening weather cache");
        Ok(match config.cache.backend {
            CacheBackend::Memory => Arc::new(MokaWeatherCache::new(config.cache.max_locations)),
            CacheBackend::Redb => Arc::new(RedbWeatherCache::open(&config.cache.path)?),
        })
    }
}
