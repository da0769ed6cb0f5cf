//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod clock_port;
mod location_store_port;
mod weather_cache_port;
mod weather_source_port;

pub use clock_port::{ClockPort, FixedClock};
pub use location_store_port::LocationStorePort;
pub use weather_cache_port::{CacheStats, WeatherCachePort};
#[cfg(test)]
pub use weather_cache_port::MockWeatherCachePort;
pub use weather_source_port::WeatherSourcePort;
#[cfg(test)]
pub use weather_source_port::MockWeatherSourcePort;
