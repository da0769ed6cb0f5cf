//! Weather cache backends
//!
//! Both implement `WeatherCachePort`:
//! - `MokaWeatherCache`: bounded in-memory snapshots per location
//! - `RedbWeatherCache`: embedded persistent store, one transaction per batch

mod moka_cache;
mod redb_cache;

pub use moka_cache::{DEFAULT_MAX_LOCATIONS, MokaWeatherCache};
pub use redb_cache::RedbWeatherCache;
