//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports: Open-Meteo weather sources, the
//! moka and redb weather caches, the JSON location store and the system
//! clock. Also owns configuration loading, logging setup and retries.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod retry;
pub mod telemetry;

pub use adapters::*;
pub use cache::{MokaWeatherCache, RedbWeatherCache};
pub use config::{AppConfig, CacheBackend, CacheConfig, ResolutionConfig, SearchConfig};
pub use retry::{RetryConfig, Retryable, retry};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
