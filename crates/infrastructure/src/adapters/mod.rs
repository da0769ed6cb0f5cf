//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod json_location_store;
mod system_clock;
mod weather_adapter;

pub use json_location_store::JsonLocationStore;
pub use system_clock::SystemClock;
pub use weather_adapter::{
    OpenMeteoForecastSource, OpenMeteoHistoricalSource, fahrenheit_from_celsius, inches_from_mm,
    mph_from_kmh, precipitation_type_for,
};
