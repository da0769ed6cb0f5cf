//! Open-Meteo weather integration
//!
//! Client for the Open-Meteo forecast API and historical archive API
//! (<https://open-meteo.com>). Daily data only; no API key required.

pub mod client;
mod models;

pub use client::{
    MAX_FORECAST_HORIZON_DAYS, OpenMeteoClient, WeatherClient, WeatherConfig, WeatherError,
};
pub use models::DailyObservation;
