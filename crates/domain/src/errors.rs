//! Domain-level errors

use chrono::NaiveDate;
use thiserror::Error;

use crate::value_objects::{InvalidCoordinates, InvalidPercentage};

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Coordinates outside the valid latitude/longitude range
    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    /// Percentage outside 0-100
    #[error(transparent)]
    InvalidPercentage(#[from] InvalidPercentage),

    /// Date range whose end lies before its start
    #[error("Invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Location identifier that cannot be used as a key
    #[error("Invalid location id: {0:?}")]
    InvalidLocationId(String),

    /// Unknown precipitation category name
    #[error("Unknown precipitation type: {0}")]
    UnknownPrecipitationType(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}
