//! Application-level errors

use chrono::NaiveDate;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A weather source could not answer (transport, status, parse or timeout)
    #[error("Weather source unavailable: {0}")]
    SourceUnavailable(String),

    /// The averaging fallback found no usable prior year
    #[error("Insufficient history for {date}: no usable data in {years_attempted} prior years")]
    InsufficientHistory {
        date: NaiveDate,
        years_attempted: u32,
    },

    /// Writing a batch to the cache failed
    #[error("Cache write failed: {0}")]
    CacheWriteFailed(String),

    /// Reading from the cache failed
    #[error("Cache read failed: {0}")]
    CacheReadFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}
