//! Resolution and search tuning.

use application::{DEFAULT_FALLBACK_YEARS, SearchSettings};
use serde::{Deserialize, Serialize};

/// Resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Prior years the averaging fallback samples (default: 5)
    #[serde(default = "default_fallback_years")]
    pub fallback_years: u32,
}

const fn default_fallback_years() -> u32 {
    DEFAULT_FALLBACK_YEARS
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fallback_years: default_fallback_years(),
        }
    }
}

/// Batch search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Locations resolved concurrently per batch (default: 10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Score counted as high for early stop (default: 70)
    #[serde(default = "default_high_score_threshold")]
    pub high_score_threshold: u8,

    /// Early stop once high scorers reach this multiple of the limit (default: 2)
    #[serde(default = "default_early_stop_factor")]
    pub early_stop_factor: usize,

    /// Result limit when the caller gives none (default: 10)
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

const fn default_batch_size() -> usize {
    10
}

const fn default_high_score_threshold() -> u8 {
    70
}

const fn default_early_stop_factor() -> usize {
    2
}

const fn default_limit() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            high_score_threshold: default_high_score_threshold(),
            early_stop_factor: default_early_stop_factor(),
            default_limit: default_limit(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn settings(&self) -> SearchSettings {
        SearchSettings {
            batch_size: self.batch_size,
            high_score_threshold: self.high_score_threshold,
            early_stop_factor: self.early_stop_factor,
        }
    }
}
