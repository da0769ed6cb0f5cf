//! Scoring results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CandidateLocation;
use crate::value_objects::Provenance;

/// Per-category aggregate scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub temperature: u8,
    pub humidity: u8,
    pub wind: u8,
    pub precipitation: u8,
    /// Always `None`: no air quality data is available to score
    pub aqi: Option<u8>,
}

impl Default for ScoreBreakdown {
    fn default() -> Self {
        Self {
            temperature: 100,
            humidity: 100,
            wind: 100,
            precipitation: 100,
            aqi: None,
        }
    }
}

/// Score of a single resolved day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayScore {
    pub date: NaiveDate,
    /// 0-100
    pub score: u8,
    /// True when every active category scored above zero
    pub passes: bool,
}

/// A location with its overall score and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLocation {
    pub location: CandidateLocation,
    /// Overall score 0-100
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    /// One entry per day that had data, in date order
    pub days: Vec<DayScore>,
    pub provenance: Provenance,
}

impl ScoredLocation {
    /// Number of scored days that passed every active filter
    #[must_use]
    pub fn passing_days(&self) -> usize {
        self.days.iter().filter(|d| d.passes).count()
    }
}
