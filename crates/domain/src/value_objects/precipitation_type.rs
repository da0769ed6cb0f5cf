//! Canonical precipitation categories

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::DomainError;

/// Precipitation category of a day
///
/// Sources map their native condition codes into this enumeration; anything
/// unmapped is [`PrecipitationType::None`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationType {
    #[default]
    None,
    Rain,
    Snow,
    Sleet,
    FreezingRain,
    Hail,
    Drizzle,
    Thunderstorms,
    IcePellets,
    Fog,
    Mist,
    Mixed,
}

impl PrecipitationType {
    /// Every category, in declaration order
    pub const ALL: [Self; 12] = [
        Self::None,
        Self::Rain,
        Self::Snow,
        Self::Sleet,
        Self::FreezingRain,
        Self::Hail,
        Self::Drizzle,
        Self::Thunderstorms,
        Self::IcePellets,
        Self::Fog,
        Self::Mist,
        Self::Mixed,
    ];

    /// Stable snake_case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Sleet => "sleet",
            Self::FreezingRain => "freezing_rain",
            Self::Hail => "hail",
            Self::Drizzle => "drizzle",
            Self::Thunderstorms => "thunderstorms",
            Self::IcePellets => "ice_pellets",
            Self::Fog => "fog",
            Self::Mist => "mist",
            Self::Mixed => "mixed",
        }
    }

    /// Whether this is the dry category
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrecipitationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| DomainError::UnknownPrecipitationType(s.to_string()))
    }
}
