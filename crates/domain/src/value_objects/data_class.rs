//! Data class and provenance tags

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::DomainError;

/// Class of a cached daily record; selects the freshness rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataClass {
    /// Produced by a forecast source
    Forecast,
    /// Observed history, direct or averaged across prior years
    Historical,
}

impl DataClass {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forecast => "forecast",
            Self::Historical => "historical",
        }
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forecast" => Ok(Self::Forecast),
            "historical" => Ok(Self::Historical),
            other => Err(DomainError::ValidationError(format!(
                "unknown data class: {other}"
            ))),
        }
    }
}

/// Which data classes fed a resolved record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Every day came from a forecast-class record
    Forecast,
    /// Every day came from a historical-class record
    Historical,
    /// Both classes are present
    Mixed,
}

impl Provenance {
    /// Derive provenance from the class of every resolved day
    ///
    /// Returns `None` when there are no days at all.
    ///
    /// ```
    /// use domain::value_objects::{DataClass, Provenance};
    ///
    /// let tag = Provenance::from_classes([DataClass::Forecast, DataClass::Historical]);
    /// assert_eq!(tag, Some(Provenance::Mixed));
    /// assert_eq!(Provenance::from_classes([]), None);
    /// ```
    pub fn from_classes(classes: impl IntoIterator<Item = DataClass>) -> Option<Self> {
        classes.into_iter().fold(None, |acc, class| {
            let next = match class {
                DataClass::Forecast => Self::Forecast,
                DataClass::Historical => Self::Historical,
            };
            match acc {
                None => Some(next),
                Some(current) if current == next => Some(current),
                Some(_) => Some(Self::Mixed),
            }
        })
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forecast => f.write_str("forecast"),
            Self::Historical => f.write_str("historical"),
            Self::Mixed => f.write_str("mixed"),
        }
    }
}
