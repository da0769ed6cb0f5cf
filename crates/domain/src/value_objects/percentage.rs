//! Percentage value object
//!
//! Represents a validated whole-number percentage (0-100%), used for relative
//! humidity, precipitation probability and cloud cover.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::Percentage;
//!
//! let p = Percentage::new(65).expect("valid percentage");
//! assert_eq!(p.value(), 65);
//!
//! assert!(Percentage::new(101).is_err());
//! assert_eq!(Percentage::clamped(150).value(), 100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a percentage value is out of range
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid percentage: {0}% is out of range (must be 0-100)")]
pub struct InvalidPercentage(pub u8);

/// Whole-number percentage (0-100%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Percentage(u8);

impl Percentage {
    /// Maximum valid percentage
    pub const MAX: u8 = 100;

    /// Zero percent
    pub const ZERO: Self = Self(0);

    /// One hundred percent
    pub const FULL: Self = Self(Self::MAX);

    /// Create a new validated percentage
    ///
    /// # Errors
    ///
    /// Returns `InvalidPercentage` if the value is greater than 100.
    pub const fn new(value: u8) -> Result<Self, InvalidPercentage> {
        if value > Self::MAX {
            Err(InvalidPercentage(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create a percentage, clamping values above 100
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Round a measured value to the nearest whole percent, clamped to 0-100
    ///
    /// NaN maps to zero.
    ///
    /// ```
    /// use domain::value_objects::Percentage;
    ///
    /// assert_eq!(Percentage::from_f64(64.5).value(), 65);
    /// assert_eq!(Percentage::from_f64(-3.0).value(), 0);
    /// assert_eq!(Percentage::from_f64(140.2).value(), 100);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        // clamped into 0..=100 before the cast
        Self(value.round().clamp(0.0, f64::from(Self::MAX)) as u8)
    }

    /// Get the percentage value as a u8
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Get the percentage as a float for arithmetic
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Percentage {
    type Error = InvalidPercentage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

/// Custom deserialization that validates percentage values
impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_new_valid() {
        assert!(Percentage::new(0).is_ok());
        assert!(Percentage::new(100).is_ok());
    }

    #[test]
    fn test_percentage_new_invalid() {
        let result = Percentage::new(101);
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid percentage: 101% is out of range (must be 0-100)"
        );
    }

    #[test]
    fn test_percentage_clamped() {
        assert_eq!(Percentage::clamped(100).value(), 100);
        assert_eq!(Percentage::clamped(255).value(), 100);
    }

    #[test]
    fn test_from_f64_rounds_and_clamps() {
        assert_eq!(Percentage::from_f64(33.4).value(), 33);
        assert_eq!(Percentage::from_f64(33.5).value(), 34);
        assert_eq!(Percentage::from_f64(f64::NAN), Percentage::ZERO);
        assert_eq!(Percentage::from_f64(1e9), Percentage::FULL);
    }

    #[test]
    fn test_display() {
        assert_eq!(Percentage::new(40).unwrap().to_string(), "40%");
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let bad: Result<Percentage, _> = serde_json::from_str("150");
        assert!(bad.is_err());
        let good: Percentage = serde_json::from_str("15").unwrap();
        assert_eq!(good.value(), 15);
    }
}
