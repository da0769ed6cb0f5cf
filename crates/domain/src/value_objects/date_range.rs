//! Inclusive calendar date range
//!
//! Date enumeration is a pure function of the two endpoints; nothing here
//! mutates a running cursor.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// An inclusive `[start, end]` range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a validated range
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDateRange` if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day
    #[must_use]
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the range
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range (inclusive)
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days in the range, at least 1
    #[must_use]
    pub fn len_days(&self) -> u32 {
        let span = (self.end - self.start).num_days() + 1;
        u32::try_from(span).unwrap_or(u32::MAX)
    }

    /// Whether `day` lies inside the range
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Whether the whole range lies inside `other`
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        other.contains(self.start) && other.contains(self.end)
    }

    /// Ordered sequence of every calendar day in the range
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use domain::value_objects::DateRange;
    ///
    /// let range = DateRange::new(
    ///     NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    /// )
    /// .unwrap();
    /// let days: Vec<_> = range.days().map(|d| d.to_string()).collect();
    /// assert_eq!(days, ["2024-02-28", "2024-02-29", "2024-03-01"]);
    /// ```
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Split ascending dates into maximal runs of consecutive days
    ///
    /// Input must be sorted ascending; duplicates are ignored.
    #[must_use]
    pub fn contiguous_runs(dates: &[NaiveDate]) -> Vec<Self> {
        let mut runs: Vec<Self> = Vec::new();
        for &day in dates {
            match runs.last_mut() {
                Some(run) if run.end == day => {},
                Some(run) if run.end.succ_opt() == Some(day) => run.end = day,
                _ => runs.push(Self::single(day)),
            }
        }
        runs
    }
}

/// The same month/day in `year`; Feb 29 maps to Feb 28 in non-leap years
#[must_use]
pub fn same_day_in_year(day: NaiveDate, year: i32) -> Option<NaiveDate> {
    day.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, day.month(), day.day() - 1))
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveDate,
            end: NaiveDate,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}
