//! Averaging fallback
//!
//! Estimates a day's weather from the same calendar date in prior years.

use std::{fmt, sync::Arc};

use chrono::{Datelike, NaiveDate};
use domain::{
    DailyWeatherRecord, DateRange, GeoLocation, Percentage, PrecipitationType, round_hundredths,
    round_tenths, same_day_in_year,
};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::{error::ApplicationError, ports::WeatherSourcePort};

/// Default number of prior years sampled per estimate
pub const DEFAULT_FALLBACK_YEARS: u32 = 5;

/// Multi-year historical averaging for dates no source can answer directly
pub struct AveragingFallback {
    historical: Arc<dyn WeatherSourcePort>,
    years: u32,
}

impl fmt::Debug for AveragingFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AveragingFallback")
            .field("source", &self.historical.name())
            .field("years", &self.years)
            .finish()
    }
}

impl AveragingFallback {
    /// Create a fallback sampling `years` prior years (at least one)
    pub fn new(historical: Arc<dyn WeatherSourcePort>, years: u32) -> Self {
        Self {
            historical,
            years: years.max(1),
        }
    }

    /// Number of prior years sampled
    pub const fn years(&self) -> u32 {
        self.years
    }

    /// Estimate the weather for `target`
    ///
    /// Years whose fetch fails or returns nothing for the day are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::InsufficientHistory` if no sampled year
    /// produced a record.
    #[instrument(skip(self), fields(years = self.years))]
    pub async fn estimate(
        &self,
        location: &GeoLocation,
        target: NaiveDate,
    ) -> Result<DailyWeatherRecord, ApplicationError> {
        let sample_days: Vec<NaiveDate> = (1..=self.years)
            .filter_map(|back| {
                let year = target.year().checked_sub(i32::try_from(back).ok()?)?;
                same_day_in_year(target, year)
            })
            .collect();

        let fetches = sample_days.iter().map(|day| async move {
            let result = self.historical.fetch(location, DateRange::single(*day)).await;
            (*day, result)
        });

        // join_all keeps input order, so samples stay most-recent-year first
        let mut samples = Vec::with_capacity(sample_days.len());
        for (day, result) in join_all(fetches).await {
            match result {
                Ok(records) => match records.into_iter().find(|r| r.date == day) {
                    Some(record) => samples.push(record),
                    None => debug!(sample = %day, "No historical record for sampled day"),
                },
                Err(e) => debug!(sample = %day, error = %e, "Skipping sampled year"),
            }
        }

        if samples.is_empty() {
            warn!(date = %target, "No usable history for averaging fallback");
            return Err(ApplicationError::InsufficientHistory {
                date: target,
                years_attempted: self.years,
            });
        }

        debug!(date = %target, sampled = samples.len(), "Averaged historical estimate");
        Ok(aggregate(target, &samples))
    }
}

/// Combine same-date samples (most recent year first) into one estimate
pub fn aggregate(target: NaiveDate, samples: &[DailyWeatherRecord]) -> DailyWeatherRecord {
    let wet_share = share(samples.iter().filter(|r| r.is_wet()).count(), samples.len());
    let latest = samples.first();

    DailyWeatherRecord {
        date: target,
        temp_high_f: round_tenths(mean(samples.iter().map(|r| r.temp_high_f))),
        temp_low_f: round_tenths(mean(samples.iter().map(|r| r.temp_low_f))),
        humidity: Percentage::from_f64(mean(samples.iter().map(|r| r.humidity.as_f64()))),
        wind_speed_mph: round_tenths(mean(samples.iter().map(|r| r.wind_speed_mph))),
        wind_gust_mph: None,
        precip_probability: Percentage::from_f64(wet_share * 100.0),
        precip_type: mode(samples.iter().map(|r| r.precip_type)),
        precip_amount_in: round_hundredths(mean(samples.iter().map(|r| r.precip_amount_in))),
        uv_index: None,
        cloud_cover: None,
        sunrise: latest
            .and_then(|r| r.sunrise)
            .map(|t| target.and_time(t.time())),
        sunset: latest
            .and_then(|r| r.sunset)
            .map(|t| target.and_time(t.time())),
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[allow(clippy::cast_precision_loss)]
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Most frequent category; ties go to the one seen first
fn mode(kinds: impl Iterator<Item = PrecipitationType>) -> PrecipitationType {
    let mut counts: Vec<(PrecipitationType, usize)> = Vec::new();
    for kind in kinds {
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }

    let mut best: Option<(PrecipitationType, usize)> = None;
    for (kind, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((kind, n));
        }
    }
    best.map_or(PrecipitationType::None, |(kind, _)| kind)
}
