//! Scoring service
//!
//! Scores resolved days against a user's weather filters. Only categories
//! with at least one filter field set take part; a day with no active
//! category scores a vacuous 100.

use domain::{
    CandidateLocation, DailyWeatherRecord, DayScore, Provenance, ScoreBreakdown, ScoredLocation,
    WeatherFilters,
};
use tracing::{debug, instrument};

const PERFECT: f64 = 100.0;
const TEMPERATURE_PENALTY_PER_DEGREE: f64 = 10.0;
const HUMIDITY_PENALTY_PER_POINT: f64 = 5.0;
const WIND_PENALTY_PER_MPH: f64 = 10.0;
const CHANCE_EXCESS_PENALTY: f64 = 2.0;

/// Per-category scores of one day; `None` means the category is inactive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayEvaluation {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: Option<f64>,
    pub precipitation: Option<f64>,
}

impl DayEvaluation {
    fn active(&self) -> impl Iterator<Item = f64> {
        [self.temperature, self.humidity, self.wind, self.precipitation]
            .into_iter()
            .flatten()
    }

    /// Mean of the active categories, 100 when none is active
    pub fn score(&self) -> f64 {
        mean(self.active()).unwrap_or(PERFECT)
    }

    /// Whether every active category scored above zero
    pub fn passes(&self) -> bool {
        self.active().all(|s| s > 0.0)
    }
}

/// Stateless scoring engine
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringService;

impl ScoringService {
    pub const fn new() -> Self {
        Self
    }

    /// Score every category of one day
    pub fn evaluate_day(&self, record: &DailyWeatherRecord, filters: &WeatherFilters) -> DayEvaluation {
        DayEvaluation {
            temperature: temperature_score(record, filters),
            humidity: filters
                .humidity_max
                .map(|max| over_limit(record.humidity.as_f64(), max, HUMIDITY_PENALTY_PER_POINT)),
            wind: filters
                .wind_speed_max_mph
                .map(|max| over_limit(record.wind_speed_mph, max, WIND_PENALTY_PER_MPH)),
            precipitation: precipitation_score(record, filters),
        }
    }

    /// Score one day: `(score 0-100, passes every active category)`
    pub fn score_day(&self, record: &DailyWeatherRecord, filters: &WeatherFilters) -> DayScore {
        let eval = self.evaluate_day(record, filters);
        DayScore {
            date: record.date,
            score: to_score(eval.score()),
            passes: eval.passes(),
        }
    }

    /// Score a location over its resolved records
    ///
    /// Returns `None` when there are no records: a location without data is
    /// left out rather than given an invented score.
    #[instrument(skip_all, fields(location_id = %location.id, days = records.len()))]
    pub fn score(
        &self,
        location: CandidateLocation,
        records: &[DailyWeatherRecord],
        provenance: Provenance,
        filters: &WeatherFilters,
    ) -> Option<ScoredLocation> {
        if records.is_empty() {
            debug!("No records to score");
            return None;
        }

        let evaluations: Vec<DayEvaluation> = records
            .iter()
            .map(|r| self.evaluate_day(r, filters))
            .collect();

        let temperature = mean(evaluations.iter().filter_map(|e| e.temperature));
        let humidity = mean(evaluations.iter().filter_map(|e| e.humidity));
        let wind = mean(evaluations.iter().filter_map(|e| e.wind));
        let precipitation = mean(evaluations.iter().filter_map(|e| e.precipitation));

        // equal weights over the categories the user activated
        let overall = mean([temperature, humidity, wind, precipitation].into_iter().flatten())
            .unwrap_or(PERFECT);

        let days = records
            .iter()
            .zip(&evaluations)
            .map(|(record, eval)| DayScore {
                date: record.date,
                score: to_score(eval.score()),
                passes: eval.passes(),
            })
            .collect();

        let scored = ScoredLocation {
            location,
            score: to_score(overall),
            breakdown: ScoreBreakdown {
                temperature: to_score(temperature.unwrap_or(PERFECT)),
                humidity: to_score(humidity.unwrap_or(PERFECT)),
                wind: to_score(wind.unwrap_or(PERFECT)),
                precipitation: to_score(precipitation.unwrap_or(PERFECT)),
                aqi: None,
            },
            days,
            provenance,
        };
        debug!(score = scored.score, "Scored location");
        Some(scored)
    }
}

/// Both bound violations are penalized and the penalties add up
fn temperature_score(record: &DailyWeatherRecord, filters: &WeatherFilters) -> Option<f64> {
    if !filters.temperature_active() {
        return None;
    }
    let below = filters
        .temp_min_f
        .map_or(0.0, |min| (min - record.temp_low_f).max(0.0));
    let above = filters
        .temp_max_f
        .map_or(0.0, |max| (record.temp_high_f - max).max(0.0));
    Some(floor((below + above).mul_add(-TEMPERATURE_PENALTY_PER_DEGREE, PERFECT)))
}

fn over_limit(value: f64, max: f64, penalty: f64) -> f64 {
    let excess = (value - max).max(0.0);
    floor(excess.mul_add(-penalty, PERFECT))
}

/// Running minimum of three independent checks
fn precipitation_score(record: &DailyWeatherRecord, filters: &WeatherFilters) -> Option<f64> {
    if !filters.precipitation_active() {
        return None;
    }
    let chance = record.precip_probability.as_f64();
    let kind = record.precip_type;
    let mut score = PERFECT;

    if chance > 0.0
        && filters
            .excluded_types
            .as_ref()
            .is_some_and(|excluded| excluded.contains(&kind))
    {
        score = score.min(floor(PERFECT - chance));
    }

    if chance > 0.0
        && !kind.is_none()
        && filters
            .allowed_types
            .as_ref()
            .is_some_and(|allowed| !allowed.contains(&kind))
    {
        score = score.min(floor(PERFECT - chance));
    }

    if let Some(max) = filters.precip_chance_max {
        if chance > max {
            score = score.min(floor((chance - max).mul_add(-CHANCE_EXCESS_PENALTY, PERFECT)));
        }
    }

    Some(score)
}

fn floor(score: f64) -> f64 {
    score.clamp(0.0, PERFECT)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Round half away from zero into 0-100
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(value: f64) -> u8 {
    // clamped into 0..=100 before the cast
    floor(value).round() as u8
}
