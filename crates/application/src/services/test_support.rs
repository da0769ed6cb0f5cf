//! Hand-rolled port fakes shared by service tests

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use domain::{
    CacheEntry, CandidateLocation, DailyWeatherRecord, DataClass, DateRange, GeoLocation,
    LocationId, Percentage,
};
use parking_lot::Mutex;

use crate::{
    error::ApplicationError,
    ports::{CacheStats, ClockPort, FixedClock, LocationStorePort, WeatherCachePort, WeatherSourcePort},
};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(2025, 7, 1)
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_noon(today()))
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

pub fn candidate(id: &str, latitude: f64) -> CandidateLocation {
    CandidateLocation::new(
        LocationId::new(id).unwrap(),
        GeoLocation::new(latitude, -100.0).unwrap(),
    )
}

/// In-memory cache with call counters and switchable write failures
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(LocationId, NaiveDate, DataClass), CacheEntry>>,
    pub puts: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl MemoryCache {
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn insert(&self, entry: CacheEntry) {
        self.entries
            .lock()
            .insert((entry.location_id.clone(), entry.date(), entry.class), entry);
    }

    pub fn classes_for(&self, id: &LocationId, date: NaiveDate) -> Vec<DataClass> {
        let mut classes: Vec<_> = self
            .entries
            .lock()
            .keys()
            .filter(|(i, d, _)| i == id && *d == date)
            .map(|(_, _, c)| *c)
            .collect();
        classes.sort();
        classes
    }
}

#[async_trait]
impl WeatherCachePort for MemoryCache {
    async fn get(
        &self,
        location_id: &LocationId,
        range: DateRange,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ApplicationError::CacheReadFailed("unreadable".into()));
        }
        Ok(self
            .entries
            .lock()
            .values()
            .filter(|e| &e.location_id == location_id && range.contains(e.date()))
            .cloned()
            .collect())
    }

    async fn put(
        &self,
        _location_id: &LocationId,
        entries: Vec<CacheEntry>,
    ) -> Result<(), ApplicationError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApplicationError::CacheWriteFailed("read-only".into()));
        }
        let mut map = self.entries.lock();
        for entry in entries {
            map.insert((entry.location_id.clone(), entry.date(), entry.class), entry);
        }
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.lock().len() as u64,
            ..CacheStats::default()
        }
    }
}

/// Which dates a fake source claims to support
#[derive(Debug, Clone, Copy)]
pub enum Coverage {
    /// `horizon_days` days counting today: `[today, today + horizon - 1]`
    Forecast { horizon_days: i64 },
    /// Anything before today
    Historical,
}

/// Deterministic source: the daily high equals the location's latitude
#[derive(Debug)]
pub struct FakeSource {
    name: &'static str,
    coverage: Coverage,
    clock: Arc<FixedClock>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    /// Years for which every fetch fails
    pub failing_years: Mutex<Vec<i32>>,
    /// Days silently left out of responses
    pub gaps: Mutex<Vec<NaiveDate>>,
    /// Latitudes whose fetches panic
    pub panic_latitude: Mutex<Option<f64>>,
}

impl FakeSource {
    pub fn forecast(clock: Arc<FixedClock>, horizon_days: i64) -> Self {
        Self::new("fake-forecast", Coverage::Forecast { horizon_days }, clock)
    }

    pub fn historical(clock: Arc<FixedClock>) -> Self {
        Self::new("fake-historical", Coverage::Historical, clock)
    }

    fn new(name: &'static str, coverage: Coverage, clock: Arc<FixedClock>) -> Self {
        Self {
            name,
            coverage,
            clock,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            failing_years: Mutex::new(Vec::new()),
            gaps: Mutex::new(Vec::new()),
            panic_latitude: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn record(location: &GeoLocation, date: NaiveDate) -> DailyWeatherRecord {
        let mut record = DailyWeatherRecord::new(date, location.latitude(), location.latitude() - 15.0);
        record.humidity = Percentage::new(40).unwrap();
        record.wind_speed_mph = 8.0;
        record
    }
}

#[async_trait]
impl WeatherSourcePort for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(
        &self,
        location: &GeoLocation,
        range: DateRange,
    ) -> Result<Vec<DailyWeatherRecord>, ApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.panic_latitude.lock() == Some(location.latitude()) {
            panic!("fake source exploded");
        }
        if self.fail.load(Ordering::SeqCst)
            || self.failing_years.lock().contains(&range.start().year())
        {
            return Err(ApplicationError::SourceUnavailable(format!("{} down", self.name)));
        }
        let gaps = self.gaps.lock().clone();
        Ok(range
            .days()
            .filter(|d| !gaps.contains(d))
            .map(|d| Self::record(location, d))
            .collect())
    }

    fn supports_range(&self, range: DateRange) -> bool {
        let today = self.clock.today();
        match self.coverage {
            Coverage::Forecast { horizon_days } => {
                range.start() >= today && range.end() < today + Duration::days(horizon_days)
            },
            Coverage::Historical => range.end() < today,
        }
    }
}

/// Fixed list of candidates
#[derive(Debug, Default)]
pub struct StaticLocations(pub Vec<CandidateLocation>);

#[async_trait]
impl LocationStorePort for StaticLocations {
    async fn list(&self, region: Option<&str>) -> Result<Vec<CandidateLocation>, ApplicationError> {
        Ok(self
            .0
            .iter()
            .filter(|c| region.is_none_or(|r| c.has_tag(r)))
            .cloned()
            .collect())
    }
}
