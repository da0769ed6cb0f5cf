//! Domain entities

mod cache_entry;
mod candidate_location;
mod daily_weather_record;
mod scored_location;
mod weather_filters;

pub use cache_entry::CacheEntry;
pub use candidate_location::CandidateLocation;
pub use daily_weather_record::{DailyWeatherRecord, round_hundredths, round_tenths};
pub use scored_location::{DayScore, ScoreBreakdown, ScoredLocation};
pub use weather_filters::WeatherFilters;
