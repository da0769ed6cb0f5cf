//! fairweather CLI
//!
//! Ranks candidate locations by how well their weather over a date range
//! matches a set of preferences. All output is JSON on stdout.

#![allow(clippy::print_stdout)]

mod engine;

use std::path::PathBuf;

use anyhow::Context;
use application::{CacheStats, SearchOptions, SearchResponse};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use domain::{DateRange, GeoLocation, LocationId, PrecipitationType, WeatherFilters};
use infrastructure::{AppConfig, CacheBackend, JsonLocationStore, init_telemetry};
use serde::Serialize;

use crate::engine::Engine;

/// fairweather CLI
#[derive(Debug, Parser)]
#[command(name = "fairweather")]
#[command(author, version, about = "Find where the weather will be the way you like it", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./config.toml when present)
    #[arg(short, long, env = "FAIRWEATHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank candidate locations for a date range
    ///
    /// Example: fairweather search --locations grid.json --start 2025-07-04 --end 2025-07-06 --temp-min 60 --temp-max 85
    Search(SearchArgs),

    /// Resolve daily weather for one location
    ///
    /// Example: fairweather resolve --id co-denver --lat 39.74 --lon -104.99 --start 2025-07-04 --end 2025-07-06
    Resolve {
        /// Cache key for the location
        #[arg(long)]
        id: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Report what the persistent cache holds (redb backend only)
    ///
    /// Hit and miss counters live for one process, so they are reported
    /// with each `search` and `resolve` instead.
    CacheStats,
}

#[derive(Debug, Args)]
struct DateArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
}

impl DateArgs {
    fn range(&self) -> anyhow::Result<DateRange> {
        Ok(DateRange::new(self.start, self.end)?)
    }
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// JSON file of candidate grid points
    #[arg(long)]
    locations: PathBuf,

    #[command(flatten)]
    dates: DateArgs,

    /// Lowest acceptable daily low (°F)
    #[arg(long, allow_negative_numbers = true)]
    temp_min: Option<f64>,

    /// Highest acceptable daily high (°F)
    #[arg(long, allow_negative_numbers = true)]
    temp_max: Option<f64>,

    /// Highest acceptable humidity (%)
    #[arg(long)]
    humidity_max: Option<f64>,

    /// Highest acceptable wind speed (mph)
    #[arg(long)]
    wind_max: Option<f64>,

    /// Highest acceptable precipitation chance (%)
    #[arg(long)]
    precip_max: Option<f64>,

    /// Acceptable precipitation types (e.g. none, drizzle)
    #[arg(long = "allow", value_name = "TYPE", num_args = 1..)]
    allow: Vec<PrecipitationType>,

    /// Unacceptable precipitation types (e.g. snow, thunderstorms)
    #[arg(long = "exclude", value_name = "TYPE", num_args = 1..)]
    exclude: Vec<PrecipitationType>,

    /// Highest acceptable air quality index (recorded, not scored)
    #[arg(long)]
    aqi_max: Option<u16>,

    /// Maximum number of results (default from configuration)
    #[arg(long)]
    limit: Option<usize>,

    /// Drop results scoring below this
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_score: u8,

    /// Only consider locations tagged with this region
    #[arg(long)]
    region: Option<String>,
}

impl SearchArgs {
    fn filters(&self) -> WeatherFilters {
        WeatherFilters {
            temp_min_f: self.temp_min,
            temp_max_f: self.temp_max,
            humidity_max: self.humidity_max,
            wind_speed_max_mph: self.wind_max,
            precip_chance_max: self.precip_max,
            allowed_types: (!self.allow.is_empty()).then(|| self.allow.iter().copied().collect()),
            excluded_types: (!self.exclude.is_empty())
                .then(|| self.exclude.iter().copied().collect()),
            aqi_max: self.aqi_max,
        }
    }

    fn options(&self, default_limit: usize) -> SearchOptions {
        SearchOptions {
            limit: self.limit.unwrap_or(default_limit),
            min_score: self.min_score,
            region: self.region.clone(),
        }
    }
}

/// Output of `search`
#[derive(Debug, Serialize)]
struct SearchOutput {
    #[serde(flatten)]
    response: SearchResponse,
    /// Cache activity of this run
    cache: CacheStats,
}

/// Output of `resolve`
#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    location_id: &'a LocationId,
    #[serde(flatten)]
    resolution: application::Resolution,
    /// Cache activity of this run
    cache: CacheStats,
}

/// Output of `cache-stats`
#[derive(Debug, PartialEq, Eq, Serialize)]
struct CacheReport<'a> {
    path: &'a std::path::Path,
    entries: u64,
}

/// Stored entry count of the persistent cache
///
/// The memory backend starts empty in every process, so there is nothing
/// to report for it.
fn cache_report<'a>(config: &'a AppConfig, stats: &CacheStats) -> anyhow::Result<CacheReport<'a>> {
    match config.cache.backend {
        CacheBackend::Redb => Ok(CacheReport {
            path: &config.cache.path,
            entries: stats.entries,
        }),
        CacheBackend::Memory => anyhow::bail!(
            "cache-stats needs the redb backend (cache.backend = \"redb\"); \
             the memory cache is empty in a fresh process"
        ),
    }
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.verbose > 0 {
        config.telemetry.log_filter = log_filter_from_verbosity(cli.verbose).to_string();
    }
    init_telemetry(&config.telemetry)?;

    let engine = Engine::build(&config)?;

    match cli.command {
        Commands::Search(args) => {
            let range = args.dates.range()?;
            let store = JsonLocationStore::load(&args.locations).await?;
            let response = engine
                .search
                .search_locations(
                    &store,
                    &args.filters(),
                    range,
                    &args.options(config.search.default_limit),
                )
                .await?;
            print_json(&SearchOutput {
                response,
                cache: engine.cache.stats(),
            })?;
        },

        Commands::Resolve { id, lat, lon, dates } => {
            let location_id = LocationId::new(id)?;
            let location = GeoLocation::new(lat, lon)?;
            let resolution = engine
                .resolver
                .resolve(&location_id, &location, dates.range()?)
                .await;
            print_json(&ResolveOutput {
                location_id: &location_id,
                resolution,
                cache: engine.cache.stats(),
            })?;
        },

        Commands::CacheStats => {
            print_json(&cache_report(&config, &engine.cache.stats())?)?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fairweather").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_with_filters() {
        let cli = parse(&[
            "search",
            "--locations",
            "grid.json",
            "--start",
            "2025-07-04",
            "--end",
            "2025-07-06",
            "--temp-min",
            "-5",
            "--temp-max",
            "85",
            "--allow",
            "none",
            "drizzle",
            "--exclude",
            "snow",
            "--min-score",
            "40",
            "--region",
            "colorado",
        ]);

        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        let filters = args.filters();
        assert_eq!(filters.temp_min_f, Some(-5.0));
        assert_eq!(filters.temp_max_f, Some(85.0));
        assert!(filters.humidity_max.is_none());
        assert_eq!(
            filters.allowed_types.map(|t| t.into_iter().collect::<Vec<_>>()),
            Some(vec![PrecipitationType::None, PrecipitationType::Drizzle])
        );
        assert_eq!(filters.excluded_types.map(|t| t.len()), Some(1));

        let options = args.options(10);
        assert_eq!(options.limit, 10);
        assert_eq!(options.min_score, 40);
        assert_eq!(options.region.as_deref(), Some("colorado"));
        assert!(args.dates.range().is_ok());
    }

    #[test]
    fn unset_type_lists_leave_filters_inactive() {
        let cli = parse(&[
            "search",
            "--locations",
            "grid.json",
            "--start",
            "2025-07-04",
            "--end",
            "2025-07-04",
            "--limit",
            "3",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert!(args.filters().is_unconstrained());
        assert_eq!(args.options(10).limit, 3);
    }

    #[test]
    fn rejects_out_of_range_min_score() {
        let result = Cli::try_parse_from([
            "fairweather",
            "search",
            "--locations",
            "g.json",
            "--start",
            "2025-07-04",
            "--end",
            "2025-07-04",
            "--min-score",
            "101",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_precipitation_type() {
        let result = Cli::try_parse_from([
            "fairweather",
            "search",
            "--locations",
            "g.json",
            "--start",
            "2025-07-04",
            "--end",
            "2025-07-04",
            "--allow",
            "frogs",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_resolve_with_negative_longitude() {
        let cli = parse(&[
            "resolve", "--id", "co-denver", "--lat", "39.74", "--lon", "-104.99", "--start",
            "2025-07-04", "--end", "2025-07-05",
        ]);
        let Commands::Resolve { id, lon, dates, .. } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(id, "co-denver");
        assert!((lon - -104.99).abs() < 1e-9);
        assert_eq!(dates.range().unwrap().len_days(), 2);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let dates = DateArgs {
            start: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
        };
        assert!(dates.range().is_err());
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(5), "trace");
    }

    #[test]
    fn cache_report_needs_the_persistent_backend() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entries: 12,
        };
        let memory = AppConfig::default();
        let err = cache_report(&memory, &stats).unwrap_err();
        assert!(err.to_string().contains("redb"));

        let mut redb = AppConfig::default();
        redb.cache.backend = CacheBackend::Redb;
        redb.cache.path = PathBuf::from("/var/cache/fw.redb");
        let report = cache_report(&redb, &stats).unwrap();
        assert_eq!(report.entries, 12);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "/var/cache/fw.redb");
        assert!(json.get("hits").is_none());
    }

    #[test]
    fn search_output_carries_cache_activity() {
        let output = SearchOutput {
            response: SearchResponse {
                results: Vec::new(),
                total: 0,
                evaluated: 0,
                stopped_early: false,
                range_notice: None,
            },
            cache: CacheStats {
                hits: 4,
                misses: 2,
                entries: 6,
            },
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["total"], 0);
        assert_eq!(json["cache"]["hits"], 4);
        assert_eq!(json["cache"]["misses"], 2);
    }

    #[test]
    fn parses_cache_stats_with_config() {
        let cli = parse(&["--config", "fw.toml", "-vv", "cache-stats"]);
        assert!(matches!(cli.command, Commands::CacheStats));
        assert_eq!(cli.config, Some(PathBuf::from("fw.toml")));
        assert_eq!(cli.verbose, 2);
    }
}
