//! Redb persistent weather cache
//!
//! Single table keyed by `"{location_id}|{YYYY-MM-DD}|{class}"`. Location ids
//! never contain `|`, so every key of one location sorts contiguously by date
//! and a lookup is one range scan. A `put` batch is one write transaction.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use application::{ApplicationError, CacheStats, WeatherCachePort};
use async_trait::async_trait;
use bincode::{Decode, Encode};
use chrono::{DateTime, NaiveDate};
use domain::{CacheEntry, DailyWeatherRecord, DataClass, DateRange, LocationId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use tracing::{debug, instrument, warn};

/// Table definition for weather entries
const WEATHER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("weather");

/// Sorts after every class name
const KEY_UPPER_SENTINEL: &str = "~";

/// Stored value; date, class and location live in the key
#[derive(Debug, Encode, Decode)]
struct StoredEntry {
    /// Fetch timestamp (Unix epoch milliseconds)
    fetched_at_millis: i64,
    /// JSON-encoded `DailyWeatherRecord`
    record_json: Vec<u8>,
}

fn entry_key(location_id: &LocationId, date: NaiveDate, class: DataClass) -> String {
    format!("{location_id}|{date}|{class}")
}

fn encode(entry: &CacheEntry) -> Result<Vec<u8>, ApplicationError> {
    let record_json = serde_json::to_vec(&entry.record)
        .map_err(|e| ApplicationError::CacheWriteFailed(format!("Record serialize error: {e}")))?;
    let stored = StoredEntry {
        fetched_at_millis: entry.fetched_at.timestamp_millis(),
        record_json,
    };
    bincode::encode_to_vec(&stored, bincode::config::standard())
        .map_err(|e| ApplicationError::CacheWriteFailed(format!("Entry serialize error: {e}")))
}

/// Rebuild an entry from its key and value, `None` if either is unreadable
fn decode(location_id: &LocationId, key: &str, bytes: &[u8]) -> Option<CacheEntry> {
    let (_, class) = key.rsplit_once('|')?;
    let class = DataClass::from_str(class).ok()?;
    let (stored, _): (StoredEntry, _) =
        bincode::decode_from_slice(bytes, bincode::config::standard()).ok()?;
    let record: DailyWeatherRecord = serde_json::from_slice(&stored.record_json).ok()?;
    let fetched_at = DateTime::from_timestamp_millis(stored.fetched_at_millis)?;
    Some(CacheEntry::new(location_id.clone(), class, record, fetched_at))
}

/// Redb-based persistent cache backend
///
/// # Auto-Recovery
///
/// If the database file is corrupted or incompatible, it is deleted and
/// recreated empty on open.
pub struct RedbWeatherCache {
    db: Arc<Database>,
    path: Option<PathBuf>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for RedbWeatherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbWeatherCache")
            .field("db", &"<Database>")
            .field("path", &self.path)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl RedbWeatherCache {
    /// Open or create the cache file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ApplicationError> {
        let path_buf = path.as_ref().to_path_buf();

        let db = match Database::create(&path_buf) {
            Ok(db) => db,
            Err(e) => {
                warn!(
                    path = %path_buf.display(),
                    error = %e,
                    "Cache database corrupted or incompatible, recreating"
                );
                if path_buf.exists() {
                    fs::remove_file(&path_buf).map_err(|e| {
                        ApplicationError::Internal(format!(
                            "Failed to remove corrupted cache database: {e}"
                        ))
                    })?;
                }
                Database::create(&path_buf).map_err(|e| {
                    ApplicationError::Internal(format!("Failed to create cache database: {e}"))
                })?
            },
        };

        Self::with_database(db, Some(path_buf))
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, ApplicationError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| {
                ApplicationError::Internal(format!("Failed to create in-memory Redb: {e}"))
            })?;
        Self::with_database(db, None)
    }

    fn with_database(db: Database, path: Option<PathBuf>) -> Result<Self, ApplicationError> {
        // Opening the table creates it if it doesn't exist
        let write_txn = db.begin_write().map_err(|e| {
            ApplicationError::Internal(format!("Failed to begin write transaction: {e}"))
        })?;
        write_txn
            .open_table(WEATHER_TABLE)
            .map_err(|e| ApplicationError::Internal(format!("Failed to open weather table: {e}")))?;
        write_txn.commit().map_err(|e| {
            ApplicationError::Internal(format!("Failed to commit transaction: {e}"))
        })?;

        Ok(Self {
            db: Arc::new(db),
            path,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn entry_count(&self) -> u64 {
        self.db
            .begin_read()
            .ok()
            .and_then(|txn| txn.open_table(WEATHER_TABLE).ok())
            .and_then(|table| table.len().ok())
            .unwrap_or(0)
    }
}

#[async_trait]
impl WeatherCachePort for RedbWeatherCache {
    #[instrument(skip(self), level = "debug", fields(location_id = %location_id))]
    async fn get(
        &self,
        location_id: &LocationId,
        range: DateRange,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        let db = Arc::clone(&self.db);
        let lower = format!("{location_id}|{}|", range.start());
        let upper = format!("{location_id}|{}|{KEY_UPPER_SENTINEL}", range.end());

        // Redb operations are blocking, wrap in spawn_blocking
        let rows = tokio::task::spawn_blocking(move || {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(WEATHER_TABLE)?;
            let mut rows = Vec::new();
            for row in table.range(lower.as_str()..=upper.as_str())? {
                let (key, value) = row?;
                rows.push((key.value().to_owned(), value.value().to_vec()));
            }
            Ok::<_, redb::Error>(rows)
        })
        .await
        .map_err(|e| ApplicationError::CacheReadFailed(format!("Task join error: {e}")))?
        .map_err(|e| ApplicationError::CacheReadFailed(format!("Redb range error: {e}")))?;

        let mut entries = Vec::with_capacity(rows.len());
        for (key, bytes) in &rows {
            match decode(location_id, key, bytes) {
                Some(entry) => entries.push(entry),
                None => warn!(key = %key, "Skipping unreadable cache entry"),
            }
        }

        let days_with_data = {
            let mut dates: Vec<_> = entries.iter().map(CacheEntry::date).collect();
            dates.dedup();
            dates.len() as u64
        };
        let misses = u64::from(range.len_days()).saturating_sub(days_with_data);
        self.hits.fetch_add(days_with_data, Ordering::Relaxed);
        self.misses.fetch_add(misses, Ordering::Relaxed);
        debug!(hits = days_with_data, misses, "Cache lookup (Redb)");

        Ok(entries)
    }

    #[instrument(skip(self, entries), level = "debug", fields(location_id = %location_id, count = entries.len()))]
    async fn put(
        &self,
        location_id: &LocationId,
        entries: Vec<CacheEntry>,
    ) -> Result<(), ApplicationError> {
        if entries.is_empty() {
            return Ok(());
        }

        let rows = entries
            .iter()
            .map(|entry| {
                Ok((
                    entry_key(location_id, entry.date(), entry.class),
                    encode(entry)?,
                ))
            })
            .collect::<Result<Vec<_>, ApplicationError>>()?;
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(WEATHER_TABLE)?;
                for (key, value) in &rows {
                    table.insert(key.as_str(), value.as_slice())?;
                }
            }
            write_txn.commit()?;
            Ok::<_, redb::Error>(())
        })
        .await
        .map_err(|e| ApplicationError::CacheWriteFailed(format!("Task join error: {e}")))?
        .map_err(|e| ApplicationError::CacheWriteFailed(format!("Redb insert error: {e}")))?;

        debug!("Cache batch stored (Redb)");
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
        }
    }
}
