//! Snapshot store trait and error types

use crate::listing::ListingRecord;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Statistics gathered over one pipeline run
///
/// One of these is persisted per run so `--stats` can show how the watched
/// listing set develops over time.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub duration_seconds: f64,

    /// Whether the crawl/merge/persist stages all succeeded
    pub success: bool,

    /// Listings classified as added
    pub added: usize,

    /// Listings classified as updated
    pub updated: usize,

    /// Size of the merged listing set
    pub total: usize,

    /// Listings dropped because they expired without being re-seen
    pub evicted: usize,

    /// Whether a notification was actually sent
    pub notification_sent: bool,

    /// Errors recorded along the way
    pub errors: Vec<String>,

    /// Hash of the configuration this run used
    pub config_hash: String,
}

impl RunStats {
    /// Creates empty stats for a run starting now
    pub fn new(started_at: DateTime<Utc>, config_hash: String) -> Self {
        Self {
            started_at,
            duration_seconds: 0.0,
            success: false,
            added: 0,
            updated: 0,
            total: 0,
            evicted: 0,
            notification_sent: false,
            errors: Vec::new(),
            config_hash,
        }
    }
}

/// A persisted run row, as read back for `--stats`
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub stats: RunStats,
}

/// Persistence boundary for the canonical listing snapshot
///
/// The pipeline reads the snapshot once at the start and writes it once at
/// the end; implementations are not expected to handle concurrent access.
pub trait SnapshotStore {
    /// Loads the canonical listing set
    ///
    /// Returns an empty set when no prior state exists. Rows with unusable
    /// timestamps are loaded with coerced values rather than dropped.
    fn load_listings(&self) -> StorageResult<Vec<ListingRecord>>;

    /// Replaces the canonical listing set
    fn save_listings(&mut self, listings: &[ListingRecord]) -> StorageResult<()>;

    /// Overwrites the latest-raw-crawl diagnostic artifact
    fn save_raw_crawl(&self, listings: &[ListingRecord]) -> StorageResult<()>;

    /// Drops stored listings whose age exceeds `max_age`, returning the count
    fn evict_expired(&mut self, max_age: Duration, now: DateTime<Utc>) -> StorageResult<usize>;

    /// Records the statistics of one run
    fn record_run(&mut self, stats: &RunStats) -> StorageResult<i64>;

    /// Prunes run history down to the `keep` most recent rows
    fn prune_runs(&mut self, keep: usize) -> StorageResult<usize>;

    /// Returns the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
