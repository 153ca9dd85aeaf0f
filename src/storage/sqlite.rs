//! SQLite snapshot store implementation

use crate::config::StorageConfig;
use crate::listing::ListingRecord;
use crate::reconcile::is_expired;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RunRecord, RunStats, SnapshotStore, StorageError, StorageResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQLite-backed snapshot store
///
/// Listings and run history live in the database; the latest-raw-crawl
/// diagnostic artifact is a JSON file next to it so it stays readable without
/// tooling.
pub struct SqliteStorage {
    conn: Connection,
    raw_crawl_path: PathBuf,
}

impl SqliteStorage {
    /// Opens (or creates) the snapshot store described by the configuration
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let db_path = Path::new(&config.database_path);
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            raw_crawl_path: PathBuf::from(&config.raw_crawl_path),
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory(raw_crawl_path: PathBuf) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            raw_crawl_path,
        })
    }

    fn row_to_listing(row: &rusqlite::Row<'_>, now: DateTime<Utc>) -> rusqlite::Result<ListingRecord> {
        let id: String = row.get(0)?;
        let first_seen: String = row.get(10)?;
        let last_updated: String = row.get(11)?;

        Ok(ListingRecord {
            id: id.clone(),
            url: row.get(1)?,
            title: row.get(2)?,
            price: row.get(3)?,
            size: row.get(4)?,
            rooms: row.get(5)?,
            location: row.get(6)?,
            interior: row.get(7)?,
            image_url: row.get(8)?,
            agency: row.get(9)?,
            first_seen: parse_timestamp(&first_seen, &id, now),
            last_updated: parse_timestamp(&last_updated, &id, now),
        })
    }
}

/// Parses a stored RFC 3339 timestamp, failing open to `now`
///
/// A stored row with a mangled timestamp must not be silently deleted, so
/// the coerced value makes the record look freshly seen and eviction leaves
/// it alone.
fn parse_timestamp(value: &str, id: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(
                "Unparseable timestamp '{}' on stored listing {}: {}; treating as current",
                value,
                id,
                e
            );
            now
        }
    }
}

impl SnapshotStore for SqliteStorage {
    fn load_listings(&self) -> StorageResult<Vec<ListingRecord>> {
        let now = Utc::now();
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, price, size, rooms, location, interior,
                    image_url, agency, first_seen, last_updated
             FROM listings",
        )?;

        let listings = stmt
            .query_map([], |row| Self::row_to_listing(row, now))?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Loaded {} listings from storage", listings.len());
        Ok(listings)
    }

    fn save_listings(&mut self, listings: &[ListingRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM listings", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO listings
                 (id, url, title, price, size, rooms, location, interior,
                  image_url, agency, first_seen, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for listing in listings {
                stmt.execute(params![
                    listing.id,
                    listing.url,
                    listing.title,
                    listing.price,
                    listing.size,
                    listing.rooms,
                    listing.location,
                    listing.interior,
                    listing.image_url,
                    listing.agency,
                    listing.first_seen.to_rfc3339(),
                    listing.last_updated.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!("Saved {} listings to storage", listings.len());
        Ok(())
    }

    fn save_raw_crawl(&self, listings: &[ListingRecord]) -> StorageResult<()> {
        if let Some(parent) = self.raw_crawl_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(listings)?;
        std::fs::write(&self.raw_crawl_path, json)?;

        tracing::info!(
            "Saved {} listings to {}",
            listings.len(),
            self.raw_crawl_path.display()
        );
        Ok(())
    }

    fn evict_expired(&mut self, max_age: Duration, now: DateTime<Utc>) -> StorageResult<usize> {
        let listings = self.load_listings()?;

        let original_count = listings.len();
        let surviving: Vec<ListingRecord> = listings
            .into_iter()
            .filter(|listing| !is_expired(listing, max_age, now))
            .collect();

        let removed = original_count - surviving.len();
        if removed > 0 {
            self.save_listings(&surviving)?;
            tracing::info!("Removed {} old listings", removed);
        }

        Ok(removed)
    }

    fn record_run(&mut self, stats: &RunStats) -> StorageResult<i64> {
        let errors = serde_json::to_string(&stats.errors)?;

        self.conn.execute(
            "INSERT INTO runs
             (started_at, duration_seconds, success, added_count, updated_count,
              total_count, evicted_count, notification_sent, errors, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                stats.started_at.to_rfc3339(),
                stats.duration_seconds,
                stats.success,
                stats.added as i64,
                stats.updated as i64,
                stats.total as i64,
                stats.evicted as i64,
                stats.notification_sent,
                errors,
                stats.config_hash,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn prune_runs(&mut self, keep: usize) -> StorageResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM runs WHERE id NOT IN
             (SELECT id FROM runs ORDER BY id DESC LIMIT ?1)",
            params![keep as i64],
        )?;
        Ok(removed)
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let now = Utc::now();
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, duration_seconds, success, added_count,
                    updated_count, total_count, evicted_count, notification_sent,
                    errors, config_hash
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| {
                let started_at: String = row.get(1)?;
                let errors_json: String = row.get(9)?;

                Ok(RunRecord {
                    id: row.get(0)?,
                    stats: RunStats {
                        started_at: parse_timestamp(&started_at, "run", now),
                        duration_seconds: row.get(2)?,
                        success: row.get(3)?,
                        added: row.get::<_, i64>(4)? as usize,
                        updated: row.get::<_, i64>(5)? as usize,
                        total: row.get::<_, i64>(6)? as usize,
                        evicted: row.get::<_, i64>(7)? as usize,
                        notification_sent: row.get(8)?,
                        errors: serde_json::from_str(&errors_json).unwrap_or_default(),
                        config_hash: row.get(10)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
