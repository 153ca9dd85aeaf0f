//! End-to-end run: load → crawl → reconcile → persist → notify
//!
//! Most stages degrade rather than abort: unreachable pages shrink the fresh
//! set, a broken snapshot read starts from an empty set, and a failed
//! notification is recorded without touching the crawl/merge outcome. Only a
//! failure to persist the merged listing set makes the run itself fail.

use crate::config::Config;
use crate::crawler::{build_http_client, crawl_all_cities};
use crate::notify::NotificationSink;
use crate::reconcile::reconcile;
use crate::storage::{RunStats, SnapshotStore};
use chrono::{Duration, Utc};

/// Runs the fetch-extract-reconcile pipeline once
///
/// Outcomes accumulate into `stats`. The caller catches the returned error,
/// records it, and persists the stats in all paths, so nothing here needs to
/// worry about reporting twice.
pub async fn run(
    config: &Config,
    store: &mut dyn SnapshotStore,
    notifier: &dyn NotificationSink,
    stats: &mut RunStats,
) -> crate::Result<()> {
    let max_age = Duration::days(config.crawler.max_listings_age_days);

    // Clean out listings that already outlived the age limit before this run
    match store.evict_expired(max_age, Utc::now()) {
        Ok(removed) => {
            stats.evicted += removed;
            tracing::info!("Removed {} old listings from storage", removed);
        }
        Err(e) => {
            tracing::warn!("Failed to clean old listings: {}", e);
        }
    }

    // A broken snapshot read falls open to an empty set; the crawl then
    // reclassifies everything it finds as added.
    let existing = match store.load_listings() {
        Ok(listings) => listings,
        Err(e) => {
            tracing::warn!(
                "Failed to load stored listings, starting from an empty set: {}",
                e
            );
            Vec::new()
        }
    };

    let client = build_http_client(&config.crawler.user_agent)?;

    tracing::info!("Starting scraping process");
    let fresh = crawl_all_cities(&client, config).await;

    // Diagnostics artifact only, never affects the run outcome
    if let Err(e) = store.save_raw_crawl(&fresh) {
        tracing::warn!("Failed to save raw crawl artifact: {}", e);
    }

    let outcome = reconcile(fresh, existing, max_age, Utc::now());

    stats.added = outcome.added.len();
    stats.updated = outcome.updated.len();
    stats.total = outcome.all_current.len();
    stats.evicted += outcome.evicted;

    store.save_listings(&outcome.all_current)?;

    if !outcome.added.is_empty() || !outcome.updated.is_empty() {
        tracing::info!(
            "Sending notifications for {} new and {} updated listings",
            outcome.added.len(),
            outcome.updated.len()
        );
        match notifier.notify(&outcome.added, &outcome.updated).await {
            Ok(sent) => stats.notification_sent = sent,
            Err(e) => {
                // A sink failure never fails the crawl/merge stages
                tracing::error!("Failed to send notification: {}", e);
                stats.errors.push(format!("Failed to send notification: {}", e));
            }
        }
    } else {
        tracing::info!("No new or updated listings found, skipping notification");
    }

    stats.success = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, PriceRange, SearchConfig, StorageConfig};
    use crate::listing::{ListingRecord, UNKNOWN};
    use crate::notify::NotifyResult;
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingSink {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(
            &self,
            added: &[ListingRecord],
            updated: &[ListingRecord],
        ) -> NotifyResult<bool> {
            self.calls
                .lock()
                .unwrap()
                .push((added.len(), updated.len()));
            Ok(true)
        }
    }

    fn unreachable_config() -> Config {
        Config {
            search: SearchConfig {
                // Nothing listens here, so every fetch fails fast
                base_url: "http://127.0.0.1:9/apartments".to_string(),
                cities: vec!["rotterdam".to_string()],
                price_range: PriceRange::default(),
                min_bedrooms: None,
                min_size: None,
            },
            crawler: CrawlerConfig {
                user_agent: "TestAgent/1.0".to_string(),
                request_delay: 0,
                max_retries: 1,
                max_pages: 5,
                max_listings_age_days: 30,
            },
            storage: StorageConfig::default(),
        }
    }

    fn stored_listing(id: &str, first_seen: DateTime<Utc>) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            url: format!("https://www.pararius.com/apartment-for-rent/rotterdam/{}", id),
            title: format!("Listing {}", id),
            price: Some(900.0),
            size: None,
            rooms: None,
            location: UNKNOWN.to_string(),
            interior: UNKNOWN.to_string(),
            image_url: None,
            agency: UNKNOWN.to_string(),
            first_seen,
            last_updated: first_seen,
        }
    }

    #[tokio::test]
    async fn test_unreachable_site_keeps_young_stored_listings() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStorage::new_in_memory(dir.path().join("raw.json")).unwrap();
        let now = Utc::now();

        store
            .save_listings(&[
                stored_listing("young", now - Duration::days(5)),
                stored_listing("expired", now - Duration::days(45)),
            ])
            .unwrap();

        let sink = RecordingSink::new();
        let mut stats = RunStats::new(now, "hash".to_string());

        run(&unreachable_config(), &mut store, &sink, &mut stats)
            .await
            .unwrap();

        // The crawl found nothing, which is not an error
        assert!(stats.success);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.evicted, 1);
        assert_eq!(stats.total, 1);

        let remaining = store.load_listings().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "young");

        // Nothing added or updated, so the sink was never called
        assert!(sink.calls.lock().unwrap().is_empty());
        assert!(!stats.notification_sent);
    }
}
