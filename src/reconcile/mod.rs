//! Listing reconciliation
//!
//! Merges a freshly crawled record set with the previously stored one and
//! classifies every record as added, updated, or carried over unchanged.
//! Stored records that were not re-seen survive until they outlive the
//! configured maximum age, so only listings that actually disappeared from
//! the site age out; a listing re-seen on every run is kept indefinitely.

use crate::listing::ListingRecord;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Result of merging a fresh crawl against the stored snapshot
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Records whose id was not present in the stored set
    pub added: Vec<ListingRecord>,

    /// Records present in both sets with a relevant field change
    pub updated: Vec<ListingRecord>,

    /// The full deduplicated record set to persist for the next run
    pub all_current: Vec<ListingRecord>,

    /// Stored records dropped because they expired without being re-seen
    pub evicted: usize,
}

/// Merges `fresh` against `stored` and classifies every record
///
/// Both inputs are indexed by id before comparison; an input that carries the
/// same id twice (the source site repeats listings across paginated city
/// results) resolves to the last occurrence. The classification rules:
///
/// - id only in `fresh`: **added**, kept with its own extraction timestamps
/// - id in both, relevant fields differ: **updated** with the fresh field
///   values, `first_seen` taken from the stored record, `last_updated = now`
/// - id in both, no difference: the stored record is carried over verbatim,
///   original timestamps included
/// - id only in `stored`: kept unless `now - first_seen` exceeds `max_age`,
///   in which case it is dropped and counted as evicted
///
/// Ids in `all_current` are unique; ordering is not significant.
pub fn reconcile(
    fresh: Vec<ListingRecord>,
    stored: Vec<ListingRecord>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let stored_by_id = index_by_id(stored);
    let fresh_by_id = index_by_id(fresh);
    let fresh_ids: HashSet<String> = fresh_by_id.keys().cloned().collect();

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut all_current = Vec::new();

    for (id, mut record) in fresh_by_id {
        match stored_by_id.get(&id) {
            None => {
                tracing::info!("New listing found: {} - {}", record.title, record.url);
                added.push(record.clone());
                all_current.push(record);
            }
            Some(existing) => {
                if has_relevant_changes(&record, existing) {
                    // Preserve the original discovery time
                    record.first_seen = existing.first_seen;
                    record.last_updated = now;
                    tracing::info!("Updated listing found: {} - {}", record.title, record.url);
                    updated.push(record.clone());
                    all_current.push(record);
                } else {
                    all_current.push(existing.clone());
                }
            }
        }
    }

    let mut evicted = 0;
    for (id, record) in stored_by_id {
        if fresh_ids.contains(&id) {
            continue;
        }
        if is_expired(&record, max_age, now) {
            tracing::debug!("Evicting expired listing {}", id);
            evicted += 1;
        } else {
            all_current.push(record);
        }
    }

    tracing::info!(
        "Found {} new listings and {} updated listings",
        added.len(),
        updated.len()
    );
    tracing::info!("Total current listings: {}", all_current.len());

    ReconcileOutcome {
        added,
        updated,
        all_current,
        evicted,
    }
}

/// Whether a stored record has outlived the maximum listing age
///
/// Age is measured from `first_seen`. Only applied to records absent from the
/// current crawl.
pub fn is_expired(record: &ListingRecord, max_age: Duration, now: DateTime<Utc>) -> bool {
    now - record.first_seen > max_age
}

/// Whether a re-crawled listing counts as updated
///
/// The search-listing shape carries no availability or description fields, so
/// the change test reduces to the price.
fn has_relevant_changes(fresh: &ListingRecord, stored: &ListingRecord) -> bool {
    fresh.price != stored.price
}

/// Indexes records by id, resolving in-batch duplicates last-write-wins
fn index_by_id(records: Vec<ListingRecord>) -> HashMap<String, ListingRecord> {
    let mut by_id = HashMap::with_capacity(records.len());
    for record in records {
        by_id.insert(record.id.clone(), record);
    }
    by_id
}
