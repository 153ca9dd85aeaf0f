//! Canonical listing record
//!
//! A `ListingRecord` is one apartment listing as it appears in search results.
//! Its `id` is the sole join key for reconciliation across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel for string fields that could not be resolved from the markup
pub const UNKNOWN: &str = "Unknown";

/// One apartment listing extracted from a search result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Stable identifier derived from the listing URL's last path segment
    pub id: String,

    /// Absolute URL of the listing detail page
    pub url: String,

    /// Listing title
    pub title: String,

    /// Monthly rent in euros; absent when the markup carries no parseable price
    pub price: Option<f64>,

    /// Surface area in square meters
    pub size: Option<u32>,

    /// Number of rooms
    pub rooms: Option<u32>,

    /// Neighborhood or city area, `"Unknown"` when unresolvable
    pub location: String,

    /// Interior description (furnished, upholstered, ...), `"Unknown"` when absent
    pub interior: String,

    /// Primary listing photo
    pub image_url: Option<String>,

    /// Listing agency name, `"Unknown"` when absent
    pub agency: String,

    /// When this listing was first discovered; set once, never overwritten
    pub first_seen: DateTime<Utc>,

    /// When this listing last changed; refreshed on update classification
    pub last_updated: DateTime<Utc>,
}

/// Derives the stable listing id from a listing URL
///
/// The id is the last non-empty path segment. Returns `None` for URLs with no
/// usable path; such fragments never become records.
pub fn listing_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}
