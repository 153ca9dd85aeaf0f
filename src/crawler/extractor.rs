//! Structured field extraction from listing markup
//!
//! One listing's markup fragment goes in, a `ListingRecord` or nothing comes
//! out. Nothing ever panics past this boundary: a fragment that doesn't match
//! the expected shape yields `None` and is skipped, because a single malformed
//! listing is routine while the rest of the page is usually fine.
//!
//! Feature elements (surface area, room count, interior) are dispatched
//! through an explicit [`FeatureRole`] lookup keyed on their class
//! annotations, so the mapping from markup to fields stays auditable.

use crate::listing::{listing_id_from_url, ListingRecord, UNKNOWN};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Selector};

/// Role a feature element plays in a listing, decided by its class list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRole {
    /// Surface area in square meters
    SurfaceArea,
    /// Number of rooms
    Rooms,
    /// Interior description
    Interior,
}

impl FeatureRole {
    /// Maps a feature element's class annotations to its role
    ///
    /// Matching is by substring, e.g. `illustrated-features__item--surface-area`
    /// carries the `surface-area` marker. Elements with none of the known
    /// markers have no role and are ignored.
    pub fn from_classes<'a>(classes: impl Iterator<Item = &'a str>) -> Option<Self> {
        for class in classes {
            if class.contains("surface-area") {
                return Some(Self::SurfaceArea);
            }
            if class.contains("number-of-rooms") {
                return Some(Self::Rooms);
            }
            if class.contains("interior") {
                return Some(Self::Interior);
            }
        }
        None
    }
}

/// Extracts a `ListingRecord` from one listing element
///
/// Returns `None` when the fragment has no usable listing link; the id is
/// mandatory and a record without one never enters the record set. Every
/// other field degrades gracefully to `None` or a sentinel.
///
/// `site_root` is prepended to relative listing links. Both timestamps are
/// set to `now`; the reconciler later restores `first_seen` for records that
/// already existed in the stored snapshot.
pub fn extract_listing(
    listing: ElementRef<'_>,
    site_root: &str,
    now: DateTime<Utc>,
) -> Option<ListingRecord> {
    let link = select_first(listing, "a.listing-search-item__link--title")?;
    let href = link.value().attr("href")?;

    let url = if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", site_root.trim_end_matches('/'), href)
    };
    let id = listing_id_from_url(&url)?;
    let title = text_of(link);

    let price = select_first(listing, ".listing-search-item__price")
        .and_then(|element| parse_price(&text_of(element)));

    let mut size = None;
    let mut rooms = None;
    let mut interior = None;
    if let Ok(selector) = Selector::parse(".illustrated-features__item") {
        for item in listing.select(&selector) {
            let text = text_of(item);
            match FeatureRole::from_classes(item.value().classes()) {
                Some(FeatureRole::SurfaceArea) => size = parse_size(&text),
                Some(FeatureRole::Rooms) => rooms = parse_rooms(&text),
                Some(FeatureRole::Interior) => interior = Some(text),
                None => {}
            }
        }
    }

    let location = extract_location(listing);

    let image_url = select_first(listing, "img.picture__image")
        .and_then(|image| image.value().attr("src"))
        .map(str::to_string);

    let agency = select_first(listing, ".listing-search-item__info .listing-search-item__link")
        .map(text_of)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    Some(ListingRecord {
        id,
        url,
        title,
        price,
        size,
        rooms,
        location,
        interior: interior.unwrap_or_else(|| UNKNOWN.to_string()),
        image_url,
        agency,
        first_seen: now,
        last_updated: now,
    })
}

/// Resolves the listing location
///
/// The dedicated sub-title element is preferred; when the markup varies, any
/// `div` whose class annotation contains `sub-title` is accepted, first match
/// wins. Falls back to the `"Unknown"` sentinel.
fn extract_location(listing: ElementRef<'_>) -> String {
    if let Some(element) = select_first(listing, "div.listing-search-item__sub-title") {
        return text_of(element);
    }

    if let Ok(selector) = Selector::parse("div") {
        for div in listing.select(&selector) {
            if div.value().classes().any(|class| class.contains("sub-title")) {
                return text_of(div);
            }
        }
    }

    UNKNOWN.to_string()
}

/// Parses a price from text like `"€ 1,200 per month"`
///
/// Takes the first currency-prefixed numeric token, strips thousands
/// separators, and parses the remainder. No match means no price, not zero.
fn parse_price(text: &str) -> Option<f64> {
    let pattern = Regex::new(r"€\s*([\d.,]+)").ok()?;
    let token = pattern.captures(text)?.get(1)?.as_str();
    let digits = token.replace([',', '.'], "");
    digits.parse::<f64>().ok().filter(|price| *price >= 0.0)
}

/// Parses a surface area from text like `"75 m²"`
fn parse_size(text: &str) -> Option<u32> {
    let pattern = Regex::new(r"(\d+)\s*m²").ok()?;
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Parses a room count from text like `"3 rooms"`
fn parse_rooms(text: &str) -> Option<u32> {
    let pattern = Regex::new(r"(\d+)\s*rooms?").ok()?;
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

fn select_first<'a>(element: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let parsed = Selector::parse(selector).ok()?;
    element.select(&parsed).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
