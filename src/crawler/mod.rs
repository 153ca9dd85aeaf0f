//! Crawler module for listing page fetching and extraction
//!
//! This module contains the crawl side of the pipeline:
//! - HTTP fetching with retry logic and the mandatory inter-request delay
//! - Structured field extraction from listing markup
//! - Per-city pagination walking
//! - Orchestration across all configured cities

mod extractor;
mod fetcher;
mod page;

pub use extractor::{extract_listing, FeatureRole};
pub use fetcher::{build_http_client, fetch_page};
pub use page::{crawl_city, parse_listing_page, ListingPage};

use crate::config::Config;
use crate::listing::ListingRecord;
use reqwest::Client;

/// Crawls every configured city and aggregates the results
///
/// Cities are processed strictly one at a time, in configured order, to
/// respect the rate-limiting delay. A failure in one city's walk never aborts
/// the remaining cities. The aggregate may contain the same id more than once
/// when a listing shows up under several cities; the reconciler's indexing
/// resolves that with last-write-wins.
pub async fn crawl_all_cities(client: &Client, config: &Config) -> Vec<ListingRecord> {
    let mut all_listings = Vec::new();

    for city in &config.search.cities {
        tracing::info!("Scraping listings for {}", city);
        let city_listings = crawl_city(client, config, city).await;
        tracing::info!("Collected {} listings for {}", city_listings.len(), city);
        all_listings.extend(city_listings);
    }

    tracing::info!("Scraped a total of {} listings", all_listings.len());
    all_listings
}
