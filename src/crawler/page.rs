//! Paginated search result walking
//!
//! Parsing produces an owned [`ListingPage`] so no parsed document lives
//! across an await point; the walker only ever holds plain records between
//! fetches.

use crate::config::Config;
use crate::crawler::extractor::extract_listing;
use crate::crawler::fetcher::fetch_page;
use crate::listing::ListingRecord;
use crate::search::build_search_url;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// Everything the walker needs from one fetched result page
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Successfully extracted records
    pub listings: Vec<ListingRecord>,

    /// Number of listing elements present in the markup, extractable or not
    pub item_count: usize,

    /// Whether the page advertises a next result page
    pub has_next: bool,
}

/// Parses one search result page into listings and pagination state
pub fn parse_listing_page(html: &str, site_root: &str, now: DateTime<Utc>) -> ListingPage {
    let document = Html::parse_document(html);

    let mut listings = Vec::new();
    let mut item_count = 0;

    if let Ok(selector) = Selector::parse(".search-list__item .listing-search-item") {
        for element in document.select(&selector) {
            item_count += 1;
            if let Some(record) = extract_listing(element, site_root, now) {
                listings.push(record);
            }
        }
    }

    let has_next = Selector::parse(".pagination__link--next")
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false);

    ListingPage {
        listings,
        item_count,
        has_next,
    }
}

/// Walks the paginated search results for one city
///
/// Stops on the first failed fetch (partial results are valid, not an error),
/// on a page with zero listing elements (end of results), or when the page
/// carries no next-page marker. `max_pages` is a hard ceiling regardless of
/// marker presence.
pub async fn crawl_city(client: &Client, config: &Config, city: &str) -> Vec<ListingRecord> {
    let root = site_root(&config.search.base_url);
    let mut collected = Vec::new();

    for page in 1..=config.crawler.max_pages {
        let url = build_search_url(&config.search, city, page);

        let body = match fetch_page(client, &url, &config.crawler).await {
            Some(body) => body,
            None => {
                tracing::error!(
                    "Failed to retrieve page {} for {}, keeping {} listings collected so far",
                    page,
                    city,
                    collected.len()
                );
                break;
            }
        };

        let parsed = parse_listing_page(&body, &root, Utc::now());

        if parsed.item_count == 0 {
            tracing::info!("No more listings found on page {} for {}", page, city);
            break;
        }

        tracing::info!(
            "Found {} listings on page {} for {}",
            parsed.item_count,
            page,
            city
        );

        // Every listing failing extraction points at a markup change, not at
        // individually malformed listings.
        if parsed.listings.is_empty() {
            tracing::warn!(
                "None of the {} listing elements on page {} for {} matched the expected shape",
                parsed.item_count,
                page,
                city
            );
        }

        collected.extend(parsed.listings);

        if !parsed.has_next {
            tracing::info!("No more pages available for {}", city);
            break;
        }
    }

    collected
}

/// Derives the site root used to absolutize relative listing links
fn site_root(base_url: &str) -> String {
    Url::parse(base_url)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| base_url.trim_end_matches('/').to_string())
}
