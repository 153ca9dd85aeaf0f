use serde::{Deserialize, Serialize};

/// Main configuration structure for rentwatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Search filters applied to every city query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the listing search endpoint
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Cities to crawl, in order
    pub cities: Vec<String>,

    /// Monthly rent bounds; either side may be left open
    #[serde(rename = "price-range", default)]
    pub price_range: PriceRange,

    /// Minimum number of bedrooms
    #[serde(rename = "min-bedrooms")]
    pub min_bedrooms: Option<u32>,

    /// Minimum surface area in square meters
    #[serde(rename = "min-size")]
    pub min_size: Option<u32>,
}

/// Price bounds in whole euros
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Delay after every successful fetch, in seconds
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Maximum fetch attempts per page
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Hard ceiling on result pages per city
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Listings not re-seen for this many days are evicted
    #[serde(rename = "max-listings-age-days", default = "default_max_listings_age_days")]
    pub max_listings_age_days: i64,
}

/// Paths for the snapshot store and its side artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the latest-crawl diagnostic artifact, overwritten each run
    #[serde(rename = "raw-crawl-path", default = "default_raw_crawl_path")]
    pub raw_crawl_path: String,

    /// Path to the notification history file
    #[serde(rename = "history-path", default = "default_history_path")]
    pub history_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            raw_crawl_path: default_raw_crawl_path(),
            history_path: default_history_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.pararius.com/apartments".to_string()
}

fn default_request_delay() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_pages() -> u32 {
    5
}

fn default_max_listings_age_days() -> i64 {
    30
}

fn default_database_path() -> String {
    "./data/rentwatch.db".to_string()
}

fn default_raw_crawl_path() -> String {
    "./data/latest_crawl.json".to_string()
}

fn default_history_path() -> String {
    "./data/notification_history.json".to_string()
}
