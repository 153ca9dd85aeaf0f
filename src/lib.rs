//! Rentwatch: a polite apartment-listing watcher
//!
//! This crate implements a batch crawler that fetches apartment-listing search
//! pages from a rental site, extracts structured records from the markup, and
//! reconciles them against a previously stored snapshot to find listings that
//! are new, updated, or expired.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod search;
pub mod storage;

use thiserror::Error;

/// Main error type for rentwatch operations
#[derive(Debug, Error)]
pub enum RentwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for rentwatch operations
pub type Result<T> = std::result::Result<T, RentwatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use listing::ListingRecord;
pub use reconcile::{reconcile, ReconcileOutcome};
pub use storage::{RunStats, SnapshotStore};
