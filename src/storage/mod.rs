//! Snapshot store for the canonical listing set
//!
//! This module persists everything that survives between runs:
//! - the canonical listing snapshot the reconciler merges against
//! - the latest-raw-crawl diagnostic artifact
//! - per-run statistics, pruned to a bounded history

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{RunRecord, RunStats, SnapshotStore, StorageError, StorageResult};
