//! Rentwatch main entry point
//!
//! Command-line interface for the apartment-listing watcher. One invocation
//! is one pipeline run; scheduling is left to cron or CI.

use chrono::Utc;
use clap::Parser;
use rentwatch::config::{load_config_with_hash, Config};
use rentwatch::notify::GitHubNotifier;
use rentwatch::pipeline;
use rentwatch::search::build_search_url;
use rentwatch::storage::{RunStats, SnapshotStore, SqliteStorage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Number of run-history rows kept in the snapshot store
const RUN_HISTORY_LIMIT: usize = 100;

/// Rentwatch: a polite apartment-listing watcher
///
/// Crawls the configured city searches, reconciles the results against the
/// stored snapshot, and opens a notification issue when listings appear or
/// change.
#[derive(Parser, Debug)]
#[command(name = "rentwatch")]
#[command(version)]
#[command(about = "A polite apartment-listing watcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show recent run statistics and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // A missing or invalid configuration is fatal before any fetch occurs
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        return handle_stats(&config);
    }

    handle_run(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rentwatch=info,warn"),
            1 => EnvFilter::new("rentwatch=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the planned crawl
fn handle_dry_run(config: &Config) {
    println!("=== Rentwatch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Request delay: {}s", config.crawler.request_delay);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Max pages per city: {}", config.crawler.max_pages);
    println!(
        "  Max listing age: {} days",
        config.crawler.max_listings_age_days
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Raw crawl artifact: {}", config.storage.raw_crawl_path);

    println!("\nCities ({}):", config.search.cities.len());
    for city in &config.search.cities {
        println!("  - {}", city);
        println!("    * {}", build_search_url(&config.search, city, 1));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: prints recent run history from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStorage::open(&config.storage)?;
    let runs = store.recent_runs(20)?;

    if runs.is_empty() {
        println!("No runs recorded yet");
        return Ok(());
    }

    println!("=== Recent Runs ===\n");
    for run in runs {
        let status = if run.stats.success { "ok" } else { "FAILED" };
        println!(
            "#{} {} [{}] ({:.1}s)",
            run.id,
            run.stats.started_at.format("%Y-%m-%d %H:%M:%S"),
            status,
            run.stats.duration_seconds
        );
        println!(
            "    added {}, updated {}, total {}, evicted {}, notified: {}",
            run.stats.added,
            run.stats.updated,
            run.stats.total,
            run.stats.evicted,
            run.stats.notification_sent
        );
        for error in &run.stats.errors {
            println!("    error: {}", error);
        }
    }

    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!("Starting apartment listing watch run");
    let start = std::time::Instant::now();
    let mut stats = RunStats::new(Utc::now(), config_hash);

    let mut store = SqliteStorage::open(&config.storage)?;
    let notifier = GitHubNotifier::from_env(&config.search, config.storage.history_path.clone());

    // Unexpected failures are recorded and the stats persisted regardless
    if let Err(e) = pipeline::run(&config, &mut store, &notifier, &mut stats).await {
        tracing::error!("Error during execution: {}", e);
        stats.errors.push(format!("Error during execution: {}", e));
    }

    stats.duration_seconds = start.elapsed().as_secs_f64();
    tracing::info!("Run completed in {:.2} seconds", stats.duration_seconds);

    // Run statistics are persisted in all paths, success or not
    match store.record_run(&stats) {
        Ok(_) => {
            if let Err(e) = store.prune_runs(RUN_HISTORY_LIMIT) {
                tracing::warn!("Failed to prune run history: {}", e);
            }
            tracing::info!("Run statistics saved");
        }
        Err(e) => tracing::error!("Failed to save run statistics: {}", e),
    }

    if stats.success {
        Ok(())
    } else {
        anyhow::bail!("run finished with errors; see logs above")
    }
}
