//! TabFetch - concurrent JSON API fetcher with CSV export
//!
//! Fetches a fixed (or configured) list of JSON endpoints
//! concurrently, assembles the per-endpoint results into a table over
//! the union of all observed fields, drops incomplete and errored
//! rows, and writes the remainder to a CSV file.
//!
//! Exit codes:
//!   0 - Success (the output file was written)
//!   1 - Runtime error (invalid arguments, config failure, output
//!       write failure). Individual fetch failures are NOT errors:
//!       they become filtered-out rows.

mod cli;
mod config;
mod export;
mod fetcher;
mod models;
mod table;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use fetcher::{FetchConfig, Fetcher};
use std::path::Path;
use table::ResultTable;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        match handle_init_config() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    init_logging(&args);

    debug!("Arguments: {:?}", args);

    match run_pipeline(args).await {
        Ok(()) => {
            std::process::exit(0);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tabfetch.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("Created {} with default settings.", config::CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete fetch-clean-export pipeline.
async fn run_pipeline(args: Args) -> Result<()> {
    // Load configuration and layer CLI arguments on top
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let targets = config.general.targets.clone();
    let output = Path::new(&config.general.output).to_path_buf();

    if targets.is_empty() {
        anyhow::bail!("No target URLs configured");
    }

    // Stage 1: fetch every target concurrently
    info!("Fetching {} endpoints", targets.len());
    let fetch_config = FetchConfig {
        timeout_seconds: config.fetch.timeout_seconds,
        concurrency: config.fetch.concurrency,
    };
    let fetcher = Fetcher::new(&fetch_config)?;
    let records = fetcher.fetch_all(&targets).await;

    let failures = records.iter().filter(|r| r.is_failure()).count();
    if failures > 0 {
        warn!("{} of {} fetches failed", failures, records.len());
    }

    // Stage 2: tabulate, clean, and export
    let mut table = ResultTable::from_records(&records);
    debug!(
        "Built table: {} rows, {} columns before filtering",
        table.len(),
        table.columns().len()
    );

    table.retain_complete();
    info!("{} rows remain after filtering", table.len());

    export::write_csv(&table, &output)?;

    println!(
        "Data fetched, processed, and saved to '{}'.",
        output.display()
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
