//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values. Every option is optional:
//! running the binary with no arguments fetches the built-in endpoint
//! list and writes `processed_data.csv` to the working directory.

use clap::Parser;
use std::path::PathBuf;

/// TabFetch - concurrent JSON API fetcher with CSV export
///
/// Fetches a list of JSON endpoints concurrently, assembles the
/// results into a table over the union of all observed fields, drops
/// incomplete and errored rows, and writes the rest as CSV.
///
/// Examples:
///   tabfetch
///   tabfetch https://api.example.com/a https://api.example.com/b
///   tabfetch --output results.csv --timeout 10
///   tabfetch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Target URLs to fetch
    ///
    /// One GET request per URL, issued concurrently. When omitted, the
    /// built-in endpoint list (or the config file's targets) is used.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Output file path for the CSV
    ///
    /// Overwritten without confirmation if it already exists.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECONDS", env = "TABFETCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Maximum number of requests in flight at once
    #[arg(short, long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Path to a config file (defaults to .tabfetch.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .tabfetch.toml in the current directory and exit
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        for url in &self.urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "Target URL must start with 'http://' or 'https://': {}",
                    url
                ));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err("Concurrency must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
