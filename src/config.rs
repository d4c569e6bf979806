//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tabfetch.toml` files. Running with no config file (and no CLI
//! arguments) reproduces the built-in defaults: the three example
//! endpoints and `processed_data.csv` in the working directory.

use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".tabfetch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fetch stage settings.
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Target URLs to fetch.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    /// Output CSV file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            output: default_output(),
        }
    }
}

fn default_targets() -> Vec<String> {
    vec![
        "https://jsonplaceholder.typicode.com/posts/1".to_string(),
        "https://jsonplaceholder.typicode.com/users/1".to_string(),
        "https://jsonplaceholder.typicode.com/todos/1".to_string(),
    ]
}

fn default_output() -> String {
    "processed_data.csv".to_string()
}

/// Fetch stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

impl Config {
    /// Load configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate values a config file could set out of range, mirroring
    /// the checks `Args::validate` applies to CLI input.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be at least 1");
        }
        if self.fetch.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        for url in &self.general.targets {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!(
                    "Target URL must start with 'http://' or 'https://': {}",
                    url
                );
            }
        }
        Ok(())
    }

    /// Load configuration from the default location, if present.
    pub fn load_default() -> Result<Option<Self>> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::load(path)?))
    }

    /// Merge command-line arguments into this config. CLI values take
    /// precedence over the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if !args.urls.is_empty() {
            self.general.targets = args.urls.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(timeout) = args.timeout {
            self.fetch.timeout_seconds = timeout;
        }
        if let Some(concurrency) = args.concurrency {
            self.fetch.concurrency = concurrency;
        }
    }

    /// A commented default config file, for `--init-config`.
    pub fn default_toml() -> String {
        r#"# TabFetch configuration
# CLI arguments override anything set here.

[general]
# Target URLs to fetch (one GET per entry, issued concurrently).
targets = [
    "https://jsonplaceholder.typicode.com/posts/1",
    "https://jsonplaceholder.typicode.com/users/1",
    "https://jsonplaceholder.typicode.com/todos/1",
]
# Output CSV path. Overwritten without confirmation.
output = "processed_data.csv"

[fetch]
# Per-request timeout in seconds.
timeout_seconds = 30
# Maximum number of requests in flight at once.
concurrency = 8
"#
        .to_string()
    }
}
