//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::collect::{ScheduleOptions, ValidationPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fuzzy match threshold (0-100)
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Items to collect per run; 0 means no limit
    #[serde(default = "default_target_items")]
    pub target_items: usize,

    /// Listings requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard limit on pages fetched per run
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between page fetches in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Extra attempts for transient fetch failures
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// First retry backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Per-item validation deadline in milliseconds
    #[serde(default = "default_validation_timeout_ms")]
    pub validation_timeout_ms: Option<u64>,

    #[serde(default = "default_on_validation_error")]
    pub on_validation_error: ValidationPolicy,

    #[serde(default = "default_on_validation_timeout")]
    pub on_validation_timeout: ValidationPolicy,

    /// Title substrings excluded from storefront listings
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    /// Remove "<word> Edition" fragments from titles
    #[serde(default)]
    pub strip_edition: bool,

    /// Steam search endpoint; `{start}` and `{count}` are substituted
    #[serde(default = "default_steam_search_url")]
    pub steam_search_url: String,

    /// Metacritic browse endpoint; `{page}` is substituted (1-based)
    #[serde(default = "default_metacritic_browse_url")]
    pub metacritic_browse_url: String,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_threshold() -> u8 {
    90
}

fn default_target_items() -> usize {
    8000
}

fn default_page_size() -> u32 {
    100
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_fetch_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_validation_timeout_ms() -> Option<u64> {
    Some(15_000)
}

fn default_on_validation_error() -> ValidationPolicy {
    ValidationPolicy::Accept
}

fn default_on_validation_timeout() -> ValidationPolicy {
    ValidationPolicy::Reject
}

fn default_exclude_keywords() -> Vec<String> {
    vec!["+18".to_string(), "pack".to_string()]
}

fn default_steam_search_url() -> String {
    "https://store.steampowered.com/search/?filter=topsellers&os=win&cc=tr&count={count}&start={start}"
        .to_string()
}

fn default_metacritic_browse_url() -> String {
    "https://www.metacritic.com/browse/game/?releaseYearMin=2003&releaseYearMax=2024&page={page}"
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            target_items: default_target_items(),
            page_size: default_page_size(),
            max_pages: None,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            fetch_retries: default_fetch_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            validation_timeout_ms: default_validation_timeout_ms(),
            on_validation_error: default_on_validation_error(),
            on_validation_timeout: default_on_validation_timeout(),
            exclude_keywords: default_exclude_keywords(),
            strip_edition: false,
            steam_search_url: default_steam_search_url(),
            metacritic_browse_url: default_metacritic_browse_url(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("game-catalog").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("GAMECAT_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("GAMECAT_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(threshold) = std::env::var("GAMECAT_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                self.threshold = t;
            }
        }

        if let Ok(target) = std::env::var("GAMECAT_TARGET") {
            if let Ok(t) = target.parse() {
                self.target_items = t;
            }
        }

        self
    }

    /// Scheduler tuning derived from this configuration.
    pub fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions {
            target: (self.target_items > 0).then_some(self.target_items),
            max_pages: self.max_pages,
            fetch_retries: self.fetch_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            validation_timeout: self.validation_timeout_ms.map(Duration::from_millis),
            on_validation_error: self.on_validation_error,
            on_validation_timeout: self.on_validation_timeout,
            strip_edition: self.strip_edition,
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
