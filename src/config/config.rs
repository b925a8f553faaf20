use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::app_paths::AppPaths;
use crate::models::{Platform, SortKey};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub behavior: BehaviorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Insider Trends backend.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Quiescence window for search parameter edits, in milliseconds.
    pub debounce_ms: u64,

    /// How long a cached search result is served without refetching.
    pub cache_ttl_secs: u64,

    /// Page size requested from the search endpoint.
    pub page_size: usize,

    /// Default platform filter: "instagram" or "tiktok".
    pub default_platform: String,

    /// Default result ordering, in backend notation.
    pub default_sort: String,

    /// Liveness probe interval, in seconds.
    pub health_poll_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of placeholder rows rendered while a search is loading.
    pub skeleton_rows: usize,

    /// Show the recent-log tail at the bottom of the TUI.
    pub show_log_tail: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            cache_ttl_secs: 60,
            page_size: 24,
            default_platform: "instagram".to_string(),
            default_sort: "score_trend:desc".to_string(),
            health_poll_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            skeleton_rows: 8,
            show_log_tail: true,
        }
    }
}

impl Config {
    /// Load from the default location, creating the file with defaults on
    /// first run.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }
        let contents = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        AppPaths::config_file()
    }

    pub fn platform(&self) -> Platform {
        Platform::parse(&self.behavior.default_platform).unwrap_or_default()
    }

    pub fn sort(&self) -> SortKey {
        SortKey::parse(&self.behavior.default_sort).unwrap_or_default()
    }

    /// A commented template for `--generate-config`.
    pub fn template() -> &'static str {
        r#"# trends-cli configuration
# Location: ~/.config/trends-cli/config.toml (Linux)
#           ~/Library/Application Support/trends-cli/config.toml (macOS)

[api]
# Base URL of the Insider Trends backend
base_url = "http://localhost:8000"

[behavior]
# Quiescence window for search edits (milliseconds)
debounce_ms = 300

# How long a cached search result stays fresh (seconds)
cache_ttl_secs = 60

# Results requested per search
page_size = 24

# Default platform: "instagram" or "tiktok"
default_platform = "instagram"

# Default ordering: "score_trend:desc", "posted_at:desc" or "like_count:desc"
default_sort = "score_trend:desc"

# Backend liveness probe interval (seconds)
health_poll_secs = 30

[display]
# Placeholder rows shown while a search is loading
skeleton_rows = 8

# Show recent log lines at the bottom of the TUI
show_log_tail = true
"#
    }
}
