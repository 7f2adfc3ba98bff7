//! Configuration loading for the session core
//!
//! Settings are loaded from (in order of priority):
//! 1. JSON file (~/.config/swiper/swiper.json)
//! 2. Runtime environment variables
//! 3. Built-in defaults
//!
//! Every field has a default, so a partial settings file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sync::BackoffPolicy;

/// Settings filename in the swiper config directory
const SETTINGS_FILE: &str = "swiper.json";

/// Database filename in the swiper config directory
const DATABASE_FILE: &str = "swiper.sqlite";

const ENV_API_URL: &str = "SWIPER_API_URL";
const ENV_FLUSH_INTERVAL_MS: &str = "SWIPER_FLUSH_INTERVAL_MS";
const ENV_DB_PATH: &str = "SWIPER_DB_PATH";

/// Session core settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwiperConfig {
    /// Base URL of the deck API
    pub api_base_url: String,
    /// Period of the background queue flush
    pub flush_interval_ms: u64,
    /// Delay before the first background flush
    pub initial_flush_delay_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Delay between identity lookups while the identity is not yet known
    pub identity_retry_delay_ms: u64,
    /// Identity lookups before an explicit fetch or reload gives up.
    /// The startup fetch keeps waiting past this and only logs.
    pub identity_retry_attempts: u32,
    pub countdown_tick_ms: u64,
    /// Quota shown until the remote reports one
    pub default_daily_limit: u32,
    pub request_timeout_secs: u64,
    /// Durable store location; defaults to the config directory
    pub db_path: Option<PathBuf>,
}

impl Default for SwiperConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/stocks".to_string(),
            flush_interval_ms: 5_000,
            initial_flush_delay_ms: 2_000,
            backoff_base_ms: 500,
            backoff_max_ms: 15_000,
            identity_retry_delay_ms: 300,
            identity_retry_attempts: 10,
            countdown_tick_ms: 1_000,
            default_daily_limit: 20,
            request_timeout_secs: 10,
            db_path: None,
        }
    }
}

impl SwiperConfig {
    /// Load settings using the following priority:
    /// 1. JSON file (~/.config/swiper/swiper.json)
    /// 2. Runtime environment variables over the defaults
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }

        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Defaults overridden by whichever environment variables are set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            settings.api_base_url = url;
        }
        if let Some(interval) = lookup(ENV_FLUSH_INTERVAL_MS) {
            settings.flush_interval_ms = interval
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {}", ENV_FLUSH_INTERVAL_MS, interval))?;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            settings.db_path = Some(PathBuf::from(path));
        }

        Ok(settings)
    }

    /// Get the default settings file path (~/.config/swiper/swiper.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Resolved durable store location
    pub fn database_path(&self) -> Option<PathBuf> {
        self.db_path
            .clone()
            .or_else(|| config::config_path(DATABASE_FILE))
    }

    pub fn flush_interval(&self) -> Duration {
        // A zero period would spin the flush loop
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn initial_flush_delay(&self) -> Duration {
        Duration::from_millis(self.initial_flush_delay_ms)
    }

    pub fn identity_retry_delay(&self) -> Duration {
        Duration::from_millis(self.identity_retry_delay_ms.max(1))
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }
}
