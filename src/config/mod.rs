//! Configuration management for blogmate
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Grade;

/// Upper bound for `datalab.max_retries`; backoff doubles per retry
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for `datalab.period_days` (ten years)
pub const MAX_PERIOD_DAYS: i64 = 3650;

/// Upper bound for `discovery.batch_delay_secs`
pub const MAX_BATCH_DELAY_SECS: f64 = 3600.0;

/// Upper bound for `cache.ttl_hours` (ten years)
pub const MAX_TTL_HOURS: u64 = 87_600;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Naver DataLab search trend API
    pub datalab: DataLabConfig,

    /// Naver autocomplete suggestions
    pub autocomplete: AutocompleteConfig,

    /// Discovery pipeline settings
    pub discovery: DiscoveryConfig,

    /// Result cache settings
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// DataLab API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLabConfig {
    /// Search trend endpoint URL
    pub endpoint: String,

    /// Application client ID (X-Naver-Client-Id)
    pub client_id: Option<String>,

    /// Application client secret (X-Naver-Client-Secret)
    pub client_secret: Option<String>,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries on 429/5xx before giving up
    pub max_retries: u32,

    /// Days of history requested, ending today
    pub period_days: i64,
}

impl DataLabConfig {
    /// Both credentials present and non-empty
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.client_id, &self.client_secret),
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty()
        )
    }
}

impl Default for DataLabConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://openapi.naver.com/v1/datalab/search"),
            client_id: None,
            client_secret: None,
            requests_per_second: 2,
            request_timeout_secs: 30,
            max_retries: 3,
            period_days: 90,
        }
    }
}

/// Autocomplete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    /// Autocomplete endpoint URL
    pub endpoint: String,

    /// Maximum suggestions kept per seed
    pub max_results: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Disable to never call the endpoint
    pub enabled: bool,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://ac.search.naver.com/nx/ac"),
            max_results: 10,
            request_timeout_secs: 5,
            enabled: true,
        }
    }
}

/// Discovery pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum candidate keywords per seed
    pub max_variants: usize,

    /// Keywords per DataLab request (1-5)
    pub batch_size: usize,

    /// Pause between batches in seconds
    pub batch_delay_secs: f64,

    /// Lowest grade kept in results
    pub default_min_grade: Grade,

    /// Read and write the result cache
    pub use_cache: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_variants: 30,
            batch_size: 5,
            batch_delay_secs: 1.0,
            default_min_grade: Grade::C,
            use_cache: true,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding entry files and the index
    pub dir: PathBuf,

    /// Entry lifetime in hours
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache"),
            ttl_hours: 24,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given (environment overrides on top), else from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables that are set
    fn apply_env(&mut self) {
        if let Ok(id) = std::env::var("NAVER_DATALAB_CLIENT_ID") {
            self.datalab.client_id = Some(id);
        }
        if let Ok(secret) = std::env::var("NAVER_DATALAB_CLIENT_SECRET") {
            self.datalab.client_secret = Some(secret);
        }
        if let Ok(endpoint) = std::env::var("BLOGMATE_DATALAB_ENDPOINT") {
            self.datalab.endpoint = endpoint;
        }
        if let Some(rps) = env_parse("BLOGMATE_REQUESTS_PER_SECOND") {
            self.datalab.requests_per_second = rps;
        }
        if let Some(timeout) = env_parse("BLOGMATE_REQUEST_TIMEOUT") {
            self.datalab.request_timeout_secs = timeout;
        }
        if let Some(enabled) = env_parse("BLOGMATE_AUTOCOMPLETE_ENABLED") {
            self.autocomplete.enabled = enabled;
        }
        if let Some(max_variants) = env_parse("BLOGMATE_MAX_VARIANTS") {
            self.discovery.max_variants = max_variants;
        }
        if let Some(batch_size) = env_parse("BLOGMATE_BATCH_SIZE") {
            self.discovery.batch_size = batch_size;
        }
        if let Some(delay) = env_parse("BLOGMATE_BATCH_DELAY") {
            self.discovery.batch_delay_secs = delay;
        }
        if let Some(grade) = env_parse::<Grade>("BLOGMATE_MIN_GRADE") {
            self.discovery.default_min_grade = grade;
        }
        if let Some(use_cache) = env_parse("BLOGMATE_CACHE_ENABLED") {
            self.discovery.use_cache = use_cache;
        }
        if let Ok(dir) = std::env::var("BLOGMATE_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(ttl) = env_parse("BLOGMATE_CACHE_TTL_HOURS") {
            self.cache.ttl_hours = ttl;
        }
        if let Ok(level) = std::env::var("BLOGMATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("BLOGMATE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.datalab.requests_per_second == 0 {
            anyhow::bail!("datalab.requests_per_second must be greater than 0");
        }

        if self.datalab.max_retries > MAX_RETRIES {
            anyhow::bail!("datalab.max_retries must be at most {MAX_RETRIES}");
        }

        if !(1..=MAX_PERIOD_DAYS).contains(&self.datalab.period_days) {
            anyhow::bail!("datalab.period_days must be between 1 and {MAX_PERIOD_DAYS}");
        }

        if self.discovery.max_variants == 0 {
            anyhow::bail!("discovery.max_variants must be greater than 0");
        }

        if self.discovery.batch_size == 0 {
            anyhow::bail!("discovery.batch_size must be greater than 0");
        }

        if !(0.0..=MAX_BATCH_DELAY_SECS).contains(&self.discovery.batch_delay_secs) {
            anyhow::bail!("discovery.batch_delay_secs must be between 0 and {MAX_BATCH_DELAY_SECS}");
        }

        if !(1..=MAX_TTL_HOURS).contains(&self.cache.ttl_hours) {
            anyhow::bail!("cache.ttl_hours must be between 1 and {MAX_TTL_HOURS}");
        }

        Ok(())
    }

    /// Cache entry lifetime
    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache.ttl_hours as i64)
    }

    /// Pause between DataLab batches
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs_f64(self.discovery.batch_delay_secs)
    }

    /// DataLab request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.datalab.request_timeout_secs)
    }
}
