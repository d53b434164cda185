//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (RISE_EDR_*)
//! 2. TOML config file (if RISE_EDR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which [`crate::CacheStore`] implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Local SQLite file at `db_path`.
    #[default]
    Sqlite,
    /// External Redis database at `redis_url`.
    Redis,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (RISE_EDR_*)
/// 2. TOML config file (if RISE_EDR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache backend selector.
    ///
    /// Set via RISE_EDR_CACHE_BACKEND (`sqlite` or `redis`).
    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Path to the SQLite cache database.
    ///
    /// Set via RISE_EDR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Redis connection string, required when `cache_backend = "redis"`.
    ///
    /// Set via RISE_EDR_REDIS_URL environment variable.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Host prefixed to relationship ids such as `/rise/api/catalog-item/1`.
    ///
    /// Set via RISE_EDR_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via RISE_EDR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via RISE_EDR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound on in-flight requests during a group fetch.
    ///
    /// Set via RISE_EDR_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./rise-cache.sqlite")
}

fn default_base_url() -> String {
    "https://data.usbr.gov".into()
}

fn default_user_agent() -> String {
    "rise-edr/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_concurrency() -> usize {
    16
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_backend: CacheBackend::default(),
            db_path: default_db_path(),
            redis_url: None,
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Location collection endpoint.
    pub fn location_api(&self) -> String {
        format!("{}/rise/api/location", self.base_url.trim_end_matches('/'))
    }

    /// Parameter collection endpoint.
    pub fn parameter_api(&self) -> String {
        format!("{}/rise/api/parameter", self.base_url.trim_end_matches('/'))
    }

    /// Result (time series) endpoint.
    pub fn result_api(&self) -> String {
        format!("{}/rise/api/result", self.base_url.trim_end_matches('/'))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `RISE_EDR_`
    /// 2. TOML file from `RISE_EDR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("RISE_EDR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("RISE_EDR_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Redis URL, checked lazily because only the redis backend needs it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Redis URL is not set.
    pub fn require_redis_url(&self) -> Result<&str, ConfigError> {
        self.redis_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "redis_url".into(),
            hint: "Set RISE_EDR_REDIS_URL environment variable".into(),
        })
    }
}
