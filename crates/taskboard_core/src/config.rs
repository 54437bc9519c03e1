//! Store configuration.
//!
//! # Responsibility
//! - Name the remote resource, cache slot and fetch bound used by a store.
//! - Read overrides from `TASKBOARD_*` environment variables.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:5173/tracker.json";
pub const DEFAULT_STORAGE_KEY: &str = "dashboard_state";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_REMOTE_URL: &str = "TASKBOARD_REMOTE_URL";
const ENV_STORAGE_KEY: &str = "TASKBOARD_STORAGE_KEY";
const ENV_FETCH_TIMEOUT_MS: &str = "TASKBOARD_FETCH_TIMEOUT_MS";
const ENV_CACHE_PATH: &str = "TASKBOARD_CACHE_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { name, value } => write!(f, "invalid value for {name}: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// URL of the remote snapshot document.
    pub remote_url: String,
    /// Key of the local cache slot.
    pub storage_key: String,
    /// Upper bound on the bootstrap fetch before falling back to the cache.
    pub fetch_timeout: Duration,
    /// Cache database file; `None` keeps the cache in memory.
    pub cache_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache_path: None,
        }
    }
}

impl StoreConfig {
    pub fn with_remote_url(mut self, remote_url: impl Into<String>) -> Self {
        self.remote_url = remote_url.into();
        self
    }

    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(cache_path.into());
        self
    }

    /// Builds a config from defaults overridden by `TASKBOARD_*` variables.
    ///
    /// # Errors
    /// - Returns `ConfigError::Invalid` for a blank URL/key, or a timeout that
    ///   is not a positive integer of milliseconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REMOTE_URL) {
            config.remote_url = non_blank(ENV_REMOTE_URL, value)?;
        }
        if let Some(value) = lookup(ENV_STORAGE_KEY) {
            config.storage_key = non_blank(ENV_STORAGE_KEY, value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT_MS) {
            let millis = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or(ConfigError::Invalid {
                    name: ENV_FETCH_TIMEOUT_MS,
                    value: value.clone(),
                })?;
            config.fetch_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(ENV_CACHE_PATH) {
            config.cache_path = Some(PathBuf::from(non_blank(ENV_CACHE_PATH, value)?));
        }

        Ok(config)
    }
}

fn non_blank(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid { name, value });
    }
    Ok(trimmed.to_string())
}
