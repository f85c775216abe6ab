//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables fall back to defaults instead of failing.
//! - Endpoint overrides must be `http://` or `https://` URLs.

use crate::logging::default_log_level;
use crate::seed::fetcher::DEFAULT_TODOS_ENDPOINT;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TODOLIST_DB_PATH";
pub const TODOS_URL_ENV: &str = "TODOLIST_TODOS_URL";
pub const LOG_LEVEL_ENV: &str = "TODOLIST_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TODOLIST_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "todolist.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "todolist-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidEndpoint(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => {
                write!(f, "todos endpoint must be an http(s) url, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Process-wide settings handed to the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub todos_endpoint: String,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let temp_dir = std::env::temp_dir();
        Self {
            db_path: temp_dir.join(DEFAULT_DB_FILE_NAME),
            todos_endpoint: DEFAULT_TODOS_ENDPOINT.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: temp_dir.join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl AppConfig {
    /// Reads `TODOLIST_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(endpoint) = read(TODOS_URL_ENV) {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(endpoint));
            }
            config.todos_endpoint = endpoint;
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
