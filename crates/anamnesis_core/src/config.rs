//! Core runtime configuration.
//!
//! Resolved once at process startup and passed to callers, so that core
//! code never reads environment variables while handling requests.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "ANAMNESIS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ANAMNESIS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ANAMNESIS_LOG_DIR";
pub const ENV_LIST_LIMIT: &str = "ANAMNESIS_LIST_LIMIT";

const DEFAULT_DB_FILE_NAME: &str = "anamnesis.sqlite3";
const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Core configuration resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    db_path: PathBuf,
    log_level: String,
    log_dir: Option<PathBuf>,
    list_default_limit: u32,
    list_max_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            list_default_limit: DEFAULT_LIST_LIMIT,
            list_max_limit: MAX_LIST_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(raw) = get(ENV_LIST_LIMIT) {
            config.list_default_limit = match raw.trim().parse::<u32>() {
                Ok(limit) if limit > 0 => limit.min(MAX_LIST_LIMIT),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LIST_LIMIT,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Directory for rolling log files; `None` disables file logging.
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    pub fn list_default_limit(&self) -> u32 {
        self.list_default_limit
    }

    pub fn list_max_limit(&self) -> u32 {
        self.list_max_limit
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LIST_LIMIT, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::Path;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.list_default_limit(), 20);
        assert!(config.log_dir().is_none());
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/templates.db"),
            (ENV_LOG_DIR, "/tmp/anamnesis-logs"),
            (ENV_LIST_LIMIT, "500"),
        ]))
        .unwrap();

        assert_eq!(config.db_path(), Path::new("/tmp/templates.db"));
        assert_eq!(config.log_dir(), Some(Path::new("/tmp/anamnesis-logs")));
        assert_eq!(config.list_default_limit(), 100);
    }

    #[test]
    fn non_numeric_list_limit_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_LIST_LIMIT, "many")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_LIST_LIMIT,
                value: "many".to_string()
            }
        );
    }
}
