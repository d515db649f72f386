//! Store and logging configuration from the environment.
//!
//! # Responsibility
//! - Resolve where the live and log stores live and how to log.
//!
//! # Invariants
//! - Both store paths are required; logging settings are optional.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const LIVE_DB_VAR: &str = "SCREENING_LIVE_DB";
pub const LOG_DB_VAR: &str = "SCREENING_LOG_DB";
pub const LOG_DIR_VAR: &str = "SCREENING_LOG_DIR";
pub const LOG_LEVEL_VAR: &str = "SCREENING_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is required")]
    MissingVar(&'static str),
}

/// Resolved bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub live_path: PathBuf,
    pub log_path: PathBuf,
    /// Rolling log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl StoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| read(name).ok_or(ConfigError::MissingVar(name));

        Ok(Self {
            live_path: PathBuf::from(required(LIVE_DB_VAR)?),
            log_path: PathBuf::from(required(LOG_DB_VAR)?),
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
            log_level: read(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, LIVE_DB_VAR, LOG_DB_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_required_paths_and_defaults_level() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (LIVE_DB_VAR, "/data/live.db"),
            (LOG_DB_VAR, "/data/log.db"),
        ]))
        .unwrap();

        assert_eq!(config.live_path, PathBuf::from("/data/live.db"));
        assert_eq!(config.log_path, PathBuf::from("/data/log.db"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn blank_required_value_is_missing() {
        let err = StoreConfig::from_lookup(lookup_from(&[
            (LIVE_DB_VAR, "/data/live.db"),
            (LOG_DB_VAR, "   "),
            (LOG_LEVEL_VAR, "warn"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::MissingVar(LOG_DB_VAR));
    }
}
