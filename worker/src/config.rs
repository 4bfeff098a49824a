//! FILENAME: worker/src/config.rs
// PURPOSE: Process-level settings for the worker, read from the environment.

use crate::error::WorkerError;
use log::LevelFilter;
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "CHART_WORKER_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "CHART_WORKER_LOG_FILE";
pub const ENV_MAX_MESSAGE_BYTES: &str = "CHART_WORKER_MAX_MESSAGE_BYTES";

/// Default upper bound on one request line.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub log_level: LevelFilter,
    /// Log lines are also appended here when set.
    pub log_file: Option<PathBuf>,
    pub max_message_bytes: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            log_level: LevelFilter::Info,
            log_file: None,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unset or blank keys keep
    /// their defaults; values that do not parse are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = WorkerConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level
                .parse::<LevelFilter>()
                .map_err(|_| WorkerError::Config(format!("{}: unknown log level '{}'", ENV_LOG_LEVEL, level)))?;
        }

        config.log_file = get(ENV_LOG_FILE).map(PathBuf::from);

        if let Some(bytes) = get(ENV_MAX_MESSAGE_BYTES) {
            config.max_message_bytes = bytes
                .replace('_', "")
                .parse::<usize>()
                .ok()
                .filter(|&b| b > 0)
                .ok_or_else(|| {
                    WorkerError::Config(format!("{}: expected a positive byte count, got '{}'", ENV_MAX_MESSAGE_BYTES, bytes))
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = WorkerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.max_message_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn reads_every_setting() {
        let config = WorkerConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FILE, "/tmp/chart-worker.log"),
            (ENV_MAX_MESSAGE_BYTES, "1_048_576"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/chart-worker.log")));
        assert_eq!(config.max_message_bytes, 1_048_576);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(WorkerConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).is_err());
        assert!(WorkerConfig::from_lookup(lookup(&[(ENV_MAX_MESSAGE_BYTES, "0")])).is_err());
        assert!(WorkerConfig::from_lookup(lookup(&[(ENV_MAX_MESSAGE_BYTES, "lots")])).is_err());
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[(ENV_LOG_FILE, "  ")])).unwrap();
        assert!(config.log_file.is_none());
    }
}
