use std::path::PathBuf;

use seatplan_core::history::HistoryConfig;
use seatplan_store::repositories::Settings;

/// Default store location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "seatplan.json";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str =
    "seatplan_cli=info,seatplan_core=info,seatplan_store=info,seatplan_events=info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    /// Overrides the `max_history_items` setting when set.
    pub history_capacity: Option<usize>,
    /// Fixed seed for reproducible seating generation.
    pub seed: Option<u64>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            history_capacity: None,
            seed: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default          |
    /// |------------------------|------------------|
    /// | `SEATPLAN_DATA`        | `seatplan.json`  |
    /// | `SEATPLAN_HISTORY_CAP` | stored setting   |
    /// | `SEATPLAN_SEED`        | random           |
    /// | `LOG_FORMAT`           | `text`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_path = lookup("SEATPLAN_DATA")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let history_capacity = match lookup("SEATPLAN_HISTORY_CAP") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(cap) if cap >= 1 => Some(cap),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SEATPLAN_HISTORY_CAP",
                        value,
                        expected: "a positive integer",
                    })
                }
            },
            None => None,
        };

        let seed = match lookup("SEATPLAN_SEED") {
            Some(value) => Some(value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "SEATPLAN_SEED",
                value: value.clone(),
                expected: "an unsigned integer",
            })?),
            None => None,
        };

        let log_format = match lookup("LOG_FORMAT") {
            None => LogFormat::Text,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LOG_FORMAT",
                        value,
                        expected: "'text' or 'json'",
                    })
                }
            },
        };

        Ok(Self {
            data_path,
            history_capacity,
            seed,
            log_format,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, data_path: Option<PathBuf>, seed: Option<u64>) -> Self {
        if let Some(path) = data_path {
            self.data_path = path;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// History capacity from the environment, falling back to the stored
    /// settings.
    pub fn history_config(&self, settings: &Settings) -> HistoryConfig {
        match self.history_capacity {
            Some(capacity) => HistoryConfig { capacity },
            None => settings.history_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SEATPLAN_DATA", "/tmp/class.json"),
            ("SEATPLAN_HISTORY_CAP", "12"),
            ("SEATPLAN_SEED", "42"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/class.json"));
        assert_eq!(config.history_capacity, Some(12));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        assert_matches!(
            AppConfig::from_lookup(lookup(&[("SEATPLAN_HISTORY_CAP", "0")])),
            Err(ConfigError::Invalid { var: "SEATPLAN_HISTORY_CAP", .. })
        );
        assert_matches!(
            AppConfig::from_lookup(lookup(&[("SEATPLAN_SEED", "-1")])),
            Err(ConfigError::Invalid { var: "SEATPLAN_SEED", .. })
        );
        assert_matches!(
            AppConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        );
    }

    #[test]
    fn overrides_and_settings_fallback() {
        let config = AppConfig::default().with_overrides(Some("other.json".into()), Some(7));
        assert_eq!(config.data_path, PathBuf::from("other.json"));
        assert_eq!(config.seed, Some(7));

        let settings = Settings {
            max_history_items: 20,
            ..Default::default()
        };
        assert_eq!(config.history_config(&settings).capacity, 20);
        let capped = AppConfig {
            history_capacity: Some(5),
            ..config
        };
        assert_eq!(capped.history_config(&settings).capacity, 5);
    }
}
