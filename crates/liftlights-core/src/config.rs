//! Configuration loading and typed config structures for the lights service.
//!
//! Configuration lives in an optional `liftlights.yaml` next to the
//! binary's working directory. Every field has a default (10 second
//! auto-reset, 100 ms display cadence, port 8080), so a missing file or
//! an empty document is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::event_channel::MIN_EVENT_CAPACITY;

/// Environment variable naming an alternative config file path.
pub const CONFIG_PATH_ENV: &str = "LIFTLIGHTS_CONFIG";

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "liftlights.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LightsConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ListenConfig,

    /// Round lifecycle settings.
    #[serde(default)]
    pub round: RoundConfig,

    /// Display consumer settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LightsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `LIFTLIGHTS_HOST` overrides `server.host`
    /// - `LIFTLIGHTS_PORT` overrides `server.port`
    /// - `LIFTLIGHTS_RESET_DELAY_MS` overrides `round.reset_delay_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Split out from [`apply_env_overrides`](Self::apply_env_overrides)
    /// so overrides can be exercised without touching the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("LIFTLIGHTS_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("LIFTLIGHTS_PORT") {
            self.server.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("LIFTLIGHTS_PORT={val}: {e}")))?;
        }
        if let Some(val) = lookup("LIFTLIGHTS_RESET_DELAY_MS") {
            self.round.reset_delay_ms = val.parse().map_err(|e| {
                ConfigError::Invalid(format!("LIFTLIGHTS_RESET_DELAY_MS={val}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Reject values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round.reset_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "round.reset_delay_ms must be greater than 0".to_owned(),
            ));
        }
        if self.display.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "display.poll_interval_ms must be greater than 0".to_owned(),
            ));
        }
        if self.display.event_capacity < MIN_EVENT_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "display.event_capacity must be at least {MIN_EVENT_CAPACITY}"
            )));
        }
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Round lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoundConfig {
    /// How long the lights stay on after a decision before resetting.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

impl RoundConfig {
    /// The auto-reset delay as a [`Duration`].
    pub const fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

/// Display consumer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// How often the display loop drains the event channel.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of unconsumed light events held at once.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl DisplayConfig {
    /// The poll cadence as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one event per line.
    #[default]
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_reset_delay_ms() -> u64 {
    10_000
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_event_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LightsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.round.reset_delay(), Duration::from_secs(10));
        assert_eq!(config.display.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.display.event_capacity, 256);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9443
round:
  reset_delay_ms: 5000
display:
  poll_interval_ms: 50
  event_capacity: 32
logging:
  level: "debug"
  format: "json"
"#;
        let config: LightsConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.round.reset_delay_ms, 5000);
        assert_eq!(config.display.poll_interval_ms, 50);
        assert_eq!(config.display.event_capacity, 32);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "round:\n  reset_delay_ms: 3000\n";
        let config: LightsConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.round.reset_delay_ms, 3000);
        // Everything else uses defaults
        assert_eq!(config.server, ListenConfig::default());
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        let config: Result<LightsConfig, _> = serde_yml::from_str("");
        assert!(config.is_ok());
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let mut env = BTreeMap::new();
        env.insert("LIFTLIGHTS_HOST", "10.0.0.5");
        env.insert("LIFTLIGHTS_PORT", "443");
        env.insert("LIFTLIGHTS_RESET_DELAY_MS", "2500");

        let mut config = LightsConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.server.host, "10.0.0.5");
        assert_eq!(config.server.port, 443);
        assert_eq!(config.round.reset_delay_ms, 2500);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = LightsConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "LIFTLIGHTS_PORT").then(|| String::from("not-a-port"))
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_values_fail_validation() {
        let mut config = LightsConfig::default();
        config.round.reset_delay_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = LightsConfig::default();
        config.display.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = LightsConfig::default();
        config.display.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn capacity_below_one_round_fails_validation() {
        let mut config = LightsConfig::default();
        config.display.event_capacity = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.display.event_capacity = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_override_in_yaml_is_checked() {
        let result = LightsConfig::parse("display:\n  event_capacity: 1\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
