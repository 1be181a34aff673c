//! Configuration loading and typed config structures for notecache.
//!
//! The canonical configuration lives in `notecache-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a loader
//! that reads the file. Every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! cache:
//!   expiration_ms: 3600000
//!   sweep_interval_ms: 3600000
//! games:
//!   genshin:
//!     resource_rate_secs: 480
//!   starrail:
//!     resource_rate_secs: 360
//! infrastructure:
//!   dragonfly_url: redis://localhost:6379
//! reminder:
//!   blacklist: [honkai, tot]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

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
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotecacheConfig {
    /// Cache expiration and sweep timing.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-game simulation parameters, keyed by platform name.
    #[serde(default)]
    pub games: BTreeMap<String, GameConfig>,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Dailies reminder settings.
    #[serde(default)]
    pub reminder: ReminderConfig,
}

impl NotecacheConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        for (name, game) in &self.games {
            if game.resource_rate_secs == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("games.{name}.resource_rate_secs must be at least 1"),
                });
            }
        }
        Ok(())
    }

    /// Regeneration rate for `game`, if configured.
    pub fn resource_rate(&self, game: &str) -> Option<Duration> {
        self.games
            .get(game)
            .map(|g| Duration::from_secs(g.resource_rate_secs))
    }
}

/// Cache timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Age in milliseconds after which an entry is dropped regardless of
    /// its contents.
    #[serde(default = "default_expiration_ms")]
    pub expiration_ms: u64,

    /// Milliseconds between background sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    /// Entry expiration as a [`Duration`].
    pub const fn expiration(&self) -> Duration {
        Duration::from_millis(self.expiration_ms)
    }

    /// Sweep interval as a [`Duration`].
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Reject zero expiration or sweep interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either value is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "cache.expiration_ms must be at least 1".to_owned(),
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "cache.sweep_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiration_ms: default_expiration_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Per-game simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Seconds needed to regenerate one unit of the primary resource.
    #[serde(default = "default_resource_rate_secs")]
    pub resource_rate_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            resource_rate_secs: default_resource_rate_secs(),
        }
    }
}

/// Infrastructure connection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `Dragonfly` URL for the secondary cache tier. Memory-only when unset.
    #[serde(default)]
    pub dragonfly_url: Option<String>,
}

impl InfrastructureConfig {
    /// Override the `Dragonfly` URL with `DRAGONFLY_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = Some(val);
        }
    }
}

/// Dailies reminder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReminderConfig {
    /// Platforms that never receive dailies reminders.
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            blacklist: default_blacklist(),
        }
    }
}

const fn default_expiration_ms() -> u64 {
    3_600_000
}

const fn default_sweep_interval_ms() -> u64 {
    3_600_000
}

const fn default_resource_rate_secs() -> u64 {
    480
}

fn default_blacklist() -> Vec<String> {
    vec!["honkai".to_owned(), "tot".to_owned()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NotecacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.expiration(), Duration::from_secs(3600));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.reminder.blacklist, vec!["honkai", "tot"]);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = NotecacheConfig::parse("{}").unwrap();
        assert_eq!(config.cache, CacheConfig::default());
        assert!(config.games.is_empty());
    }

    #[test]
    fn parses_per_game_rates() {
        let yaml = r"
cache:
  expiration_ms: 1800000
games:
  genshin:
    resource_rate_secs: 480
  starrail:
    resource_rate_secs: 360
  zenless: {}
";
        let config = NotecacheConfig::parse(yaml).unwrap();
        assert_eq!(config.cache.expiration_ms, 1_800_000);
        assert_eq!(config.cache.sweep_interval_ms, 3_600_000);
        assert_eq!(config.resource_rate("starrail"), Some(Duration::from_secs(360)));
        assert_eq!(config.resource_rate("zenless"), Some(Duration::from_secs(480)));
        assert_eq!(config.resource_rate("honkai"), None);
    }

    #[test]
    fn zero_expiration_is_rejected() {
        let result = NotecacheConfig::parse("cache:\n  expiration_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let result = NotecacheConfig::parse("games:\n  genshin:\n    resource_rate_secs: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = NotecacheConfig::parse("cache: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
