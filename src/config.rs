//! Configuration.
//!
//! One [`ArkaliaConfig`] groups the agent, notification and source settings.
//! Durations are written as millisecond integers (`poll_interval_ms = 30000`)
//! and every field has a default, so an empty file is a valid configuration.
//!
//! Environment overrides (applied by [`ArkaliaConfig::apply_env`]):
//! - `ARKALIA_BASE_URL`: backend base URL
//! - `ARKALIA_ENDPOINT`: `progression_data` | `sync_progression` | `progression_data_legacy`
//! - `ARKALIA_POLL_INTERVAL_MS`: poll interval
//! - `ARKALIA_FETCH_TIMEOUT_MS`: fetch timeout
//! - `ARKALIA_RELOAD_ON_FAILURE`: `true` | `false`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;
use crate::core::constants::*;
use crate::progression::CollectionOrder;
use crate::source::Endpoint;

/// Millisecond (de)serialization for `Duration` fields.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// What the agent does once `max_retries` retries in a row have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Only show the terminal notification.
    Disabled,
    /// Reload after `delay`: drop the mirror and start again from a first
    /// load, or run the installed recovery hook.
    Reload {
        /// Delay before reloading.
        #[serde(rename = "delay_ms", with = "millis")]
        delay: Duration,
    },
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        RecoveryPolicy::Reload {
            delay: DEFAULT_RELOAD_DELAY,
        }
    }
}

/// Sync agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Interval between periodic polls; also the unit of the linear backoff.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    /// Upper bound on one fetch.
    #[serde(rename = "fetch_timeout_ms", with = "millis")]
    pub fetch_timeout: Duration,

    /// Retries after a failed poll before the terminal notification.
    pub max_retries: u32,

    /// Badge comparison mode for change detection.
    pub collection_order: CollectionOrder,

    /// Last-resort recovery after a terminal failure.
    pub recovery: RecoveryPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            collection_order: CollectionOrder::default(),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl AgentConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("fetch_timeout_ms must be > 0".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the fetch timeout.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the retry budget.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the badge comparison mode.
    pub fn collection_order(mut self, order: CollectionOrder) -> Self {
        self.config.collection_order = order;
        self
    }

    /// Set the recovery policy.
    pub fn recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.config.recovery = recovery;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AgentConfig {
        self.config
    }
}

/// Notification deduplication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum spacing between two displayed notifications.
    #[serde(rename = "cooldown_ms", with = "millis")]
    pub cooldown: Duration,

    /// Window in which identical normalized text is suppressed.
    #[serde(rename = "duplicate_window_ms", with = "millis")]
    pub duplicate_window: Duration,

    /// Age after which records are swept.
    #[serde(rename = "retention_ms", with = "millis")]
    pub retention: Duration,

    /// Maximum retained records.
    pub max_history_size: usize,

    /// Interval of the background sweep.
    #[serde(rename = "sweep_interval_ms", with = "millis")]
    pub sweep_interval: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_NOTIFICATION_COOLDOWN,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            retention: DEFAULT_HISTORY_RETENTION,
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl DedupConfig {
    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_size == 0 {
            return Err(ConfigError::Invalid("max_history_size must be > 0".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid("sweep_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// Progression source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Backend base URL, without trailing slash.
    pub base_url: String,

    /// Which endpoint shape to poll.
    pub endpoint: Endpoint,

    /// TCP connect timeout.
    #[serde(rename = "connect_timeout_ms", with = "millis")]
    pub connect_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: Endpoint::default(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl SourceConfig {
    /// Full URL of the configured endpoint.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint.path())
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArkaliaConfig {
    /// Sync agent.
    pub agent: AgentConfig,
    /// Notification deduplication.
    pub notifications: DedupConfig,
    /// Progression source.
    pub source: SourceConfig,
}

impl ArkaliaConfig {
    /// Parse a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    #[cfg(feature = "config-file")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply `ARKALIA_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ARKALIA_BASE_URL") {
            self.source.base_url = url;
        }
        if let Some(endpoint) = lookup("ARKALIA_ENDPOINT") {
            self.source.endpoint = endpoint.parse()?;
        }
        if let Some(ms) = lookup("ARKALIA_POLL_INTERVAL_MS") {
            self.agent.poll_interval = parse_millis("ARKALIA_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = lookup("ARKALIA_FETCH_TIMEOUT_MS") {
            self.agent.fetch_timeout = parse_millis("ARKALIA_FETCH_TIMEOUT_MS", &ms)?;
        }
        if let Some(flag) = lookup("ARKALIA_RELOAD_ON_FAILURE") {
            self.agent.recovery = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => RecoveryPolicy::default(),
                "0" | "false" | "no" => RecoveryPolicy::Disabled,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "ARKALIA_RELOAD_ON_FAILURE: expected a boolean, got {other:?}"
                    )));
                }
            };
        }
        self.validate()
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.validate()?;
        self.notifications.validate()?;
        self.source.validate()
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::Invalid(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArkaliaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_retries, 3);
        assert_eq!(config.notifications.cooldown, Duration::from_millis(2000));
        assert_eq!(config.notifications.max_history_size, 50);
    }

    #[test]
    fn test_builder() {
        let config = AgentConfig::builder()
            .poll_interval(Duration::from_secs(5))
            .max_retries(5)
            .recovery(RecoveryPolicy::Disabled)
            .build();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.recovery, RecoveryPolicy::Disabled);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = AgentConfig::builder().poll_interval(Duration::ZERO).build();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml() {
        let text = r#"
            [agent]
            poll_interval_ms = 15000
            collection_order = "ordered"
            recovery = { action = "reload", delay_ms = 5000 }

            [notifications]
            cooldown_ms = 30000
            duplicate_window_ms = 5000

            [source]
            base_url = "https://arkalia.example"
            endpoint = "sync_progression"
        "#;
        let config = ArkaliaConfig::from_toml_str(text).unwrap();
        assert_eq!(config.agent.poll_interval, Duration::from_secs(15));
        assert_eq!(config.agent.collection_order, CollectionOrder::Ordered);
        assert_eq!(
            config.agent.recovery,
            RecoveryPolicy::Reload {
                delay: Duration::from_secs(5)
            }
        );
        assert_eq!(config.notifications.cooldown, Duration::from_secs(30));
        assert_eq!(config.notifications.max_history_size, 50);
        assert_eq!(config.source.url(), "https://arkalia.example/api/sync-progression");
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_empty_toml_is_default() {
        let config = ArkaliaConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArkaliaConfig::default());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_toml_parse_error() {
        let result = ArkaliaConfig::from_toml_str("[agent\npoll_interval_ms = 1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("ARKALIA_BASE_URL", "http://localhost:8080/"),
            ("ARKALIA_ENDPOINT", "progression_data_legacy"),
            ("ARKALIA_POLL_INTERVAL_MS", "1000"),
            ("ARKALIA_RELOAD_ON_FAILURE", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = ArkaliaConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.agent.poll_interval, Duration::from_secs(1));
        assert_eq!(config.agent.recovery, RecoveryPolicy::Disabled);
        assert_eq!(config.source.url(), "http://localhost:8080/api/progression-data");
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = ArkaliaConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "ARKALIA_POLL_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
