//! Configuration management for event delivery.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Collector host used when no override is present.
pub const DEFAULT_COLLECTOR_HOST: &str = "https://widget.criteo.com";

/// Path of the event collection endpoint on the collector host.
pub const ENDPOINT_PATH: &str = "/m/event";

/// Environment variable replacing the collector host (used verbatim).
pub const HOST_OVERRIDE_ENV: &str = "CRITEO_WIDGET_BASEURL";

/// Port appended to an overridden collector host.
pub const HOST_OVERRIDE_PORT: u16 = 8050;

/// Default connect timeout for a single post.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Default read timeout for a single post.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Default capacity of the activation channel feeding the dispatcher.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Retry, expiry and capacity limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Queue length at which the job being dispatched is dropped.
    pub max_queue_size: usize,
    /// How long an event stays deliverable after it was created.
    pub validity_duration_ms: u64,
    /// Delivery cycles a job may fail transiently before it is dropped.
    pub max_attempts: u32,
    /// Redirects followed for one job within a single cycle.
    pub max_redirect_attempts: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 15,
            validity_duration_ms: 3_600_000,
            max_attempts: 3,
            max_redirect_attempts: 3,
        }
    }
}

impl PolicyConfig {
    /// Reject limits that would make every job undeliverable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_queue_size == 0 {
            return Err(CoreError::Config("max_queue_size must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Config("max_attempts must be at least 1".into()));
        }
        if self.max_redirect_attempts == 0 {
            return Err(CoreError::Config(
                "max_redirect_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Explicit collector endpoint. Falls back to [`resolve_default_endpoint`].
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Connect timeout for each post, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Read timeout for each post, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Capacity of the channel between producers and the dispatcher.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Send policy limits.
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            endpoint_url: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            policy: PolicyConfig::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file if it exists, falling back to defaults.
    /// Environment variables are applied last.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check limits and the channel capacity.
    pub fn validate(&self) -> CoreResult<()> {
        if self.channel_capacity == 0 {
            return Err(CoreError::Config("channel_capacity must be at least 1".into()));
        }
        self.policy.validate()
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("EVENTS_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(endpoint) = std::env::var("EVENTS_ENDPOINT_URL") {
            if !endpoint.trim().is_empty() {
                self.endpoint_url = Some(endpoint.trim().to_string());
            }
        }
    }

    /// Resolve the initial destination of the transport.
    ///
    /// An explicit `endpoint_url` wins; otherwise the collector host comes
    /// from [`HOST_OVERRIDE_ENV`] when set.
    pub fn endpoint_url(&self) -> CoreResult<Url> {
        let raw = match &self.endpoint_url {
            Some(url) => url.clone(),
            None => resolve_default_endpoint(std::env::var(HOST_OVERRIDE_ENV).ok().as_deref()),
        };
        Url::parse(&raw).map_err(CoreError::from)
    }
}

/// Build the default endpoint from an optional host override.
///
/// The override is used verbatim as host with [`HOST_OVERRIDE_PORT`] appended.
pub fn resolve_default_endpoint(host_override: Option<&str>) -> String {
    match host_override {
        Some(host) => format!("{}:{}{}", host, HOST_OVERRIDE_PORT, ENDPOINT_PATH),
        None => format!("{}{}", DEFAULT_COLLECTOR_HOST, ENDPOINT_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.endpoint_url.is_none());
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[test]
    fn test_default_policy_limits() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.max_queue_size, 15);
        assert_eq!(policy.validity_duration_ms, 3_600_000);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.max_redirect_attempts, 3);
    }

    #[test]
    fn test_resolve_default_endpoint() {
        assert_eq!(
            resolve_default_endpoint(None),
            "https://widget.criteo.com/m/event"
        );
        assert_eq!(
            resolve_default_endpoint(Some("http://10.0.0.5")),
            "http://10.0.0.5:8050/m/event"
        );
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let config = Config {
            endpoint_url: Some("http://localhost:9000/collect".to_string()),
            ..Default::default()
        };
        let url = config.endpoint_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/collect");
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let config = Config {
            endpoint_url: Some("not a valid url".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.endpoint_url(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_config_load_from_file_partial() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug",
            "policy": { "max_queue_size": 5 }
        }"#;
        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.policy.max_queue_size, 5);
        // unspecified fields keep their defaults
        assert_eq!(config.policy.max_attempts, 3);
        assert_eq!(config.read_timeout_secs, 60);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.endpoint_url = Some("http://collector.local/m/event".to_string());
        config.policy.validity_duration_ms = 30_000;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.endpoint_url, config.endpoint_url);
        assert_eq!(loaded.policy.validity_duration_ms, 30_000);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[test]
    fn test_load_rejects_zero_limits() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "policy": { "max_attempts": 0 } }"#).unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_channel_capacity() {
        let config = Config {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            Config::load_from_file(&config_path),
            Err(CoreError::Json(_))
        ));
    }
}
