//! Client configuration: defaults, an optional TOML file, then environment overrides.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gate::SessionRule;

/// Overrides [`ClientConfig::api_url`].
pub const API_URL_ENV: &str = "CALOMETER_API_URL";
/// Overrides [`ClientConfig::session_rule`].
pub const SESSION_RULE_ENV: &str = "CALOMETER_SESSION_RULE";
/// Overrides [`ClientConfig::request_timeout_secs`].
pub const REQUEST_TIMEOUT_ENV: &str = "CALOMETER_REQUEST_TIMEOUT_SECS";
/// Backend origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Settings shared by the transport and the screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://api.calometer.app`. Endpoint paths are appended verbatim.
    pub api_url: String,
    /// Which probe codes mean the session has expired.
    pub session_rule: SessionRule,
    /// Per-request timeout; unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_rule: SessionRule::default(),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Defaults with a different backend origin.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CALOMETER_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, which stands in for the environment.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(rule) = lookup(SESSION_RULE_ENV) {
            self.session_rule = rule.parse()?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Validated backend origin without a trailing slash.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.api_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }
        Ok(trimmed.to_string())
    }

    /// [`Self::request_timeout_secs`] as a [`Duration`].
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
