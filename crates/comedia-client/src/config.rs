//! Host configuration: TOML file, then environment overrides.
//!
//! ```toml
//! api_url = "http://localhost:5000/"
//! request_timeout_secs = 30
//!
//! [gateway]
//! cache_name = "metodo-comedia-v2"
//! ```

use crate::error::ConfigError;
use comedia_offline::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Overrides `api_url` and the gateway origin
pub const ENV_API_URL: &str = "COMEDIA_API_URL";
/// Overrides `gateway.cache_name`
pub const ENV_CACHE_NAME: &str = "COMEDIA_CACHE_NAME";
/// Overrides `request_timeout_secs`
pub const ENV_TIMEOUT_SECS: &str = "COMEDIA_TIMEOUT_SECS";

/// Settings shared by every host binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analysis API
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Offline gateway settings
    pub gateway: GatewayConfig,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With gateway settings
    #[must_use]
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parsed API base URL
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.api_url)?)
    }

    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load the effective configuration
    ///
    /// Reads `.env` if present, then `path` (defaults when `None`), then
    /// applies `COMEDIA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_ok() {
            tracing::debug!("loaded .env");
        }
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.gateway.origin.clone_from(&url);
            self.api_url = url;
        }
        if let Some(name) = lookup(ENV_CACHE_NAME) {
            self.gateway.cache_name = name;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
        }
        Ok(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/".to_string(),
            request_timeout_secs: 30,
            gateway: GatewayConfig::default(),
        }
    }
}
