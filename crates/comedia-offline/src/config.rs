//! Gateway configuration.

use serde::{Deserialize, Serialize};
use url::Url;

/// Cache version used when none is configured
pub const DEFAULT_CACHE_NAME: &str = "metodo-comedia-v1";

/// Settings of one gateway instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Origin that relative manifest paths resolve against
    pub origin: String,
    /// Name of the live cache; every other name is purged on activation
    pub cache_name: String,
    /// Assets fetched and stored during install
    pub precache: Vec<String>,
    /// Document served to navigations that miss both network and cache
    pub root_document: String,
    /// Activate right after install; when `false` the installed worker waits
    /// for a `SKIP_WAITING` message
    pub skip_waiting: bool,
}

impl GatewayConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With origin
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// With cache version name
    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// With precache manifest
    #[must_use]
    pub fn with_precache<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = paths.into_iter().map(Into::into).collect();
        self
    }

    /// With skip-waiting on install
    #[must_use]
    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    /// Resolve a manifest path against the origin
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.origin)?.join(path)
    }

    /// URL of the fallback document
    pub fn root_url(&self) -> Result<Url, url::ParseError> {
        self.resolve(&self.root_document)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5000/".to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            precache: vec![
                "/".to_string(),
                "/static/css/style.css".to_string(),
                "/static/js/app.js".to_string(),
                "/static/manifest.json".to_string(),
            ],
            root_document: "/".to_string(),
            skip_waiting: true,
        }
    }
}
