//! Error types for configuration loading and client setup.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be interpreted
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// Configured base URL is malformed
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Tracing subscriber was already installed
    #[error("telemetry already initialised: {0}")]
    Telemetry(String),
}

impl ClientError {
    /// Whether the error comes from user-supplied settings
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_names_the_variable() {
        let err = ConfigError::InvalidValue {
            key: "COMEDIA_TIMEOUT_SECS",
            value: "soon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for COMEDIA_TIMEOUT_SECS: \"soon\""
        );
        assert!(ClientError::from(err).is_user_facing());
    }
}
