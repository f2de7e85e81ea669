//! Método Comedia client collaborators
//!
//! Glue between the pure crates and the outside world:
//!
//! - [`HttpBackend`]: the wizard's [`AnalysisBackend`](comedia_wizard::AnalysisBackend)
//!   over the REST API
//! - [`ClientConfig`]: TOML file plus `COMEDIA_*` environment overrides
//! - [`telemetry::init`]: tracing subscriber for binaries
//!
//! # Example
//!
//! ```rust,ignore
//! use comedia_client::{ClientConfig, HttpBackend};
//! use comedia_wizard::WizardController;
//!
//! let config = ClientConfig::load(None)?;
//! let wizard = WizardController::new(HttpBackend::from_config(&config)?);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod config;
pub mod error;
pub mod telemetry;

pub use backend::{acknowledge, decode, HttpBackend};
pub use config::{ClientConfig, ENV_API_URL, ENV_CACHE_NAME, ENV_TIMEOUT_SECS};
pub use error::{ClientError, ClientResult, ConfigError};
pub use telemetry::LogFormat;

use comedia_offline::HttpNetwork;

/// Gateway network collaborator honouring the configured timeout
pub fn network(config: &ClientConfig) -> ClientResult<HttpNetwork> {
    let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
    Ok(HttpNetwork::new(client))
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
