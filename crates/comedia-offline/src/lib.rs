//! Método Comedia offline gateway
//!
//! Intercepts outbound requests and keeps the app usable without a network:
//!
//! - **GET**: network first; a `200` response is mirrored into the live cache
//!   in the background, and served from there when the network fails.
//! - **Navigations** that miss both network and cache get the cached root
//!   document.
//! - Everything else passes straight through.
//!
//! # Lifecycle
//!
//! ```text
//! Parsed ─install─▶ Installing ─▶ Installed ─activate─▶ Activating ─▶ Activated
//!                   (precache)    (skip-waiting, or     (purge old caches, claim clients)
//!                                  wait for SKIP_WAITING)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use comedia_offline::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let gateway = OfflineGateway::new(
//!     config.clone(),
//!     HttpNetwork::default(),
//!     Arc::new(MemoryCacheStorage::new()),
//! );
//! gateway.install().await?;
//! gateway.activate().await?;
//!
//! let outcome = gateway.handle_fetch(&Request::get(config.resolve("/api/categorias/all")?)).await;
//! println!("served from {}", outcome.source());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod network;
pub mod request;
pub mod store;

pub use config::{GatewayConfig, DEFAULT_CACHE_NAME};
pub use error::{CacheError, GatewayError, GatewayResult, LifecycleError, NetworkError};
pub use gateway::{FetchOutcome, Fetched, InstallReport, OfflineGateway, SettleReport, WriteBack};
pub use lifecycle::{ClientMessage, Lifecycle, WorkerPhase};
pub use network::{HttpNetwork, Network};
pub use request::{Method, Request, RequestKey, RequestMode, Response, StatusCode};
pub use store::{CacheStorage, CacheStore, MemoryCacheStorage, MemoryCacheStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting the gateway
    pub use crate::config::GatewayConfig;
    pub use crate::gateway::{FetchOutcome, OfflineGateway};
    pub use crate::lifecycle::ClientMessage;
    pub use crate::network::{HttpNetwork, Network};
    pub use crate::request::{Request, Response};
    pub use crate::store::{CacheStorage, MemoryCacheStorage};
}
