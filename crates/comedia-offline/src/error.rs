//! Error types for the offline gateway
//!
//! - Network failures (trigger the cache fallback)
//! - Cache storage failures (never fatal, never reach the fetch caller)
//! - Lifecycle misuse (install/activate out of order, activating while waiting)

use crate::lifecycle::WorkerPhase;

/// Outbound request did not produce a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Connection refused, reset, DNS failure, offline
    #[error("network unavailable: {0}")]
    Unavailable(String),

    /// Host network stack gave up waiting
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Cache storage operation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Storage refused a write for lack of space
    #[error("cache quota exceeded while writing {0}")]
    QuotaExceeded(String),

    /// Storage backend is not usable
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),

    /// Precache manifest entry could not be fetched
    #[error("precache of {url} failed: {reason}")]
    Precache {
        /// Manifest entry
        url: String,
        /// Why it failed
        reason: String,
    },
}

/// Lifecycle event delivered in the wrong phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition not allowed from the current phase
    #[error("illegal worker transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: WorkerPhase,
        /// Requested phase
        to: WorkerPhase,
    },

    /// Installed without skip-waiting; activation needs a `SKIP_WAITING` message
    #[error("worker is waiting for skip-waiting before it can activate")]
    Waiting,
}

/// Combined gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network error
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Cache error
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Lifecycle error
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Configured URL is malformed
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_error_display() {
        let err = LifecycleError::IllegalTransition {
            from: WorkerPhase::Parsed,
            to: WorkerPhase::Activated,
        };
        assert_eq!(err.to_string(), "illegal worker transition: Parsed -> Activated");
    }

    #[test]
    fn error_conversions() {
        let err: GatewayError = CacheError::QuotaExceeded("/a".into()).into();
        assert!(matches!(err, GatewayError::Cache(_)));
    }
}
