//! Outbound network collaborator.

use crate::error::NetworkError;
use crate::request::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Issues requests to the real network
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request`; an `Err` means no response was obtained at all
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request).await
    }
}

/// [`Network`] over a reqwest client
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Wrap an existing client
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with a request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        Ok(Self::new(client))
    }
}

impl Default for HttpNetwork {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

fn classify(err: &reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout(err.to_string())
    } else if err.is_builder() {
        NetworkError::InvalidRequest(err.to_string())
    } else {
        NetworkError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let res = self
            .client
            .request(request.method().clone(), request.url().clone())
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = res.status();
        let headers = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = res.bytes().await.map_err(|e| classify(&e))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
