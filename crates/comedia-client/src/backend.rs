//! `AnalysisBackend` over the REST API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": false, "error": "Análisis no encontrado" }
//! ```

use crate::config::ClientConfig;
use crate::error::ClientResult;
use async_trait::async_trait;
use comedia_wizard::{
    AnalysisBackend, AnalysisId, AnalysisRecord, BackendError, Category, CategoryKind, ListFilter,
    SimilarQuery, StoredAnalysis,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const ANALYSES_PATH: &str = "api/analisis-chistes/";
const SIMILAR_PATH: &str = "api/analisis-chistes/similar";
const CATEGORIES_PATH: &str = "api/categorias/";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewCategory<'a> {
    tipo: CategoryKind,
    valor: &'a str,
}

/// Decode an API response body
///
/// `404` maps to [`BackendError::NotFound`] carrying `what`; any other
/// non-2xx status or `success: false` is a rejection.
pub fn decode<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    what: &str,
) -> Result<T, BackendError> {
    envelope(status, body, what)?
        .data
        .ok_or_else(|| BackendError::Decode("response has no data".to_string()))
}

/// Check a response that carries no data, such as a delete
pub fn acknowledge(status: StatusCode, body: &[u8], what: &str) -> Result<(), BackendError> {
    envelope::<serde::de::IgnoredAny>(status, body, what).map(|_| ())
}

fn envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    what: &str,
) -> Result<Envelope<T>, BackendError> {
    if status == StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(what.to_string()));
    }

    let parsed: Envelope<T> = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => {
            return Err(BackendError::rejected(
                status.as_u16(),
                String::from_utf8_lossy(body).trim(),
            ))
        }
        Err(err) => return Err(BackendError::Decode(err.to_string())),
    };

    if !status.is_success() || !parsed.success {
        let message = parsed
            .error
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(BackendError::rejected(status.as_u16(), message));
    }
    Ok(parsed)
}

/// HTTP implementation of [`AnalysisBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Backend rooted at `base` with a per-request timeout
    pub fn new(base: Url, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Backend for the configured API
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.api_base()?, config.timeout())
    }

    /// API base URL
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Transport(format!("bad endpoint {path}: {e}")))
    }

    /// Listing URL with the set filters as query parameters
    fn list_url(&self, filter: &ListFilter) -> Result<Url, BackendError> {
        let mut url = self.endpoint(ANALYSES_PATH)?;
        let limit = filter.limit.map(|l| l.to_string());
        let params = [
            ("comediante", filter.comediante.as_deref()),
            ("concepto_categoria", filter.concepto_categoria.as_deref()),
            ("perspectiva_categoria", filter.perspectiva_categoria.as_deref()),
            ("limit", limit.as_deref()),
        ];
        if params.iter().any(|(_, value)| value.is_some()) {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                if let Some(value) = value {
                    query.append_pair(name, value);
                }
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, BackendError> {
        let (status, body) = self.exchange(request, what).await?;
        decode(status, &body, what)
    }

    async fn exchange(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<(StatusCode, bytes::Bytes), BackendError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, what, "api request failed");
            BackendError::Transport(e.to_string())
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        tracing::debug!(%status, bytes = body.len(), what, "api response");
        Ok((status, body))
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn create(&self, record: &AnalysisRecord) -> Result<StoredAnalysis, BackendError> {
        let url = self.endpoint(ANALYSES_PATH)?;
        self.send(self.client.post(url).json(record), "new analysis")
            .await
    }

    async fn update(
        &self,
        id: &AnalysisId,
        record: &AnalysisRecord,
    ) -> Result<StoredAnalysis, BackendError> {
        let url = self.endpoint(&format!("{ANALYSES_PATH}{id}"))?;
        self.send(self.client.put(url).json(record), id.as_str())
            .await
    }

    async fn fetch(&self, id: &AnalysisId) -> Result<AnalysisRecord, BackendError> {
        let url = self.endpoint(&format!("{ANALYSES_PATH}{id}"))?;
        let stored: StoredAnalysis = self.send(self.client.get(url), id.as_str()).await?;
        Ok(stored.record)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredAnalysis>, BackendError> {
        let url = self.list_url(filter)?;
        self.send(self.client.get(url), "analysis listing").await
    }

    async fn delete(&self, id: &AnalysisId) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("{ANALYSES_PATH}{id}"))?;
        let (status, body) = self.exchange(self.client.delete(url), id.as_str()).await?;
        acknowledge(status, &body, id.as_str())
    }

    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<StoredAnalysis>, BackendError> {
        let url = self.endpoint(SIMILAR_PATH)?;
        self.send(self.client.post(url).json(query), "similar analyses")
            .await
    }

    async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>, BackendError> {
        let url = self.endpoint(&format!("{CATEGORIES_PATH}{}", kind.as_str()))?;
        self.send(self.client.get(url), kind.as_str()).await
    }

    async fn add_category(
        &self,
        kind: CategoryKind,
        valor: &str,
    ) -> Result<Category, BackendError> {
        let url = self.endpoint(CATEGORIES_PATH)?;
        let body = NewCategory { tipo: kind, valor };
        self.send(self.client.post(url).json(&body), kind.as_str())
            .await
    }
}
