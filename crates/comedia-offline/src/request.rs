//! Requests, responses and request identity.

use bytes::Bytes;
use std::fmt;
use url::Url;

pub use reqwest::{Method, StatusCode};

/// How the request was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// Full-page navigation
    Navigate,
    /// Subresource or API call
    Other,
}

/// Outbound request seen by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    mode: RequestMode,
}

impl Request {
    /// Arbitrary request
    #[must_use]
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { method, url, mode }
    }

    /// Subresource GET
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Other)
    }

    /// Navigation GET
    #[must_use]
    pub fn navigate(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    /// HTTP method
    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Initiation mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Whether the gateway intercepts this request at all
    #[inline]
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether this is a full-page navigation
    #[inline]
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache identity of this request
    #[must_use]
    pub fn key(&self) -> RequestKey {
        RequestKey::from(&self.url)
    }
}

/// Cache identity: the absolute URL without fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    /// Key as a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for RequestKey {
    fn from(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response body and metadata; cloning shares the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Header pairs in arrival order
    pub headers: Vec<(String, String)>,
    /// Body bytes
    pub body: Bytes,
}

impl Response {
    /// Response with no headers
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with the given body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, case-insensitive
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the response may be mirrored into the cache
    #[inline]
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_fragment() {
        let a = Url::parse("http://localhost/widget#top").unwrap();
        let b = Url::parse("http://localhost/widget").unwrap();
        assert_eq!(RequestKey::from(&a), RequestKey::from(&b));
    }

    #[test]
    fn key_keeps_query() {
        let a = Url::parse("http://localhost/api?limit=1").unwrap();
        let b = Url::parse("http://localhost/api?limit=2").unwrap();
        assert_ne!(RequestKey::from(&a), RequestKey::from(&b));
    }

    #[test]
    fn only_200_is_cacheable() {
        assert!(Response::ok("x").is_cacheable());
        assert!(!Response::new(StatusCode::NO_CONTENT, "").is_cacheable());
        assert!(!Response::new(StatusCode::NOT_FOUND, "").is_cacheable());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let res = Response::ok("x").with_header("Content-Type", "text/css");
        assert_eq!(res.header("content-type"), Some("text/css"));
    }
}
