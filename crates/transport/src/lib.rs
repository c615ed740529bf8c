//! Transport abstraction for outbound API calls
//!
//! Defines the `Transport` trait that decouples the refresh gate from the
//! HTTP client actually sending requests. The gate never inspects a request
//! beyond its URL path; it only needs two capabilities from this layer:
//! sending a `RequestDescriptor` and replaying one with an amended
//! authorization value.
//!
//! `HttpTransport` is the reqwest-backed implementation; tests substitute
//! scripted implementations of the same trait.

pub mod http;

pub use http::HttpTransport;

use std::future::Future;
use std::pin::Pin;

/// Authorization header name used when amending a request with a credential.
const AUTHORIZATION: &str = "authorization";

/// Errors from the transport layer (network, timeout, malformed request).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream timeout: {0}")]
    Timeout(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque descriptor of an outbound request.
///
/// The refresh gate treats this as a value to hold and replay; it never
/// inspects method, headers, or body. `retried` marks a request that has
/// already been replayed once, which prevents infinite retry loops.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor with no headers or body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// Append a header (builder style).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body (builder style).
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the bearer authorization value, replacing any existing
    /// authorization header. This is the "replay with an amended credential"
    /// operation the refresh gate relies on.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
        self.headers
            .push((AUTHORIZATION.to_owned(), format!("Bearer {token}")));
    }

    /// Mark the request as having been replayed once.
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Current authorization header value, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
            .map(|(_, value)| value.as_str())
    }

    /// Path portion of the URL (no scheme/host, query, or fragment).
    ///
    /// Used by the interceptor to recognize auth-domain endpoints. A URL
    /// without a path yields "/".
    pub fn path(&self) -> &str {
        let after_scheme = match self.url.find("://") {
            Some(idx) => &self.url[idx + 3..],
            None => self.url.as_str(),
        };
        let path = match after_scheme.find('/') {
            Some(idx) => &after_scheme[idx..],
            None => "/",
        };
        let end = path
            .find(['?', '#'])
            .unwrap_or(path.len());
        &path[..end]
    }
}

/// Response returned by a transport.
///
/// Only the status and body matter to the refresh gate; header passthrough is
/// the host application's concern.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// Whether the status is in the 2xx class.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response is a 401 that should engage the refresh gate.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Abstraction over the HTTP client sending requests upstream.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Send the request and return the upstream outcome. Retry and timeout
    /// semantics of the underlying call are this layer's concern; the refresh
    /// gate only looks at success or failure.
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
