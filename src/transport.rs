//! The HTTP seam underneath the executor.
//!
//! [`Client`](crate::Client) never talks to `reqwest` directly: it hands a fully
//! resolved [`TransportRequest`] to a [`Transport`] and classifies whatever comes
//! back. Non-2xx statuses are *not* errors at this level; only connection-level
//! failures are.

use crate::{Error, Result};
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// A single HTTP exchange as seen by a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Default headers merged with request-specific ones.
    pub headers: HeaderMap,
    /// Serialized JSON body.
    pub body: Option<Vec<u8>>,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
}

/// Whatever the server answered, successful or not.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Sends one HTTP request and returns the raw response.
///
/// Implementations must return `Ok` for every response the server produced,
/// whatever its status, and [`Error::Transport`] for failures where no response
/// was received (connection refused, DNS, per-call timeout).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use deskwire::transport::{Transport, TransportRequest, TransportResponse};
/// use http::StatusCode;
///
/// struct Canned;
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn send(&self, _request: TransportRequest) -> deskwire::Result<TransportResponse> {
///         Ok(TransportResponse::new(StatusCode::OK, r#"{"tickets": []}"#))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the exchange.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// The default [`Transport`], backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl ReqwestTransport {
    /// Creates a transport without authentication.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            credentials: None,
        })
    }

    /// Authenticates every request with HTTP basic auth.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field(
                "credentials",
                &self.credentials.as_ref().map(|(user, _)| (user, "[redacted]")),
            )
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            builder = builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
