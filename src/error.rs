//! Error types for ticketing API calls.
//!
//! Every request flows through the executor in [`crate::Client`], which folds
//! transient failures (rate limiting, 5xx, connection problems) into its retry
//! loop. Callers only ever see eventual success or one of the terminal variants
//! below.
//!
//! Credentials are never part of an error message: the transport carries them in
//! headers, and nothing here formats headers.

use http::StatusCode;
use std::time::Duration;

/// Maximum length of a response body kept inside an error.
const MAX_ERROR_BODY_LEN: usize = 500;

/// The main error type for ticketing API calls.
///
/// `Error` is `Clone` so that concurrent callers waiting on the same in-flight
/// cache fetch can all observe the same failure.
///
/// # Examples
///
/// ```no_run
/// use deskwire::{Client, Error};
///
/// # async fn example(client: Client) -> Result<(), Error> {
/// match client.tickets().get(42).await {
///     Ok(ticket) => println!("{}", ticket.subject.unwrap_or_default()),
///     Err(Error::NotFound { path }) => eprintln!("no such ticket: {}", path),
///     Err(Error::Auth { .. }) => eprintln!("check ZENDESK_EMAIL / ZENDESK_TOKEN"),
///     Err(e) => eprintln!("request failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// The server rejected the credentials (HTTP 401 or 403).
    ///
    /// Never retried: credentials will not heal by waiting.
    #[error("Authentication failed (status {status}) - check the configured credentials")]
    Auth {
        /// Either 401 or 403.
        status: StatusCode,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {path}")]
    NotFound {
        /// The request path, or a resource reference such as `users/12`.
        path: String,
    },

    /// The request or the response payload was invalid.
    ///
    /// Produced for HTTP 400/422 (with the server-provided detail) and for
    /// response bodies that fail to decode into the expected record.
    #[error("Validation failed: {detail}")]
    Validation {
        /// The HTTP status, when the failure came from the server.
        status: Option<StatusCode>,
        /// Server detail or decode failure description.
        detail: String,
    },

    /// The server answered HTTP 429.
    ///
    /// Only surfaces wrapped in [`Error::RetriesExhausted`].
    #[error("Rate limited by server (retry after {retry_after:?})")]
    RateLimited {
        /// The last server-declared wait, if any.
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx response.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: StatusCode,
        /// The (truncated) response body.
        body: String,
    },

    /// The overall deadline for a logical request expired.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A connection-level failure (DNS, refused connection, per-call timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// All retry attempts were used while the failure was still transient.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total number of attempts made.
        attempts: usize,
        /// The reason the final attempt failed.
        last_error: Box<Error>,
    },

    /// Invalid client or request configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Creates a not-found error for a path or resource reference.
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Creates a validation error that did not come from an HTTP status.
    pub fn validation(detail: impl Into<String>) -> Self {
        Error::Validation {
            status: None,
            detail: detail.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Creates a generic HTTP error, truncating long bodies.
    pub fn http(status: StatusCode, body: &str) -> Self {
        Error::Http {
            status,
            body: truncate_body(body),
        }
    }

    /// Returns `true` if this failure is transient.
    ///
    /// Rate limiting, 5xx responses and transport failures are transient.
    /// Everything else is terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::Error;
    /// use http::StatusCode;
    ///
    /// assert!(Error::http(StatusCode::BAD_GATEWAY, "upstream").is_retryable());
    /// assert!(!Error::not_found("tickets/1.json").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::Transport(_) => true,
            Error::Http { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Returns `true` if this is a rate limit error, directly or as the last
    /// reason of an exhausted retry loop.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self.root_cause(), Error::RateLimited { .. })
    }

    /// Returns `true` for 400/422 responses and decode failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Auth { status } => Some(*status),
            Error::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::Validation { status, .. } => *status,
            Error::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::Http { status, .. } => Some(*status),
            Error::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the last server-declared wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.root_cause() {
            Error::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Unwraps [`Error::RetriesExhausted`] down to the underlying reason.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RetriesExhausted { last_error, .. } => last_error.root_cause(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Error::Configuration(format!("Invalid request: {}", error))
        } else {
            Error::Transport(error.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// A specialized `Result` type for ticketing API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::RateLimited { retry_after: None }.is_retryable());
        assert!(Error::Transport("connection refused".into()).is_retryable());
        assert!(Error::http(StatusCode::SERVICE_UNAVAILABLE, "").is_retryable());
        assert!(!Error::http(StatusCode::CONFLICT, "").is_retryable());
        assert!(!Error::Auth {
            status: StatusCode::UNAUTHORIZED
        }
        .is_retryable());
        assert!(!Error::validation("bad").is_retryable());
        assert!(!Error::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_root_cause_unwraps_exhausted_retries() {
        let err = Error::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(Error::RateLimited {
                retry_after: Some(Duration::from_secs(7)),
            }),
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_error_truncates_long_bodies() {
        let body = "x".repeat(2_000);
        match Error::http(StatusCode::CONFLICT, &body) {
            Error::Http { body, .. } => {
                assert!(body.len() <= MAX_ERROR_BODY_LEN + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("Expected Http, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("tickets/12.json");
        assert_eq!(err.to_string(), "Not found: tickets/12.json");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
