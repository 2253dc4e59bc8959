//! Retry strategies and classification of request attempts.
//!
//! Every attempt the executor makes ends in exactly one [`Outcome`]. [`classify`]
//! decides which one from the raw transport result; [`RetryStrategy`] decides
//! how long to back off and when to give up.

use crate::rate_limit::{parse_retry_after, RateLimitConfig};
use crate::transport::TransportResponse;
use crate::{Error, Result};
use http::StatusCode;
use rand::Rng;
use std::time::Duration;

/// Defines when and how to retry failed requests.
///
/// # Examples
///
/// ```
/// use deskwire::RetryStrategy;
/// use std::time::Duration;
///
/// // No retries
/// let no_retry = RetryStrategy::None;
///
/// // Exponential backoff: 1s, 2s, 4s ... with +/-25% jitter, capped at 30s
/// let exponential = RetryStrategy::exponential(3);
///
/// // Linear backoff: 1s, 1s, 1s...
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    #[default]
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// Each retry waits for `initial_delay * 2^(attempt - 1)`. Optional jitter
    /// scales that by a random factor in `[0.75, 1.25]`. The result never
    /// exceeds `max_delay`.
    ExponentialBackoff {
        /// The initial delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
        /// Whether to add random jitter to delays.
        jitter: bool,
    },

    /// Retry with a fixed delay between attempts.
    Linear {
        /// The delay between retry attempts.
        delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
    },

    /// Custom retry logic.
    ///
    /// Provide a function that takes the attempt number (starting from 1)
    /// and returns `Some(delay)` to retry after the delay, or `None` to stop.
    Custom {
        /// Takes the retry number (1-indexed) and returns the delay before
        /// it, or `None` to stop retrying.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Exponential backoff starting at one second, capped at 30 seconds, with
    /// jitter.
    pub fn exponential(max_retries: usize) -> Self {
        RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries,
            jitter: true,
        }
    }

    /// Returns the delay before the given retry attempt, or `None` if retries are exhausted.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry attempt number (1-indexed, so 1 = first retry)
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1) as u32);
                let base_delay = initial_delay.saturating_mul(multiplier);

                let delay = if *jitter {
                    base_delay.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
                } else {
                    base_delay
                };
                Some(delay.min(*max_delay))
            }
            RetryStrategy::Linear { delay, max_retries } => {
                if attempt > *max_retries {
                    None
                } else {
                    Some(*delay)
                }
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Returns the maximum number of retries, if applicable.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::ExponentialBackoff { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Linear { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// The verdict on a single attempt.
#[derive(Debug)]
pub enum Outcome {
    /// A 2xx response.
    Success(TransportResponse),

    /// A transient failure.
    Retryable {
        /// Why the attempt failed; surfaces as `last_error` when retries run out.
        error: Error,
        /// Server-declared wait, overriding the local backoff.
        delay: Option<Duration>,
    },

    /// A terminal failure, returned to the caller as is.
    Fatal(Error),
}

/// Classifies the result of one attempt.
///
/// | Result | Outcome |
/// |---|---|
/// | 2xx | `Success` |
/// | 429 | `Retryable(RateLimited)`, delay from `Retry-After` |
/// | 5xx, transport failure | `Retryable` |
/// | 401, 403 | `Fatal(Auth)` |
/// | 404 | `Fatal(NotFound)` |
/// | 400, 422 | `Fatal(Validation)` with the server detail |
/// | other | `Fatal(Http)` |
///
/// The method plays no part: a POST that failed with a 503 is retried like a
/// GET.
pub fn classify(result: Result<TransportResponse>, path: &str, config: &RateLimitConfig) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(error @ Error::Transport(_)) => {
            return Outcome::Retryable { error, delay: None }
        }
        Err(error) => return Outcome::Fatal(error),
    };

    let status = response.status;
    if status.is_success() {
        return Outcome::Success(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = parse_retry_after(&response.headers);
            let delay = if config.enabled && config.respect_retry_after {
                retry_after.map(|wait| wait.min(config.max_wait))
            } else {
                None
            };
            Outcome::Retryable {
                error: Error::RateLimited { retry_after },
                delay,
            }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Outcome::Fatal(Error::Auth { status }),
        StatusCode::NOT_FOUND => Outcome::Fatal(Error::not_found(path)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            Outcome::Fatal(Error::Validation {
                status: Some(status),
                detail: validation_detail(&response.body),
            })
        }
        status if status.is_server_error() => Outcome::Retryable {
            error: Error::http(status, &response.body),
            delay: None,
        },
        status => Outcome::Fatal(Error::http(status, &response.body)),
    }
}

/// Extracts a readable message from an error body such as
/// `{"error": "RecordInvalid", "description": "...", "details": {...}}`.
fn validation_detail(body: &str) -> String {
    let Ok(serde_json::Value::Object(object)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return fallback_detail(body);
    };

    let mut parts: Vec<String> = Vec::new();
    match object.get("error") {
        Some(serde_json::Value::String(error)) => parts.push(error.clone()),
        Some(serde_json::Value::Object(error)) => {
            for key in ["title", "message"] {
                if let Some(text) = error.get(key).and_then(|v| v.as_str()) {
                    parts.push(text.to_string());
                }
            }
        }
        _ => {}
    }
    if let Some(description) = object.get("description").and_then(|v| v.as_str()) {
        parts.push(description.to_string());
    }
    if let Some(details) = object.get("details").filter(|v| !v.is_null()) {
        parts.push(details.to_string());
    }

    if parts.is_empty() {
        fallback_detail(body)
    } else {
        parts.join(": ")
    }
}

fn fallback_detail(body: &str) -> String {
    match Error::http(StatusCode::BAD_REQUEST, body) {
        Error::Http { body, .. } if !body.is_empty() => body,
        _ => "no detail provided".to_string(),
    }
}
