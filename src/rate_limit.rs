//! Client-side rate limiting with server header feedback.
//!
//! Two halves live here:
//! - [`RateLimitInfo`] parses the rate limit headers of every response.
//! - [`RateLimiter`] is a token bucket that every request attempt passes through
//!   before it is sent. The bucket refills continuously at
//!   `requests_per_minute / 60` tokens per second, and server signals override
//!   local state: a `Retry-After` empties the bucket and blocks refills until the
//!   declared time, and `X-RateLimit-Remaining` clamps the local count down.

use http::HeaderMap;
use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Information extracted from rate limit headers.
///
/// This struct contains parsed rate limit data from various standard and
/// common rate limit headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// When the rate limit resets (from X-RateLimit-Reset or RateLimit-Reset headers).
    pub reset_at: Option<SystemTime>,

    /// How long to wait before retrying (from Retry-After header).
    pub retry_after: Option<Duration>,

    /// Number of requests remaining in the current window.
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Parses common rate limit headers including:
    /// - `Retry-After` (standard HTTP, seconds or HTTP date)
    /// - `X-RateLimit-Reset` (Unix timestamp)
    /// - `RateLimit-Reset` (draft standard, seconds from now)
    /// - `X-RateLimit-Remaining`
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "60".parse().unwrap());
    /// headers.insert("x-ratelimit-remaining", "0".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers);
    /// assert!(info.retry_after.is_some());
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let retry_after = parse_retry_after(headers);
        let reset_at = parse_rate_limit_reset(headers);
        let remaining = parse_rate_limit_remaining(headers);

        Self {
            reset_at,
            retry_after,
            remaining,
        }
    }

    /// Returns the recommended delay before the next request.
    ///
    /// This uses `retry_after` if available, otherwise calculates from `reset_at`.
    /// Returns `None` if no rate limit information is available.
    ///
    /// The delay is capped by the provided `max_wait` duration.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        if let Some(reset_at) = self.reset_at {
            if let Ok(until_reset) = reset_at.duration_since(SystemTime::now()) {
                return Some(until_reset.min(max_wait));
            }
        }

        None
    }

    /// Returns `true` if this represents an active rate limit.
    ///
    /// A rate limit is considered active if:
    /// - `retry_after` is specified, OR
    /// - `remaining` is Some(0)
    pub fn is_rate_limited(&self) -> bool {
        self.retry_after.is_some() || self.remaining == Some(0)
    }
}

/// Configuration for rate limit handling.
///
/// # Examples
///
/// ```
/// use deskwire::rate_limit::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = RateLimitConfig::builder()
///     .requests_per_minute(700)
///     .max_wait(Duration::from_secs(120))
///     .build();
///
/// assert_eq!(config.requests_per_minute, 700);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether requests go through the token bucket and header feedback.
    ///
    /// When disabled, `acquire` is a no-op and rate limit headers are ignored
    /// by the limiter (a 429 is still retried).
    pub enabled: bool,

    /// Maximum time to honour a single server-declared wait.
    ///
    /// Defaults to 5 minutes.
    pub max_wait: Duration,

    /// Whether to respect the Retry-After header.
    ///
    /// Defaults to `true`.
    pub respect_retry_after: bool,

    /// Size of the local token bucket, refilled over one minute.
    ///
    /// Defaults to 400.
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_wait: Duration::from_secs(300),
            respect_retry_after: true,
            requests_per_minute: 400,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new builder for configuring rate limit handling.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// Creates a disabled rate limit configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Builder for `RateLimitConfig`.
#[derive(Default)]
pub struct RateLimitConfigBuilder {
    enabled: Option<bool>,
    max_wait: Option<Duration>,
    respect_retry_after: Option<bool>,
    requests_per_minute: Option<u32>,
}

impl RateLimitConfigBuilder {
    /// Sets whether rate limit handling is enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the maximum wait time for rate limits.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Sets whether to respect the Retry-After header.
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = Some(respect);
        self
    }

    /// Sets the local request budget per minute. Zero is treated as one.
    pub fn requests_per_minute(mut self, limit: u32) -> Self {
        self.requests_per_minute = Some(limit);
        self
    }

    /// Builds the `RateLimitConfig`.
    pub fn build(self) -> RateLimitConfig {
        let default = RateLimitConfig::default();
        RateLimitConfig {
            enabled: self.enabled.unwrap_or(default.enabled),
            max_wait: self.max_wait.unwrap_or(default.max_wait),
            respect_retry_after: self
                .respect_retry_after
                .unwrap_or(default.respect_retry_after),
            requests_per_minute: self
                .requests_per_minute
                .unwrap_or(default.requests_per_minute)
                .max(1),
        }
    }
}

/// Token state of a [`RateLimiter`].
#[derive(Debug)]
struct RateBudget {
    tokens: f64,
    last_refill: Instant,
    /// Set by a server-declared wait; no token is granted before it.
    blocked_until: Option<Instant>,
}

impl RateBudget {
    fn refill(&mut self, now: Instant, capacity: f64, per_second: f64) {
        if let Some(until) = self.blocked_until {
            if now < until {
                return;
            }
            self.blocked_until = None;
            self.last_refill = self.last_refill.max(until);
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * per_second).min(capacity);
        self.last_refill = now;
    }
}

/// Token bucket shared by every request a [`Client`](crate::Client) makes.
///
/// Waiters are served in arrival order: `acquire` first queues on a fair async
/// mutex, then polls the bucket. The bucket itself sits behind a synchronous
/// mutex that is never held across an await.
///
/// # Examples
///
/// ```
/// use deskwire::rate_limit::{RateLimitConfig, RateLimiter};
///
/// # async fn example() {
/// let limiter = RateLimiter::new(&RateLimitConfig::builder().requests_per_minute(60).build());
/// limiter.acquire().await;
/// assert!(limiter.available() < 60.0);
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    capacity: f64,
    per_second: f64,
    max_wait: Duration,
    queue: tokio::sync::Mutex<()>,
    budget: Mutex<RateBudget>,
}

impl RateLimiter {
    /// Creates a full bucket sized to `config.requests_per_minute`.
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.requests_per_minute.max(1));
        Self {
            enabled: config.enabled,
            capacity,
            per_second: capacity / 60.0,
            max_wait: config.max_wait,
            queue: tokio::sync::Mutex::new(()),
            budget: Mutex::new(RateBudget {
                tokens: capacity,
                last_refill: Instant::now(),
                blocked_until: None,
            }),
        }
    }

    /// Waits until one request may be sent, then consumes its token.
    ///
    /// Never fails; a disabled limiter returns immediately.
    pub async fn acquire(&self) {
        if !self.enabled {
            return;
        }

        let _turn = self.queue.lock().await;
        loop {
            let wait = {
                let mut budget = self.budget.lock();
                let now = Instant::now();
                budget.refill(now, self.capacity, self.per_second);

                match budget.blocked_until {
                    Some(until) => until.saturating_duration_since(now),
                    None if budget.tokens >= 1.0 => {
                        budget.tokens -= 1.0;
                        return;
                    }
                    None => Duration::from_secs_f64((1.0 - budget.tokens) / self.per_second),
                }
            };

            tracing::debug!(wait_ms = wait.as_millis(), "Waiting for rate limit budget");
            tokio::time::sleep(wait).await;
        }
    }

    /// Empties the bucket and grants nothing until `wait` has elapsed.
    ///
    /// An existing, later block is kept. A `wait` too large to represent as
    /// an instant pauses for the configured `max_wait` instead.
    pub fn pause_for(&self, wait: Duration) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        let until = now
            .checked_add(wait)
            .or_else(|| now.checked_add(self.max_wait))
            .unwrap_or(now);
        let mut budget = self.budget.lock();
        budget.tokens = 0.0;
        budget.blocked_until = Some(match budget.blocked_until {
            Some(existing) => existing.max(until),
            None => until,
        });

        tracing::warn!(
            retry_after_ms = wait.as_millis(),
            "Rate limited by server - pausing request budget"
        );
    }

    /// Feeds the headers of a response back into the bucket.
    ///
    /// `X-RateLimit-Remaining` lowers the local token count to the server's
    /// figure. A `Retry-After`, or an exhausted window with a known reset time,
    /// pauses the bucket for that long (capped by `config.max_wait`).
    pub fn observe(&self, info: &RateLimitInfo, config: &RateLimitConfig) {
        if !self.enabled {
            return;
        }

        if let Some(remaining) = info.remaining {
            let mut budget = self.budget.lock();
            budget.tokens = budget.tokens.min(remaining as f64);
        }

        let declared = if config.respect_retry_after {
            info.delay(config.max_wait)
        } else {
            RateLimitInfo {
                retry_after: None,
                ..info.clone()
            }
            .delay(config.max_wait)
        };

        if info.is_rate_limited() {
            if let Some(wait) = declared {
                self.pause_for(wait);
            }
        }
    }

    /// The number of tokens currently in the bucket.
    pub fn available(&self) -> f64 {
        let mut budget = self.budget.lock();
        budget.refill(Instant::now(), self.capacity, self.per_second);
        if budget.blocked_until.is_some() {
            0.0
        } else {
            budget.tokens
        }
    }
}

/// Parses the Retry-After header.
///
/// Supports both delay-seconds (integer) and HTTP-date formats.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // A date in the past means "now".
    if let Ok(date_time) = httpdate::parse_http_date(header) {
        return Some(
            date_time
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        );
    }

    None
}

/// Parses X-RateLimit-Reset (Unix timestamp) or RateLimit-Reset (seconds
/// until the window resets).
fn parse_rate_limit_reset(headers: &HeaderMap) -> Option<SystemTime> {
    let seconds = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<u64>().ok();

    if let Some(timestamp) = seconds("x-ratelimit-reset") {
        return UNIX_EPOCH.checked_add(Duration::from_secs(timestamp));
    }
    let delta = seconds("ratelimit-reset")?;
    SystemTime::now().checked_add(Duration::from_secs(delta))
}

/// Parses X-RateLimit-Remaining header.
fn parse_rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    let header = headers.get("x-ratelimit-remaining")?.to_str().ok()?;
    header.trim().parse().ok()
}
