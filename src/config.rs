//! Account configuration, loaded explicitly or from environment variables.
//!
//! The API token is stored but never logged, printed by `Debug`, or included in
//! error messages.

use crate::cache::CacheConfig;
use crate::rate_limit::RateLimitConfig;
use crate::{Error, Result};
use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: usize = 3;

/// Connection settings for one account.
///
/// # Examples
///
/// ```
/// use deskwire::Config;
///
/// let config = Config::new("MyCompany", "agent@mycompany.com", "api-token")?;
/// assert_eq!(config.subdomain(), "mycompany");
/// assert_eq!(config.endpoint(), "https://mycompany.zendesk.com/api/v2/");
/// assert!(!format!("{:?}", config).contains("api-token"));
/// # Ok::<(), deskwire::Error>(())
/// ```
#[derive(Clone)]
pub struct Config {
    subdomain: String,
    email: String,
    token: String,

    /// Per HTTP call timeout. Defaults to 30 seconds.
    pub timeout: Duration,

    /// Retries after the first attempt. Defaults to 3.
    pub max_retries: usize,

    /// Per-resource cache settings.
    pub cache: CacheConfig,

    /// Client-side rate limiting.
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Creates a validated configuration with default tuning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the email has no `@`, the subdomain
    /// contains anything but letters, digits, `-` and `_`, or the token is empty.
    pub fn new(
        subdomain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let subdomain = Self::validate_subdomain(subdomain.into())?;
        let email = Self::validate_email(email.into())?;
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::configuration("API token must not be empty"));
        }

        Ok(Self {
            subdomain,
            email,
            token,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ZENDESK_SUBDOMAIN` (required)
    /// - `ZENDESK_EMAIL` (required)
    /// - `ZENDESK_TOKEN` (required)
    /// - `ZENDESK_TIMEOUT_SECS` (optional, default 30)
    /// - `ZENDESK_MAX_RETRIES` (optional, default 3)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a required variable is missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    Error::configuration(format!("Missing required environment variable: {}", name))
                })
        };

        let mut config = Self::new(
            required("ZENDESK_SUBDOMAIN")?,
            required("ZENDESK_EMAIL")?,
            required("ZENDESK_TOKEN")?,
        )?;

        if let Some(raw) = lookup("ZENDESK_TIMEOUT_SECS") {
            let seconds: f64 = raw.trim().parse().map_err(|_| {
                Error::configuration("ZENDESK_TIMEOUT_SECS must be a number of seconds")
            })?;
            if !(seconds > 0.0 && seconds.is_finite()) {
                return Err(Error::configuration("ZENDESK_TIMEOUT_SECS must be positive"));
            }
            config.timeout = Duration::from_secs_f64(seconds);
        }

        if let Some(raw) = lookup("ZENDESK_MAX_RETRIES") {
            config.max_retries = raw.trim().parse().map_err(|_| {
                Error::configuration("ZENDESK_MAX_RETRIES must be a non-negative integer")
            })?;
        }

        Ok(config)
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replaces the cache settings.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the rate limit settings.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// The lower-cased account subdomain.
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// The agent email used for authentication.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Base URL of the REST API, with a trailing slash.
    pub fn endpoint(&self) -> String {
        format!("https://{}.zendesk.com/api/v2/", self.subdomain)
    }

    /// Basic auth user name for API token authentication.
    pub(crate) fn auth_user(&self) -> String {
        format!("{}/token", self.email)
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    fn validate_subdomain(subdomain: String) -> Result<String> {
        let subdomain = subdomain.trim().to_lowercase();
        let valid = !subdomain.is_empty()
            && subdomain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::configuration(
                "Subdomain can only contain letters, numbers, hyphens and underscores",
            ));
        }
        Ok(subdomain)
    }

    fn validate_email(email: String) -> Result<String> {
        let email = email.trim().to_string();
        if !email.contains('@') {
            return Err(Error::configuration("Invalid email format"));
        }
        Ok(email)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("subdomain", &self.subdomain)
            .field("email", &self.email)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("cache", &self.cache)
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}
