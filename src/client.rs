//! The request executor and client configuration.
//!
//! The [`Client`] type is the main entry point. Every call, whether made through
//! a resource API such as [`Client::tickets`] or directly with
//! [`Client::execute`], passes through the same pipeline:
//!
//! 1. wait for the [`RateLimiter`](crate::rate_limit::RateLimiter),
//! 2. send through the [`Transport`],
//! 3. feed the response's rate limit headers back into the limiter,
//! 4. [`classify`] the result and either return it or back off and go to 1.
//!
//! Use [`ClientBuilder`] or [`Client::from_config`] to create clients.

use crate::{
    api::{HelpCenterApi, OrganizationsApi, SearchApi, TicketsApi, UsersApi},
    cache::{CacheConfig, Caches, ClientCacheStats},
    config::Config,
    rate_limit::{RateLimitConfig, RateLimitInfo, RateLimiter},
    request::Request,
    retry::{classify, Outcome, RetryStrategy},
    transport::{ReqwestTransport, Transport, TransportRequest},
    Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// A client for the ticketing API with retries, rate limiting and caching.
///
/// The client is cheap to clone; clones share the transport, the rate limiter
/// and the caches.
///
/// # Examples
///
/// ```no_run
/// use deskwire::{Client, Config};
///
/// # async fn example() -> Result<(), deskwire::Error> {
/// let client = Client::from_config(&Config::from_env()?)?;
///
/// let ticket = client.tickets().get(35436).await?;
/// println!("#{}: {}", ticket.id, ticket.subject.unwrap_or_default());
///
/// let enriched = client.tickets().get_enriched(35436).await?;
/// for comment in &enriched.comments {
///     let author = enriched.author_of(comment).map(|u| u.name.as_str()).unwrap_or("?");
///     println!("{}: {}", author, comment.body);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_url: Url,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    timeout: Option<Duration>,
    overall_timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
    rate_limiter: RateLimiter,
    caches: Caches,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::{Client, RetryStrategy};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), deskwire::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://acme.zendesk.com/api/v2/")?
    ///     .basic_auth("agent@acme.test/token", "api-token")
    ///     .retry_strategy(RetryStrategy::exponential(3))
    ///     .overall_timeout(Duration::from_secs(120))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client for the account described by `config`.
    ///
    /// Uses token authentication, exponential backoff with
    /// `config.max_retries` retries, and the configured timeout, caches and
    /// rate limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        tracing::debug!(config = ?config, "Creating client from config");
        ClientBuilder::new()
            .base_url(config.endpoint())?
            .default_header("Accept", "application/json")?
            .default_header(
                "User-Agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )?
            .basic_auth(config.auth_user(), config.token())
            .timeout(config.timeout)
            .retry_strategy(RetryStrategy::exponential(config.max_retries))
            .rate_limit_config(config.rate_limit.clone())
            .cache_config(config.cache.clone())
            .build()
    }

    /// Executes one logical request and returns the raw successful response.
    ///
    /// Transient failures (429, 5xx and transport errors) are retried
    /// according to the retry strategy, whatever the method; a 429's
    /// `Retry-After` replaces the local backoff. Every attempt waits for the
    /// rate limiter first.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`], [`Error::NotFound`], [`Error::Validation`] and
    ///   [`Error::Http`] for terminal statuses, after a single attempt.
    /// - [`Error::RetriesExhausted`] wrapping the last transient failure.
    /// - [`Error::Timeout`] if the overall timeout expires, even mid-backoff.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::{Client, Request};
    ///
    /// # async fn example(client: Client) -> Result<(), deskwire::Error> {
    /// let request = Request::get("tickets/recent.json").with_query_param("per_page", "10");
    /// let response = client.execute(&request).await?;
    /// println!("{} after {} attempt(s)", response.status, response.attempts);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(&self, request: &Request) -> Result<Response<()>> {
        let attempts = self.run_attempts(request);

        match self.inner.overall_timeout {
            Some(limit) => tokio::time::timeout(limit, attempts).await.map_err(|_| {
                tracing::warn!(
                    method = %request.method(),
                    path = %request.path(),
                    timeout_ms = limit.as_millis(),
                    "Request timed out"
                );
                Error::Timeout(limit)
            })?,
            None => attempts.await,
        }
    }

    async fn run_attempts(&self, request: &Request) -> Result<Response<()>> {
        let start_time = Instant::now();
        let url = self.url_for(request)?;
        let body = request
            .body()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| Error::configuration(format!("Failed to serialize request body: {}", e)))?;
        let mut headers = self.inner.default_headers.clone();
        headers.extend(request.headers().clone());

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.inner.rate_limiter.acquire().await;

            tracing::debug!(
                method = %request.method(),
                url = %url,
                attempt = attempt,
                "Executing HTTP request"
            );

            let result = self
                .inner
                .transport
                .send(TransportRequest {
                    method: request.method().clone(),
                    url: url.clone(),
                    headers: headers.clone(),
                    body: body.clone(),
                    timeout: self.inner.timeout,
                })
                .await;

            if let Ok(response) = &result {
                let info = RateLimitInfo::from_headers(&response.headers);
                self.inner
                    .rate_limiter
                    .observe(&info, &self.inner.rate_limit_config);
            }

            let outcome = classify(result, request.path(), &self.inner.rate_limit_config);

            match outcome {
                Outcome::Success(raw) => {
                    let latency = start_time.elapsed();
                    tracing::info!(
                        status = raw.status.as_u16(),
                        latency_ms = latency.as_millis(),
                        attempts = attempt,
                        "Received HTTP response"
                    );
                    return Ok(Response::new(
                        (),
                        raw.body,
                        raw.status,
                        raw.headers,
                        latency,
                        attempt,
                    ));
                }
                Outcome::Fatal(error) => {
                    tracing::warn!(
                        error = %error,
                        attempt = attempt,
                        method = %request.method(),
                        path = %request.path(),
                        "Request failed"
                    );
                    return Err(error);
                }
                Outcome::Retryable { error, delay } => {
                    let Some(backoff) = self.inner.retry_strategy.delay_for_attempt(attempt) else {
                        tracing::warn!(
                            error = %error,
                            attempts = attempt,
                            method = %request.method(),
                            path = %request.path(),
                            "Retries exhausted"
                        );
                        return Err(Error::RetriesExhausted {
                            attempts: attempt,
                            last_error: Box::new(error),
                        });
                    };

                    let wait = delay.unwrap_or(backoff);
                    if error.is_rate_limit() {
                        tracing::warn!(
                            retry_after_ms = wait.as_millis(),
                            attempt = attempt,
                            max_wait_secs = self.inner.rate_limit_config.max_wait.as_secs(),
                            "Rate limited - waiting before retry"
                        );
                    } else {
                        tracing::info!(
                            error = %error,
                            delay_ms = wait.as_millis(),
                            attempt = attempt,
                            "Retrying request after delay"
                        );
                    }

                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Resolves a request path against the base URL and appends the query.
    fn url_for(&self, request: &Request) -> Result<Url> {
        let mut url = self
            .inner
            .base_url
            .join(request.path().trim_start_matches('/'))?;
        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query());
        }
        Ok(url)
    }

    /// Executes a request and decodes the whole body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`Client::execute`] returns, plus [`Error::Validation`] if
    /// the body does not decode.
    pub async fn call<T: DeserializeOwned>(&self, request: &Request) -> Result<Response<T>> {
        self.execute(request).await?.decode()
    }

    /// Makes a GET request to the specified path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::Client;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Locales { locales: Vec<serde_json::Value> }
    ///
    /// # async fn example(client: Client) -> Result<(), deskwire::Error> {
    /// let locales: deskwire::Response<Locales> = client.get("locales.json").await?;
    /// println!("{} locales", locales.data.locales.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<Response<T>> {
        self.call(&Request::get(path)).await
    }

    /// Makes a POST request to the specified path with a JSON body.
    pub async fn post<B, T>(&self, path: impl Into<String>, body: &B) -> Result<Response<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(&Request::post(path).with_json_body(body)?).await
    }

    /// Makes a PUT request to the specified path with a JSON body.
    pub async fn put<B, T>(&self, path: impl Into<String>, body: &B) -> Result<Response<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(&Request::put(path).with_json_body(body)?).await
    }

    /// Makes a DELETE request to the specified path.
    ///
    /// The body is usually empty, so the raw response is returned.
    pub async fn delete(&self, path: impl Into<String>) -> Result<Response<()>> {
        self.execute(&Request::delete(path)).await
    }

    /// Users.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Organizations.
    pub fn organizations(&self) -> OrganizationsApi {
        OrganizationsApi::new(self.clone())
    }

    /// Tickets, comments, tags and enrichment.
    pub fn tickets(&self) -> TicketsApi {
        TicketsApi::new(self.clone())
    }

    /// Unified search and export search.
    pub fn search(&self) -> SearchApi {
        SearchApi::new(self.clone())
    }

    /// Help center categories, sections and articles.
    pub fn help_center(&self) -> HelpCenterApi {
        HelpCenterApi::new(self.clone())
    }

    /// The shared rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Counters and occupancy of every cache.
    pub fn cache_stats(&self) -> ClientCacheStats {
        ClientCacheStats::from(&self.inner.caches)
    }

    /// Empties every cache. Counters are kept.
    pub fn clear_caches(&self) {
        self.inner.caches.clear();
    }

    /// Releases cached data held by this client and its clones.
    ///
    /// The client stays usable; later lookups simply start cold.
    pub fn shutdown(&self) {
        self.inner.caches.clear();
        tracing::debug!("Client shut down, caches cleared");
    }

    pub(crate) fn caches(&self) -> &Caches {
        &self.inner.caches
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use deskwire::{ClientBuilder, RetryStrategy};
/// use deskwire::cache::CacheConfig;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), deskwire::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://acme.zendesk.com/api/v2/")?
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::ExponentialBackoff {
///         initial_delay: Duration::from_millis(500),
///         max_delay: Duration::from_secs(10),
///         max_retries: 3,
///         jitter: true,
///     })
///     .cache_config(CacheConfig::disabled())
///     .default_header("User-Agent", "triage-bot/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    timeout: Option<Duration>,
    overall_timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
    cache_config: CacheConfig,
    transport: Option<Arc<dyn Transport>>,
    basic_auth: Option<(String, String)>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            retry_strategy: RetryStrategy::None,
            timeout: None,
            overall_timeout: None,
            rate_limit_config: RateLimitConfig::default(),
            cache_config: CacheConfig::default(),
            transport: None,
            basic_auth: None,
        }
    }

    /// Sets the base URL that request paths are resolved against.
    ///
    /// A trailing slash is added if missing, so `https://x/api/v2` and
    /// `https://x/api/v2/` behave the same.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(url.as_ref())?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry strategy for transient failures.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets the timeout of each individual HTTP call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bounds one logical request, including every retry and backoff sleep.
    pub fn overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    /// Sets the rate limit configuration.
    ///
    /// By default, rate limit handling is enabled with a budget of 400
    /// requests per minute.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::{Client, rate_limit::RateLimitConfig};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), deskwire::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://acme.zendesk.com/api/v2/")?
    ///     .rate_limit_config(RateLimitConfig::builder()
    ///         .requests_per_minute(200)
    ///         .max_wait(Duration::from_secs(60))
    ///         .build())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Sets the per-resource cache configuration.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Replaces the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Authenticates with HTTP basic auth through the built-in transport.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided, if basic auth is combined
    /// with a custom transport, or if the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::configuration("Base URL is required"))?;

        let transport: Arc<dyn Transport> = match (self.transport, self.basic_auth) {
            (Some(_), Some(_)) => {
                return Err(Error::configuration(
                    "basic_auth only applies to the built-in transport",
                ))
            }
            (Some(transport), None) => transport,
            (None, Some((user, password))) => {
                Arc::new(ReqwestTransport::new()?.with_basic_auth(user, password))
            }
            (None, None) => Arc::new(ReqwestTransport::new()?),
        };

        let rate_limiter = RateLimiter::new(&self.rate_limit_config);
        let caches = Caches::new(&self.cache_config);

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: self.default_headers,
                retry_strategy: self.retry_strategy,
                timeout: self.timeout,
                overall_timeout: self.overall_timeout,
                rate_limit_config: self.rate_limit_config,
                rate_limiter,
                caches,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_client, ScriptedTransport, BASE_URL};
    use http::{Method, StatusCode};

    #[tokio::test(start_paused = true)]
    async fn test_success_after_two_server_errors() {
        let transport = ScriptedTransport::new();
        transport
            .respond("tickets/1.json", 503, "unavailable")
            .respond("tickets/1.json", 503, "unavailable")
            .respond("tickets/1.json", 200, r#"{"ticket": {"id": 1, "requester_id": 2}}"#);
        let client = test_client(&transport, 3);

        let response = client.execute(&Request::get("tickets/1.json")).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.attempts, 3);
        assert!(response.was_retried());
        assert_eq!(transport.count("tickets/1.json"), 3);
        // 100ms + 200ms of backoff.
        assert!(response.latency >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_success_waits_retry_after() {
        let transport = ScriptedTransport::new();
        transport
            .respond_with_headers("tickets.json", 429, "", &[("retry-after", "2")])
            .respond("tickets.json", 200, r#"{"tickets": []}"#);
        let client = test_client(&transport, 3);

        let start = Instant::now();
        let response = client.execute(&Request::get("tickets.json")).await.unwrap();

        assert_eq!(response.attempts, 2);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_exhausts_retries() {
        let transport = ScriptedTransport::new();
        transport.respond_with_headers("tickets.json", 429, "", &[("retry-after", "1")]);
        let client = test_client(&transport, 3);

        let err = client.execute(&Request::get("tickets.json")).await.unwrap_err();

        match &err {
            Error::RetriesExhausted { attempts, last_error } => {
                assert_eq!(*attempts, 4);
                assert!(matches!(
                    **last_error,
                    Error::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(1)
                ));
            }
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(transport.count("tickets.json"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_fatal_without_delay() {
        let transport = ScriptedTransport::new();
        transport.respond("tickets/404.json", 404, r#"{"error": "RecordNotFound"}"#);
        let client = test_client(&transport, 3);

        let start = Instant::now();
        let err = client
            .execute(&Request::get("tickets/404.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { ref path } if path == "tickets/404.json"));
        assert_eq!(transport.count("tickets/404.json"), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_never_retried() {
        let transport = ScriptedTransport::new();
        transport.respond("users/me.json", 401, "Couldn't authenticate you");
        let client = test_client(&transport, 5);

        let err = client.execute(&Request::get("users/me.json")).await.unwrap_err();

        assert!(matches!(err, Error::Auth { status } if status == StatusCode::UNAUTHORIZED));
        assert_eq!(transport.count("users/me.json"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_exhausts_retries() {
        let transport = ScriptedTransport::new();
        transport.fail("tickets.json", Error::Transport("connection refused".into()));
        let client = test_client(&transport, 2);

        let err = client.execute(&Request::get("tickets.json")).await.unwrap_err();

        assert!(matches!(err.root_cause(), Error::Transport(_)));
        assert_eq!(transport.count("tickets.json"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_is_retried_on_server_error() {
        let transport = ScriptedTransport::new();
        transport
            .respond("organizations.json", 503, "busy")
            .respond(
                "organizations.json",
                200,
                r#"{"organization": {"id": 5, "name": "Acme"}}"#,
            );
        let client = test_client(&transport, 3);

        let request = Request::post("organizations.json")
            .with_json_body(&serde_json::json!({"organization": {"name": "Acme"}}))
            .unwrap();
        let response = client.execute(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.attempts, 2);
        assert_eq!(transport.count("organizations.json"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_timeout_aborts_mid_retry() {
        let transport = ScriptedTransport::new();
        transport.respond("tickets.json", 503, "");
        let client = Client::builder()
            .base_url(BASE_URL)
            .unwrap()
            .transport(transport.clone())
            .retry_strategy(RetryStrategy::Linear {
                delay: Duration::from_secs(10),
                max_retries: 10,
            })
            .overall_timeout(Duration::from_secs(15))
            .build()
            .unwrap();

        let err = client.execute(&Request::get("tickets.json")).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(15)));
        assert_eq!(transport.count("tickets.json"), 2);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = ScriptedTransport::new();
        transport.respond("search.json", 200, r#"{"results": []}"#);
        let client = Client::builder()
            .base_url("http://test.local")
            .unwrap()
            .default_header("Accept", "application/json")
            .unwrap()
            .transport(transport.clone())
            .build()
            .unwrap();

        let request = Request::get("/search.json")
            .with_query_param("query", "type:ticket status:open")
            .with_header("X-Trace", "abc")
            .unwrap();
        client.execute(&request).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.url.path(), "/search.json");
        let query: Vec<(String, String)> = sent.url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![("query".to_string(), "type:ticket status:open".to_string())]
        );
        assert_eq!(sent.headers["accept"], "application/json");
        assert_eq!(sent.headers["x-trace"], "abc");
        assert!(sent.body.is_none());
    }

    #[tokio::test]
    async fn test_call_decodes_body() {
        #[derive(serde::Deserialize)]
        struct Count {
            count: u64,
        }

        let transport = ScriptedTransport::new();
        transport.respond("tickets/count.json", 200, r#"{"count": 12}"#);
        let client = test_client(&transport, 0);

        let response: Response<Count> = client.get("tickets/count.json").await.unwrap();
        assert_eq!(response.data.count, 12);
        assert_eq!(response.attempts, 1);
    }

    #[test]
    fn test_basic_auth_requires_builtin_transport() {
        let result = Client::builder()
            .base_url(BASE_URL)
            .unwrap()
            .transport(ScriptedTransport::new())
            .basic_auth("a@b.c/token", "secret")
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            Client::builder().build(),
            Err(Error::Configuration(_))
        ));
    }
}
