//! Request description consumed by the executor.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// One logical API request.
///
/// A `Request` is assembled with consuming builder methods and then handed to
/// [`Client::execute`](crate::Client::execute) by reference; the executor never
/// mutates it, so every retry resends exactly the same request.
///
/// Query parameters keep their insertion order and keys are unique: setting a
/// key that is already present replaces its value in place.
///
/// # Examples
///
/// ```
/// use deskwire::Request;
///
/// let request = Request::get("search.json")
///     .with_query_param("query", "type:ticket status:open")
///     .with_query_param("per_page", "50")
///     .with_query_param("per_page", "100");
///
/// assert_eq!(request.query_param("per_page"), Some("100"));
/// assert_eq!(request.query().len(), 2);
/// assert!(request.is_idempotent());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl Request {
    /// Creates a request with the given method and path (relative to the base URL).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Shorthand for a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets a query parameter, replacing any previous value for the same key.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    /// Sets multiple query parameters.
    pub fn with_query_params(
        self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        params
            .into_iter()
            .fold(self, |request, (key, value)| request.with_query_param(key, value))
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, crate::Error> {
        let value = serde_json::to_value(body).map_err(|e| {
            crate::Error::Configuration(format!("Failed to serialize request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path relative to the client's base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request-specific headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Looks up a single query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// The JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Whether resending this request is safe.
    ///
    /// Determined by the method alone: `GET`, `HEAD`, `OPTIONS`, `PUT` and
    /// `DELETE` are idempotent, `POST` and `PATCH` are not.
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self.method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
        )
    }
}
