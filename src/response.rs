//! Response wrapper that preserves both parsed data and raw response details.
//!
//! The executor returns a `Response<()>` carrying the raw body; the resource
//! APIs decode it at the boundary into typed records with [`Response::decode`],
//! [`Response::member`] or [`Response::collection`]. Downstream code never works
//! on open-ended JSON maps.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

/// A wrapper around a successful HTTP response.
///
/// # Examples
///
/// ```no_run
/// use deskwire::{Client, Request};
/// use deskwire::models::Ticket;
///
/// # async fn example(client: Client) -> Result<(), deskwire::Error> {
/// let response = client.execute(&Request::get("tickets/42.json")).await?;
///
/// println!("Status: {}", response.status);
/// println!("Request took {:?} over {} attempt(s)", response.latency, response.attempts);
///
/// let ticket: Ticket = response.member("ticket")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The deserialized response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The total latency of the request, including all retry attempts and
    /// rate-limit waits.
    pub latency: Duration,

    /// The number of attempts made to complete this request.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use deskwire::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Decodes the whole body into `U`, keeping the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the body does not match `U`.
    pub fn decode<U: DeserializeOwned>(self) -> Result<Response<U>> {
        let data = serde_json::from_str::<U>(&self.raw_body).map_err(|e| {
            tracing::error!(error = %e, status = self.status.as_u16(), "Failed to decode response");
            Error::validation(format!("Failed to decode response body: {}", e))
        })?;
        Ok(self.map(|_| data))
    }

    /// Decodes the single record stored under `key`, e.g. `{"ticket": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the key is missing or the record does
    /// not decode.
    pub fn member<U: DeserializeOwned>(&self, key: &str) -> Result<U> {
        let mut object = self.json_object()?;
        let value = object
            .remove(key)
            .ok_or_else(|| Error::validation(format!("Response is missing `{}`", key)))?;
        decode_value(value, key)
    }

    /// Decodes the array stored under `key`, e.g. `{"users": [...]}`.
    ///
    /// A missing or `null` key decodes as an empty collection.
    pub fn collection<U: DeserializeOwned>(&self, key: &str) -> Result<Vec<U>> {
        let mut object = self.json_object()?;
        take_collection(&mut object, key)
    }

    /// Parses the body as a JSON object.
    pub(crate) fn json_object(&self) -> Result<Map<String, Value>> {
        match serde_json::from_str::<Value>(&self.raw_body) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(other) => Err(Error::validation(format!(
                "Expected a JSON object, got {}",
                json_type_name(&other)
            ))),
            Err(e) => Err(Error::validation(format!(
                "Failed to decode response body: {}",
                e
            ))),
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Removes `key` from a decoded envelope and decodes it as a list of records.
pub(crate) fn take_collection<U: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
) -> Result<Vec<U>> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => decode_value(value, key),
    }
}

fn decode_value<U: DeserializeOwned>(value: Value, key: &str) -> Result<U> {
    serde_json::from_value(value)
        .map_err(|e| Error::validation(format!("Failed to decode `{}`: {}", key, e)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
