//! In-memory transport for unit tests.

use crate::retry::RetryStrategy;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::{Client, Error, Result};
use async_trait::async_trait;
use http::{HeaderName, HeaderValue, StatusCode};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const BASE_URL: &str = "http://test.local/";

#[derive(Clone)]
enum Scripted {
    Respond {
        response: TransportResponse,
        after: Option<Duration>,
    },
    Fail(Error),
}

/// Answers requests from per-route queues.
///
/// A route is either `path` or `path?query` (without the leading slash); the
/// more specific one wins. The last scripted answer of a route repeats forever.
/// Unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, route: &str, scripted: Scripted) {
        self.routes
            .lock()
            .entry(route.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub(crate) fn respond(&self, route: &str, status: u16, body: &str) -> &Self {
        self.respond_with_headers(route, status, body, &[])
    }

    pub(crate) fn respond_with_headers(
        &self,
        route: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) -> &Self {
        let mut response = TransportResponse::new(
            StatusCode::from_u16(status).expect("valid status"),
            body,
        );
        for (name, value) in headers {
            response.headers.insert(
                HeaderName::try_from(*name).expect("valid header name"),
                HeaderValue::try_from(*value).expect("valid header value"),
            );
        }
        self.push(
            route,
            Scripted::Respond {
                response,
                after: None,
            },
        );
        self
    }

    pub(crate) fn respond_after(&self, route: &str, after: Duration, status: u16, body: &str) -> &Self {
        let response = TransportResponse::new(
            StatusCode::from_u16(status).expect("valid status"),
            body,
        );
        self.push(
            route,
            Scripted::Respond {
                response,
                after: Some(after),
            },
        );
        self
    }

    pub(crate) fn fail(&self, route: &str, error: Error) -> &Self {
        self.push(route, Scripted::Fail(error));
        self
    }

    /// Every request received, in order.
    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests whose path (without leading slash) equals `path`.
    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.path().trim_start_matches('/') == path)
            .count()
    }

    fn next_for(&self, request: &TransportRequest) -> Option<Scripted> {
        let path = request.url.path().trim_start_matches('/').to_string();
        let full = match request.url.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.clone(),
        };

        let mut routes = self.routes.lock();
        let key = if routes.get(&full).is_some_and(|queue| !queue.is_empty()) {
            full
        } else {
            path
        };
        let queue = routes.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().push(request.clone());
        match self.next_for(&request) {
            Some(Scripted::Respond { response, after }) => {
                if let Some(after) = after {
                    tokio::time::sleep(after).await;
                }
                Ok(response)
            }
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(TransportResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

/// A client over `transport` with deterministic backoff (100ms doubling, no
/// jitter).
pub(crate) fn test_client(transport: &Arc<ScriptedTransport>, max_retries: usize) -> Client {
    Client::builder()
        .base_url(BASE_URL)
        .expect("valid base url")
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .retry_strategy(RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            max_retries,
            jitter: false,
        })
        .build()
        .expect("valid client")
}
