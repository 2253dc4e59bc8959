//! Pull-based pagination over list endpoints.
//!
//! Two styles are supported:
//!
//! - [`OffsetPager`] walks `page=N&per_page=M` endpoints. It can be reset and
//!   walked again.
//! - [`CursorPager`] walks `page[after]` endpoints such as the export search.
//!   Cursors only move forward.
//!
//! Both can be turned into a [`BoxStream`] that issues a request only when the
//! consumer has drained the previous page, and never after `limit` items.

use crate::{response::take_collection, Client, Error, Request, Result};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Page size used when none is given.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Largest page the offset endpoints accept.
pub const MAX_PER_PAGE: u32 = 100;

/// Largest batch the cursor endpoints accept.
pub const MAX_CURSOR_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Ready(u32),
    Exhausted,
}

/// Walks an offset-paginated endpoint one page at a time.
///
/// ```text
/// Ready(1) --page with more results--> Ready(2) --...--> Exhausted
/// ```
///
/// A failed page leaves the state unchanged, so calling
/// [`get_page`](Self::get_page) again retries the same page.
///
/// # Examples
///
/// ```no_run
/// use deskwire::Client;
///
/// # async fn example(client: Client) -> Result<(), deskwire::Error> {
/// let mut pager = client.tickets().list().per_page(50);
/// loop {
///     let page = pager.get_page().await?;
///     if page.is_empty() {
///         break;
///     }
///     for ticket in page {
///         println!("#{} {:?}", ticket.id, ticket.subject);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct OffsetPager<T> {
    client: Client,
    request: Request,
    items_key: String,
    per_page: u32,
    state: PageState,
    stop_at_result_cap: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> OffsetPager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Creates a pager for `request`, reading items from the `items_key`
    /// member of each page.
    pub fn new(client: Client, request: Request, items_key: impl Into<String>) -> Self {
        Self {
            client,
            request,
            items_key: items_key.into(),
            per_page: DEFAULT_PER_PAGE,
            state: PageState::Ready(1),
            stop_at_result_cap: false,
            _marker: PhantomData,
        }
    }

    /// Sets the page size, clamped to `1..=100`.
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Treats a 400 or 422 on any page after the first as the end of the
    /// results. Search endpoints answer this way once their result cap is
    /// reached.
    pub fn stop_at_result_cap(mut self) -> Self {
        self.stop_at_result_cap = true;
        self
    }

    /// The page the next call will fetch, or `None` once exhausted.
    pub fn current_page(&self) -> Option<u32> {
        match self.state {
            PageState::Ready(page) => Some(page),
            PageState::Exhausted => None,
        }
    }

    /// Returns `true` once no more pages will be requested.
    pub fn is_exhausted(&self) -> bool {
        self.state == PageState::Exhausted
    }

    /// Restarts at page 1.
    pub fn reset(&mut self) {
        self.state = PageState::Ready(1);
    }

    /// Fetches the next page.
    ///
    /// Returns an empty vec, without a request, once the pager is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the executor's error for the failing page, or
    /// [`Error::Validation`] if the page does not decode.
    pub async fn get_page(&mut self) -> Result<Vec<T>> {
        let page = match self.state {
            PageState::Ready(page) => page,
            PageState::Exhausted => return Ok(Vec::new()),
        };

        let request = self
            .request
            .clone()
            .with_query_param("page", page.to_string())
            .with_query_param("per_page", self.per_page.to_string());

        let response = match self.client.execute(&request).await {
            Ok(response) => response,
            Err(error) if self.stop_at_result_cap && page > 1 && error.is_validation() => {
                tracing::debug!(
                    path = %self.request.path(),
                    page = page,
                    error = %error,
                    "Search result cap reached"
                );
                self.state = PageState::Exhausted;
                return Ok(Vec::new());
            }
            Err(error) => return Err(error),
        };

        let mut object = response.json_object()?;
        let items: Vec<T> = take_collection(&mut object, &self.items_key)?;
        let more = !items.is_empty() && has_more_results(&object, page, self.per_page, items.len());

        self.state = if more {
            PageState::Ready(page + 1)
        } else {
            PageState::Exhausted
        };
        tracing::debug!(
            path = %self.request.path(),
            page = page,
            items = items.len(),
            exhausted = !more,
            "Fetched page"
        );

        Ok(items)
    }

    /// Fetches every remaining page.
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while !self.is_exhausted() {
            all.extend(self.get_page().await?);
        }
        Ok(all)
    }

    /// Turns the pager into a lazy stream of items.
    ///
    /// At most `limit` items are yielded, and no page is requested once the
    /// limit is reached. The stream ends after the first error.
    pub fn into_stream(self, limit: Option<usize>) -> BoxStream<'static, Result<T>> {
        let items = stream::try_unfold(self, |mut pager| async move {
            if pager.is_exhausted() {
                return Ok(None);
            }
            let page = pager.get_page().await?;
            Ok::<_, Error>(Some((stream::iter(page.into_iter().map(Ok::<T, Error>)), pager)))
        })
        .try_flatten();

        match limit {
            Some(limit) => items.take(limit).boxed(),
            None => items.boxed(),
        }
    }
}

/// Decides whether another page exists.
///
/// Checked in order: an explicit `has_more`, the presence of a non-null
/// `next_page`, the reported `count`, and finally whether the page was full.
fn has_more_results(object: &Map<String, Value>, page: u32, per_page: u32, received: usize) -> bool {
    if let Some(has_more) = object.get("has_more").and_then(Value::as_bool) {
        return has_more;
    }
    if let Some(next_page) = object.get("next_page") {
        return !next_page.is_null();
    }
    if let Some(count) = object.get("count").and_then(Value::as_u64) {
        return u64::from(page) * u64::from(per_page) < count;
    }
    received >= per_page as usize
}

/// One batch of a cursor-paginated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorBatch<T> {
    pub items: Vec<T>,

    /// Cursor for the following batch. `None` means there is none.
    pub next_cursor: Option<String>,
}

/// Walks a cursor-paginated endpoint.
///
/// # Examples
///
/// ```no_run
/// use deskwire::Client;
/// use futures::TryStreamExt;
///
/// # async fn example(client: Client) -> Result<(), deskwire::Error> {
/// let tickets: Vec<_> = client
///     .search()
///     .export_tickets("status:open", Some(5000))
///     .try_collect()
///     .await?;
/// println!("{} open tickets", tickets.len());
/// # Ok(())
/// # }
/// ```
pub struct CursorPager<T> {
    client: Client,
    request: Request,
    items_key: String,
    page_size: u32,
    _marker: PhantomData<fn() -> T>,
}

enum CursorState {
    Start,
    After(String),
    Done,
}

impl<T> CursorPager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Creates a pager for `request`, reading items from `items_key`.
    pub fn new(client: Client, request: Request, items_key: impl Into<String>) -> Self {
        Self {
            client,
            request,
            items_key: items_key.into(),
            page_size: DEFAULT_PER_PAGE,
            _marker: PhantomData,
        }
    }

    /// Sets the batch size, clamped to `1..=1000`.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_CURSOR_PAGE_SIZE);
        self
    }

    /// Fetches the batch after `cursor`, or the first batch for `None`.
    ///
    /// The returned cursor is `None` when the server reports no more results,
    /// omits the cursor, or hands back the cursor it was given.
    pub async fn next_batch(&self, cursor: Option<&str>) -> Result<CursorBatch<T>> {
        let mut request = self
            .request
            .clone()
            .with_query_param("page[size]", self.page_size.to_string());
        if let Some(cursor) = cursor {
            request = request.with_query_param("page[after]", cursor);
        }

        let response = self.client.execute(&request).await?;
        let mut object = response.json_object()?;
        let items: Vec<T> = take_collection(&mut object, &self.items_key)?;

        let meta = object.get("meta");
        let has_more = meta
            .and_then(|meta| meta.get("has_more"))
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let next_cursor = meta
            .and_then(|meta| meta.get("after_cursor"))
            .and_then(Value::as_str)
            .filter(|next| has_more && !items.is_empty() && Some(*next) != cursor)
            .map(str::to_string);

        tracing::debug!(
            path = %self.request.path(),
            items = items.len(),
            has_next = next_cursor.is_some(),
            "Fetched cursor batch"
        );

        Ok(CursorBatch { items, next_cursor })
    }

    /// Turns the pager into a lazy, forward-only stream of items.
    ///
    /// At most `limit` items are yielded; once reached, no further batch is
    /// requested even if a cursor remains.
    pub fn into_stream(self, limit: Option<usize>) -> BoxStream<'static, Result<T>> {
        let items = stream::try_unfold(
            (self, CursorState::Start),
            |(pager, state)| async move {
                let cursor = match state {
                    CursorState::Start => None,
                    CursorState::After(cursor) => Some(cursor),
                    CursorState::Done => return Ok(None),
                };
                let batch = pager.next_batch(cursor.as_deref()).await?;
                let next = match batch.next_cursor {
                    Some(cursor) => CursorState::After(cursor),
                    None => CursorState::Done,
                };
                Ok::<_, Error>(Some((
                    stream::iter(batch.items.into_iter().map(Ok::<T, Error>)),
                    (pager, next),
                )))
            },
        )
        .try_flatten();

        match limit {
            Some(limit) => items.take(limit).boxed(),
            None => items.boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_client, ScriptedTransport};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    fn query_of(request: &crate::transport::TransportRequest, key: &str) -> Option<String> {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[tokio::test]
    async fn test_offset_pages_until_empty_page() {
        let transport = ScriptedTransport::new();
        transport
            .respond(
                "items.json",
                200,
                r#"{"items": [{"id": "A"}, {"id": "B"}], "next_page": "p2"}"#,
            )
            .respond("items.json", 200, r#"{"items": [{"id": "C"}], "next_page": "p3"}"#)
            .respond("items.json", 200, r#"{"items": [], "next_page": null}"#);
        let client = test_client(&transport, 0);

        let mut pager: OffsetPager<Item> =
            OffsetPager::new(client, Request::get("items.json"), "items").per_page(2);

        assert_eq!(ids(&pager.get_page().await.unwrap()), ["A", "B"]);
        assert_eq!(pager.current_page(), Some(2));
        assert_eq!(ids(&pager.get_page().await.unwrap()), ["C"]);
        assert!(pager.get_page().await.unwrap().is_empty());
        assert!(pager.is_exhausted());

        // Exhausted: no fourth request.
        assert!(pager.get_page().await.unwrap().is_empty());
        assert_eq!(transport.count("items.json"), 3);

        let pages: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| query_of(r, "page").unwrap())
            .collect();
        assert_eq!(pages, ["1", "2", "3"]);
        assert_eq!(query_of(&transport.requests()[0], "per_page").as_deref(), Some("2"));
    }

    #[test]
    fn test_more_results_detection_order() {
        let object = |json: &str| match serde_json::from_str::<Value>(json).unwrap() {
            Value::Object(object) => object,
            _ => unreachable!(),
        };

        // has_more wins over next_page.
        assert!(!has_more_results(&object(r#"{"has_more": false, "next_page": "x"}"#), 1, 2, 2));
        // next_page present but null.
        assert!(!has_more_results(&object(r#"{"next_page": null, "count": 100}"#), 1, 2, 2));
        // count decides without next_page.
        assert!(has_more_results(&object(r#"{"count": 5}"#), 2, 2, 2));
        assert!(!has_more_results(&object(r#"{"count": 4}"#), 2, 2, 2));
        // Full page fallback.
        assert!(has_more_results(&object("{}"), 1, 2, 2));
        assert!(!has_more_results(&object("{}"), 1, 2, 1));
    }

    #[tokio::test]
    async fn test_failed_page_can_be_retried_and_reset() {
        let transport = ScriptedTransport::new();
        transport
            .respond("items.json", 200, r#"{"items": [{"id": "A"}], "count": 2}"#)
            .respond("items.json", 500, "boom")
            .respond("items.json", 200, r#"{"items": [{"id": "B"}], "count": 2}"#);
        let client = test_client(&transport, 0);

        let mut pager: OffsetPager<Item> =
            OffsetPager::new(client, Request::get("items.json"), "items").per_page(1);

        assert_eq!(ids(&pager.get_page().await.unwrap()), ["A"]);
        assert!(pager.get_page().await.is_err());
        assert_eq!(pager.current_page(), Some(2));
        assert_eq!(ids(&pager.get_page().await.unwrap()), ["B"]);
        assert!(pager.is_exhausted());

        pager.reset();
        assert_eq!(pager.current_page(), Some(1));
    }

    #[tokio::test]
    async fn test_result_cap_ends_search_paging() {
        let transport = ScriptedTransport::new();
        transport
            .respond("search.json", 200, r#"{"items": [{"id": "A"}], "next_page": "p2"}"#)
            .respond("search.json", 422, r#"{"error": "invalid page"}"#);
        let client = test_client(&transport, 0);

        let mut pager: OffsetPager<Item> =
            OffsetPager::new(client, Request::get("search.json"), "items").stop_at_result_cap();

        let all = pager.collect_all().await.unwrap();
        assert_eq!(ids(&all), ["A"]);
        assert!(pager.is_exhausted());
    }

    #[tokio::test]
    async fn test_offset_stream_stops_at_limit() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "items.json",
            200,
            r#"{"items": [{"id": "A"}, {"id": "B"}], "next_page": "more"}"#,
        );
        let client = test_client(&transport, 0);

        let items: Vec<Item> = OffsetPager::new(client, Request::get("items.json"), "items")
            .per_page(2)
            .into_stream(Some(3))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(transport.count("items.json"), 2);
    }

    #[tokio::test]
    async fn test_cursor_walk_until_null() {
        let transport = ScriptedTransport::new();
        transport
            .respond(
                "export.json",
                200,
                r#"{"results": [{"id": "A"}], "meta": {"has_more": true, "after_cursor": "t1"}}"#,
            )
            .respond(
                "export.json",
                200,
                r#"{"results": [{"id": "B"}], "meta": {"has_more": true, "after_cursor": "t2"}}"#,
            )
            .respond(
                "export.json",
                200,
                r#"{"results": [{"id": "C"}], "meta": {"has_more": false, "after_cursor": null}}"#,
            );
        let client = test_client(&transport, 0);

        let items: Vec<Item> = CursorPager::new(client, Request::get("export.json"), "results")
            .page_size(1)
            .into_stream(None)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(ids(&items), ["A", "B", "C"]);
        let cursors: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| query_of(r, "page[after]"))
            .collect();
        assert_eq!(cursors, [None, Some("t1".to_string()), Some("t2".to_string())]);
    }

    #[tokio::test]
    async fn test_cursor_stream_respects_limit() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "export.json",
            200,
            r#"{"results": [{"id": "A"}, {"id": "B"}], "meta": {"has_more": true, "after_cursor": "t1"}}"#,
        );
        let client = test_client(&transport, 0);

        let items: Vec<Item> = CursorPager::new(client, Request::get("export.json"), "results")
            .into_stream(Some(2))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(transport.count("export.json"), 1);
    }

    #[tokio::test]
    async fn test_repeated_cursor_is_terminal() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "export.json",
            200,
            r#"{"results": [{"id": "A"}], "meta": {"has_more": true, "after_cursor": "same"}}"#,
        );
        let client = test_client(&transport, 0);
        let pager: CursorPager<Item> =
            CursorPager::new(client, Request::get("export.json"), "results");

        let batch = pager.next_batch(Some("same")).await.unwrap();
        assert_eq!(batch.next_cursor, None);
    }

    #[tokio::test]
    async fn test_stream_surfaces_page_error_after_earlier_items() {
        let transport = ScriptedTransport::new();
        transport
            .respond("items.json", 200, r#"{"items": [{"id": "A"}], "has_more": true}"#)
            .respond("items.json", 403, "forbidden");
        let client = test_client(&transport, 0);

        let results: Vec<Result<Item>> =
            OffsetPager::new(client, Request::get("items.json"), "items")
                .into_stream(None)
                .collect()
                .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Auth { .. })));
    }
}
