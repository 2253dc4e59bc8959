use crate::{
    models::{Organization, SearchQuery, SearchResult, SearchType, Ticket, User},
    pagination::{CursorPager, OffsetPager},
    Client, Request, Result,
};
use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;

/// Unified search and export search.
///
/// The offset-paginated search endpoint caps its results; the export
/// endpoint walks cursors instead and has no cap, but only returns one record
/// kind per query.
///
/// # Examples
///
/// ```no_run
/// use deskwire::{Client, models::{SearchQuery, SearchType, TicketStatus}};
/// use futures::TryStreamExt;
///
/// # async fn example(client: Client) -> Result<(), deskwire::Error> {
/// let query = SearchQuery::new()
///     .status(TicketStatus::Open)
///     .tag("vip");
///
/// let mut tickets = client.search().tickets(query, Some(20));
/// while let Some(ticket) = tickets.try_next().await? {
///     println!("#{} {:?}", ticket.id, ticket.subject);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchApi {
    client: Client,
}

impl SearchApi {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Pages through mixed results. A 400/422 past the first page ends the
    /// paging.
    pub fn all(&self, query: impl Into<SearchQuery>) -> OffsetPager<SearchResult> {
        let query = query.into().to_string();
        OffsetPager::new(
            self.client.clone(),
            Request::get("search.json").with_query_param("query", query),
            "results",
        )
        .stop_at_result_cap()
    }

    /// Number of results the query matches.
    pub async fn count(&self, query: impl Into<SearchQuery>) -> Result<u64> {
        let request =
            Request::get("search/count.json").with_query_param("query", query.into().to_string());
        self.client.execute(&request).await?.member("count")
    }

    /// Tickets matching the query, up to `limit`.
    pub fn tickets(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<Ticket>> {
        self.typed(query.into(), SearchType::Ticket, limit, SearchResult::into_ticket)
    }

    /// Users matching the query, up to `limit`.
    pub fn users(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<User>> {
        self.typed(query.into(), SearchType::User, limit, SearchResult::into_user)
    }

    /// Organizations matching the query, up to `limit`.
    pub fn organizations(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<Organization>> {
        self.typed(
            query.into(),
            SearchType::Organization,
            limit,
            SearchResult::into_organization,
        )
    }

    /// All tickets matching the query through the export endpoint.
    pub fn export_tickets(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<Ticket>> {
        self.export(query.into(), SearchType::Ticket, limit)
    }

    /// All users matching the query through the export endpoint.
    pub fn export_users(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<User>> {
        self.export(query.into(), SearchType::User, limit)
    }

    /// All organizations matching the query through the export endpoint.
    pub fn export_organizations(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<Organization>> {
        self.export(query.into(), SearchType::Organization, limit)
    }

    fn typed<T>(
        &self,
        query: SearchQuery,
        kind: SearchType,
        limit: Option<usize>,
        extract: fn(SearchResult) -> Option<T>,
    ) -> BoxStream<'static, Result<T>>
    where
        T: Send + 'static,
    {
        let results = OffsetPager::<SearchResult>::new(
            self.client.clone(),
            Request::get("search.json").with_query_param("query", query.for_type(kind)),
            "results",
        )
        .stop_at_result_cap()
        .into_stream(None)
        .try_filter_map(move |result| future::ready(Ok(extract(result))));

        match limit {
            Some(limit) => results.take(limit).boxed(),
            None => results.boxed(),
        }
    }

    fn export<T>(
        &self,
        query: SearchQuery,
        kind: SearchType,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let terms = query.terms();
        let terms = if terms.is_empty() { "*".to_string() } else { terms };
        let request = Request::get("search/export.json")
            .with_query_param("query", terms)
            .with_query_param("filter[type]", kind.as_str());

        CursorPager::new(self.client.clone(), request, "results")
            .page_size(1000)
            .into_stream(limit)
    }
}
