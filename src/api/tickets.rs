use super::{fetch_record, list};
use crate::{
    models::{Comment, NewComment, Ticket, TicketUpdate},
    pagination::OffsetPager,
    Client, Request, Result,
};
use serde_json::json;

/// Ticket, comment and tag endpoints.
///
/// Every write drops the ticket's cache entry so the next
/// [`get`](TicketsApi::get) sees the server's state. Enrichment lives in
/// [`get_enriched`](TicketsApi::get_enriched) and friends.
#[derive(Clone)]
pub struct TicketsApi {
    pub(crate) client: Client,
}

impl TicketsApi {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a ticket through the ticket cache.
    pub async fn get(&self, id: u64) -> Result<Ticket> {
        let client = self.client.clone();
        self.client
            .caches()
            .tickets
            .get_or_fetch(id, move || async move {
                fetch_record(&client, Request::get(format!("tickets/{}.json", id))).await
            })
            .await
    }

    /// Lists every ticket.
    pub fn list(&self) -> OffsetPager<Ticket> {
        list(&self.client, Request::get("tickets.json"))
    }

    /// Tickets requested by a user.
    pub fn for_user(&self, user_id: u64) -> OffsetPager<Ticket> {
        list(
            &self.client,
            Request::get(format!("users/{}/tickets/requested.json", user_id)),
        )
    }

    /// Tickets of an organization.
    pub fn for_organization(&self, organization_id: u64) -> OffsetPager<Ticket> {
        list(
            &self.client,
            Request::get(format!("organizations/{}/tickets.json", organization_id)),
        )
    }

    /// The comments of a ticket, oldest first.
    pub fn comments(&self, ticket_id: u64) -> OffsetPager<Comment> {
        list(
            &self.client,
            Request::get(format!("tickets/{}/comments.json", ticket_id)),
        )
    }

    /// Adds a comment and returns the updated ticket.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::{Client, models::NewComment};
    ///
    /// # async fn example(client: Client) -> Result<(), deskwire::Error> {
    /// client
    ///     .tickets()
    ///     .add_comment(35436, NewComment::internal("Escalated to tier 2"))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_comment(&self, ticket_id: u64, comment: NewComment) -> Result<Ticket> {
        self.update(
            ticket_id,
            &TicketUpdate {
                comment: Some(comment),
                ..Default::default()
            },
        )
        .await
    }

    /// Applies a partial update and returns the updated ticket.
    pub async fn update(&self, ticket_id: u64, update: &TicketUpdate) -> Result<Ticket> {
        let request = Request::put(format!("tickets/{}.json", ticket_id))
            .with_json_body(&json!({ "ticket": update }))?;
        let result = fetch_record(&self.client, request).await;
        self.client.caches().tickets.invalidate(&ticket_id);
        result
    }

    /// Turns a public comment into an internal note. This cannot be undone.
    pub async fn make_private(&self, ticket_id: u64, comment_id: u64) -> Result<()> {
        let request = Request::put(format!(
            "tickets/{}/comments/{}/make_private.json",
            ticket_id, comment_id
        ));
        let result = self.client.execute(&request).await;
        self.client.caches().tickets.invalidate(&ticket_id);
        result?;
        tracing::info!(ticket_id, comment_id, "Made comment private");
        Ok(())
    }

    /// Permanently removes `text` from a comment and returns the redacted
    /// comment.
    pub async fn redact(&self, ticket_id: u64, comment_id: u64, text: &str) -> Result<Comment> {
        let request = Request::put(format!(
            "tickets/{}/comments/{}/redact.json",
            ticket_id, comment_id
        ))
        .with_json_body(&json!({ "text": text }))?;
        let result = fetch_record(&self.client, request).await;
        self.client.caches().tickets.invalidate(&ticket_id);
        let redacted = result?;
        tracing::info!(ticket_id, comment_id, "Redacted comment");
        Ok(redacted)
    }

    /// The tags of a ticket.
    pub async fn tags(&self, ticket_id: u64) -> Result<Vec<String>> {
        self.client
            .execute(&Request::get(Self::tags_path(ticket_id)))
            .await?
            .collection("tags")
    }

    /// Adds tags, keeping existing ones. Returns the resulting tags.
    pub async fn add_tags(&self, ticket_id: u64, tags: &[&str]) -> Result<Vec<String>> {
        self.write_tags(Request::put(Self::tags_path(ticket_id)), ticket_id, tags)
            .await
    }

    /// Replaces all tags. Returns the resulting tags.
    pub async fn set_tags(&self, ticket_id: u64, tags: &[&str]) -> Result<Vec<String>> {
        self.write_tags(Request::post(Self::tags_path(ticket_id)), ticket_id, tags)
            .await
    }

    /// Removes tags. Returns the remaining tags.
    pub async fn remove_tags(&self, ticket_id: u64, tags: &[&str]) -> Result<Vec<String>> {
        self.write_tags(Request::delete(Self::tags_path(ticket_id)), ticket_id, tags)
            .await
    }

    async fn write_tags(&self, request: Request, ticket_id: u64, tags: &[&str]) -> Result<Vec<String>> {
        let request = request.with_json_body(&json!({ "tags": tags }))?;
        let result = self.client.execute(&request).await;
        self.client.caches().tickets.invalidate(&ticket_id);
        result?.collection("tags")
    }

    fn tags_path(ticket_id: u64) -> String {
        format!("tickets/{}/tags.json", ticket_id)
    }
}
