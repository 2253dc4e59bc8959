//! Tickets joined with their comments and every user they mention.
//!
//! Enriching a ticket costs one request per comment page plus the requests
//! needed for users not already cached: a single missing user is fetched
//! directly, several are fetched in `show_many` batches of up to 100. Users
//! that a concurrent enrichment is already fetching are waited for, not
//! requested again.

use crate::{
    api::TicketsApi,
    models::{Comment, SearchQuery, Ticket, User},
    Client, Error, Result,
};
use futures::future::try_join_all;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::collections::{BTreeSet, HashMap};

/// A ticket with its full comment thread and resolved users.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTicket {
    pub ticket: Ticket,

    /// Every comment, oldest first.
    pub comments: Vec<Comment>,

    pub requester: User,

    pub assignee: Option<User>,

    /// Requester, assignee and every comment author, by id.
    pub users: HashMap<u64, User>,
}

impl EnrichedTicket {
    /// A user mentioned by the ticket.
    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    /// The author of one of this ticket's comments.
    pub fn author_of(&self, comment: &Comment) -> Option<&User> {
        self.user(comment.author_id)
    }
}

impl TicketsApi {
    /// Fetches a ticket (through the ticket cache) and enriches it.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any constituent request fails; there is no partial
    /// result.
    pub async fn get_enriched(&self, ticket_id: u64) -> Result<EnrichedTicket> {
        let ticket = self.get(ticket_id).await?;
        self.enrich(ticket).await
    }

    /// Enriches a ticket that is already at hand.
    pub async fn enrich(&self, ticket: Ticket) -> Result<EnrichedTicket> {
        let comments = self.comments(ticket.id).collect_all().await?;
        let users = resolve_users(&self.client, mentioned_users(&ticket, &comments)).await?;
        assemble(ticket, comments, &users)
    }

    /// Enriches several tickets at once.
    ///
    /// Comment threads are fetched concurrently, then the users of all the
    /// tickets are resolved together, so a user shared by many tickets costs
    /// at most one lookup. Each result only holds the users its own ticket
    /// mentions.
    pub async fn enrich_all(&self, tickets: Vec<Ticket>) -> Result<Vec<EnrichedTicket>> {
        let threads = try_join_all(tickets.iter().map(|ticket| {
            let mut pager = self.comments(ticket.id);
            async move { pager.collect_all().await }
        }))
        .await?;

        let ids: BTreeSet<u64> = tickets
            .iter()
            .zip(&threads)
            .flat_map(|(ticket, comments)| mentioned_users(ticket, comments))
            .collect();
        let users = resolve_users(&self.client, ids).await?;

        tickets
            .into_iter()
            .zip(threads)
            .map(|(ticket, comments)| assemble(ticket, comments, &users))
            .collect()
    }

    /// Every ticket requested by a user, enriched.
    pub async fn for_user_enriched(&self, user_id: u64) -> Result<Vec<EnrichedTicket>> {
        let tickets = self.for_user(user_id).collect_all().await?;
        self.enrich_all(tickets).await
    }

    /// Every ticket of an organization, enriched.
    pub async fn for_organization_enriched(&self, organization_id: u64) -> Result<Vec<EnrichedTicket>> {
        let tickets = self.for_organization(organization_id).collect_all().await?;
        self.enrich_all(tickets).await
    }

    /// Searches tickets and enriches each one as it is pulled from the
    /// stream.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deskwire::{Client, models::{SearchQuery, TicketStatus}};
    /// use futures::TryStreamExt;
    ///
    /// # async fn example(client: Client) -> Result<(), deskwire::Error> {
    /// let query = SearchQuery::new().status(TicketStatus::Pending);
    /// let mut enriched = client.tickets().search_enriched(query, Some(10));
    /// while let Some(item) = enriched.try_next().await? {
    ///     println!("#{} from {}", item.ticket.id, item.requester.name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn search_enriched(
        &self,
        query: impl Into<SearchQuery>,
        limit: Option<usize>,
    ) -> BoxStream<'static, Result<EnrichedTicket>> {
        let api = self.clone();
        self.client
            .search()
            .tickets(query, limit)
            .and_then(move |ticket| {
                let api = api.clone();
                async move { api.enrich(ticket).await }
            })
            .boxed()
    }
}

fn mentioned_users(ticket: &Ticket, comments: &[Comment]) -> BTreeSet<u64> {
    std::iter::once(ticket.requester_id)
        .chain(ticket.assignee_id)
        .chain(comments.iter().map(|comment| comment.author_id))
        .collect()
}

/// Builds the enriched ticket from resolved users, keeping only the ones it
/// mentions.
fn assemble(ticket: Ticket, comments: Vec<Comment>, resolved: &HashMap<u64, User>) -> Result<EnrichedTicket> {
    let users = mentioned_users(&ticket, &comments)
        .into_iter()
        .map(|id| {
            resolved
                .get(&id)
                .cloned()
                .map(|user| (id, user))
                .ok_or_else(|| Error::not_found(format!("users/{}", id)))
        })
        .collect::<Result<HashMap<u64, User>>>()?;

    let requester = users
        .get(&ticket.requester_id)
        .cloned()
        .ok_or_else(|| Error::not_found(format!("users/{}", ticket.requester_id)))?;
    let assignee = ticket.assignee_id.and_then(|id| users.get(&id).cloned());

    tracing::debug!(
        ticket_id = ticket.id,
        comments = comments.len(),
        users = users.len(),
        "Enriched ticket"
    );

    Ok(EnrichedTicket {
        ticket,
        comments,
        requester,
        assignee,
        users,
    })
}

/// Resolves every id, from the user cache where possible.
async fn resolve_users(client: &Client, ids: BTreeSet<u64>) -> Result<HashMap<u64, User>> {
    let cache = &client.caches().users;
    let mut users = HashMap::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match cache.get(&id) {
            Some(user) => {
                users.insert(id, user);
            }
            None => missing.push(id),
        }
    }

    match missing.as_slice() {
        [] => {}
        [id] => {
            let user = client.users().get(*id).await?;
            users.insert(*id, user);
        }
        _ => {
            let mut resolved = client.users().resolve(missing.iter().copied()).await;
            for &id in &missing {
                let user = resolved
                    .remove(&id)
                    .unwrap_or_else(|| Err(Error::not_found(format!("users/{}", id))))?;
                users.insert(id, user);
            }
        }
    }

    Ok(users)
}
