use super::{fetch_record, list};
use crate::{models::User, pagination::OffsetPager, Client, Error, Request, Result};
use futures::future::try_join_all;
use std::collections::HashMap;

/// Largest number of ids one `show_many` request accepts.
pub const SHOW_MANY_LIMIT: usize = 100;

/// User endpoints.
#[derive(Clone)]
pub struct UsersApi {
    client: Client,
}

impl UsersApi {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a user through the user cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for unknown ids.
    pub async fn get(&self, id: u64) -> Result<User> {
        let client = self.client.clone();
        self.client
            .caches()
            .users
            .get_or_fetch(id, move || async move {
                fetch_record(&client, Request::get(format!("users/{}.json", id))).await
            })
            .await
    }

    /// Fetches several users with as few requests as possible.
    ///
    /// Cached users are served from memory and users another lookup is
    /// already fetching are waited for. The rest are sent in `show_many`
    /// batches of at most 100, concurrently, and stored in the user cache.
    /// Unknown ids are simply missing from the result.
    pub async fn get_many(&self, ids: &[u64]) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for (id, result) in self.resolve(ids.iter().copied()).await {
            match result {
                Ok(user) => users.push(user),
                Err(Error::NotFound { .. }) => {
                    tracing::debug!(user_id = id, "User not returned by show_many")
                }
                Err(error) => return Err(error),
            }
        }
        users.sort_unstable_by_key(|user| user.id);
        Ok(users)
    }

    /// Looks up every id through the user cache, batching the misses.
    pub(crate) async fn resolve(
        &self,
        ids: impl IntoIterator<Item = u64>,
    ) -> HashMap<u64, Result<User>> {
        let client = self.client.clone();
        self.client
            .caches()
            .users
            .get_or_fetch_many(
                ids,
                move |missing| show_many(client, missing),
                |id| Error::not_found(format!("users/{}", id)),
            )
            .await
    }

    /// Lists every user.
    pub fn list(&self) -> OffsetPager<User> {
        list(&self.client, Request::get("users.json"))
    }

    /// Finds the user with exactly this email address.
    pub async fn by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self
            .client
            .execute(&Request::get("users/search.json").with_query_param("query", email))
            .await?
            .collection("users")?;

        Ok(users.into_iter().find(|user| {
            user.email
                .as_deref()
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
        }))
    }

    /// Searches users by name, email or other query syntax.
    pub fn search(&self, query: impl Into<String>) -> OffsetPager<User> {
        list(
            &self.client,
            Request::get("users/search.json").with_query_param("query", query),
        )
    }
}

async fn show_many(client: Client, mut ids: Vec<u64>) -> Result<HashMap<u64, User>> {
    ids.sort_unstable();
    let batches = ids.chunks(SHOW_MANY_LIMIT).map(|chunk| {
        let ids = chunk
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = Request::get("users/show_many.json").with_query_param("ids", ids);
        let client = &client;
        async move { client.execute(&request).await?.collection::<User>("users") }
    });

    let users: HashMap<u64, User> = try_join_all(batches)
        .await?
        .into_iter()
        .flatten()
        .map(|user| (user.id, user))
        .collect();

    tracing::debug!(requested = ids.len(), found = users.len(), "Fetched users in bulk");
    Ok(users)
}
