//! Typed endpoint groups built on the request executor.
//!
//! Each group is a cheap handle obtained from the [`Client`]
//! (`client.tickets()`, `client.users()`, ...). Paths are relative to the
//! client's base URL.

mod help_center;
mod organizations;
mod search;
mod tickets;
mod users;

pub use help_center::HelpCenterApi;
pub use organizations::OrganizationsApi;
pub use search::SearchApi;
pub use tickets::TicketsApi;
pub use users::UsersApi;

use crate::{models::Resource, pagination::OffsetPager, Client, Request, Result};

/// Executes `request` and decodes the single record in its envelope.
pub(crate) async fn fetch_record<T: Resource>(client: &Client, request: Request) -> Result<T> {
    client.execute(&request).await?.member(T::KIND)
}

/// An offset pager over the `T::COLLECTION` list at `path`.
pub(crate) fn list<T: Resource>(client: &Client, request: Request) -> OffsetPager<T> {
    OffsetPager::new(client.clone(), request, T::COLLECTION)
}
