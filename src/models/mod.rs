//! Typed records of the ticketing API.
//!
//! Responses are decoded into these types at the boundary; nothing downstream
//! works on untyped JSON. Only the fields the client and its callers commonly
//! need are modelled, everything defaults when absent.

mod comment;
mod help_center;
mod organization;
mod search;
mod ticket;
mod user;

pub use comment::*;
pub use help_center::*;
pub use organization::*;
pub use search::*;
pub use ticket::*;
pub use user::*;

use serde::de::DeserializeOwned;

/// A record the API addresses by a numeric id.
///
/// `KIND` is the key of a single record in a response envelope
/// (`{"ticket": {...}}`), `COLLECTION` the key of a list (`{"tickets": [...]}`).
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Envelope key of a single record.
    const KIND: &'static str;

    /// Envelope key of a list of records.
    const COLLECTION: &'static str;

    /// The record's id.
    fn id(&self) -> u64;
}

macro_rules! impl_resource {
    ($ty:ty, $kind:literal, $collection:literal) => {
        impl Resource for $ty {
            const KIND: &'static str = $kind;
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> u64 {
                self.id
            }
        }
    };
}

impl_resource!(User, "user", "users");
impl_resource!(Organization, "organization", "organizations");
impl_resource!(Ticket, "ticket", "tickets");
impl_resource!(Comment, "comment", "comments");
impl_resource!(Category, "category", "categories");
impl_resource!(Section, "section", "sections");
impl_resource!(Article, "article", "articles");
