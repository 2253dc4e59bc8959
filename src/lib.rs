//! # Deskwire - A resilient client for ticketing REST APIs
//!
//! Deskwire talks to Zendesk-style support APIs. Every call goes through one
//! request executor that waits for a client-side rate limiter, retries
//! transient failures with backoff (honouring `Retry-After`), and decodes
//! responses into typed records. On top of that it provides pull-based
//! pagination, per-resource caches with single-flight fetches, and ticket
//! enrichment.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deskwire::{Client, Config};
//! use deskwire::models::{SearchQuery, TicketStatus};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), deskwire::Error> {
//!     // ZENDESK_SUBDOMAIN, ZENDESK_EMAIL and ZENDESK_TOKEN
//!     let client = Client::from_config(&Config::from_env()?)?;
//!
//!     // Cached lookups
//!     let ticket = client.tickets().get(35436).await?;
//!     let requester = client.users().get(ticket.requester_id).await?;
//!     println!("#{} from {}", ticket.id, requester.name);
//!
//!     // Lazy search stream, stops requesting after 50 tickets
//!     let query = SearchQuery::new().status(TicketStatus::Open).tag("vip");
//!     let open: Vec<_> = client.search().tickets(query, Some(50)).try_collect().await?;
//!     println!("{} open VIP tickets", open.len());
//!
//!     println!("{:?}", client.cache_stats().users);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Retries with backoff** - Exponential, linear or custom delays; 429s wait for `Retry-After`
//! - **Rate limiting** - A token bucket shared by all clones of a client, fed by `X-RateLimit-*` headers
//! - **Pagination** - Offset pagers and cursor streams that never fetch past a limit
//! - **Caching** - TTL + LRU caches per resource kind, with concurrent misses coalesced into one fetch
//! - **Enrichment** - A ticket, all of its comments and every user involved, in as few requests as possible
//! - **Automatic logging** - Structured logging with `tracing` for observability
//! - **Pluggable transport** - `reqwest` by default, anything implementing [`Transport`] otherwise
//!
//! ## Error Handling
//!
//! Transient failures never reach the caller while retries remain. What does
//! reach the caller is one of a few terminal variants:
//!
//! ```no_run
//! use deskwire::{Client, Error};
//!
//! # async fn example(client: Client) -> Result<(), Error> {
//! match client.tickets().get_enriched(35436).await {
//!     Ok(enriched) => println!("{} comments", enriched.comments.len()),
//!     Err(Error::NotFound { path }) => eprintln!("missing: {}", path),
//!     Err(Error::RetriesExhausted { attempts, last_error }) => {
//!         eprintln!("gave up after {} attempts: {}", attempts, last_error);
//!     }
//!     Err(e) => eprintln!("failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Clients
//!
//! ```no_run
//! use deskwire::{Client, RetryStrategy};
//! use deskwire::cache::CacheConfig;
//! use deskwire::rate_limit::RateLimitConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), deskwire::Error> {
//! let client = Client::builder()
//!     .base_url("https://acme.zendesk.com/api/v2/")?
//!     .basic_auth("agent@acme.test/token", "api-token")
//!     .retry_strategy(RetryStrategy::ExponentialBackoff {
//!         initial_delay: Duration::from_millis(500),
//!         max_delay: Duration::from_secs(30),
//!         max_retries: 5,
//!         jitter: true,
//!     })
//!     .rate_limit_config(RateLimitConfig::builder().requests_per_minute(200).build())
//!     .cache_config(CacheConfig::disabled())
//!     .overall_timeout(Duration::from_secs(120))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod api;
pub mod cache;
mod client;
mod config;
mod enrichment;
mod error;
pub mod models;
pub mod pagination;
pub mod rate_limit;
mod request;
mod response;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::{HelpCenterApi, OrganizationsApi, SearchApi, TicketsApi, UsersApi};
pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use enrichment::EnrichedTicket;
pub use error::{Error, Result};
pub use request::Request;
pub use response::Response;
pub use retry::RetryStrategy;
pub use transport::Transport;
