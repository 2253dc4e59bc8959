//! Prints a digest of recently updated open tickets.
//!
//! This example shows how to:
//! - Load credentials from the environment
//! - Stream search results with a limit
//! - Enrich each ticket with its comments and users
//! - Inspect cache statistics
//!
//! Run with: `ZENDESK_SUBDOMAIN=... ZENDESK_EMAIL=... ZENDESK_TOKEN=... cargo run --example ticket_digest`

use deskwire::models::{SearchQuery, TicketStatus};
use deskwire::{Client, Config};
use futures::TryStreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("deskwire=info")
        .init();

    let client = Client::from_config(&Config::from_env()?)?;

    let query = SearchQuery::new()
        .status(TicketStatus::Open)
        .status(TicketStatus::Pending)
        .updated_after("2024-01-01");

    let mut tickets = client.tickets().search_enriched(query, Some(10));
    while let Some(item) = tickets.try_next().await? {
        println!(
            "#{} [{}] {}",
            item.ticket.id,
            item.ticket.status.map(|s| s.to_string()).unwrap_or_default(),
            item.ticket.subject.as_deref().unwrap_or("(no subject)")
        );
        println!("  requester: {}", item.requester.name);
        if let Some(assignee) = &item.assignee {
            println!("  assignee:  {}", assignee.name);
        }
        for comment in &item.comments {
            let author = item
                .author_of(comment)
                .map(|user| user.name.as_str())
                .unwrap_or("unknown");
            let visibility = if comment.public { "public" } else { "internal" };
            println!("  - {} ({}): {}", author, visibility, comment.body.lines().next().unwrap_or(""));
        }
    }

    let stats = client.cache_stats();
    println!(
        "\nuser cache: {} hits, {} misses, {:.0}% hit rate",
        stats.users.hits,
        stats.users.misses,
        stats.users.hit_rate() * 100.0
    );

    client.shutdown();
    Ok(())
}
