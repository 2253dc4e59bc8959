//! Integration tests using wiremock to simulate the ticketing API.

use deskwire::cache::CacheConfig;
use deskwire::models::{NewOrganization, SearchQuery, TicketStatus};
use deskwire::rate_limit::RateLimitConfig;
use deskwire::{Client, Error, Request, RetryStrategy};
use futures::TryStreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(format!("{}/api/v2", server.uri()))
        .unwrap()
        .retry_strategy(RetryStrategy::Linear {
            delay: Duration::from_millis(20),
            max_retries: 3,
        })
        .build()
        .unwrap()
}

fn ticket_json(id: u64, requester_id: u64, assignee_id: Option<u64>) -> serde_json::Value {
    json!({
        "id": id,
        "subject": format!("Ticket {}", id),
        "status": "open",
        "requester_id": requester_id,
        "assignee_id": assignee_id,
    })
}

#[tokio::test]
async fn test_get_ticket_with_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/35436.json"))
        .and(header(
            "authorization",
            "Basic YWdlbnRAYWNtZS50ZXN0L3Rva2VuOnNlY3JldA==",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ticket": ticket_json(35436, 1, None) })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/api/v2/", mock_server.uri()))
        .unwrap()
        .basic_auth("agent@acme.test/token", "secret")
        .build()
        .unwrap();

    let ticket = client.tickets().get(35436).await.unwrap();
    assert_eq!(ticket.subject.as_deref(), Some("Ticket 35436"));
    assert_eq!(ticket.status, Some(TicketStatus::Open));

    // Second read is served by the ticket cache.
    client.tickets().get(35436).await.unwrap();
    assert_eq!(client.cache_stats().tickets.hits, 1);
}

#[tokio::test]
async fn test_retry_on_server_errors() {
    let mock_server = MockServer::start().await;

    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First two requests fail with 503, third succeeds
    Mock::given(method("GET"))
        .and(path("/api/v2/users/7.json"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                ResponseTemplate::new(503).set_body_string("Service unavailable")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 7, "name": "Ada"}}))
            }
        })
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .execute(&Request::get("users/7.json"))
        .await
        .unwrap();

    assert_eq!(response.attempts, 3);
    assert!(response.was_retried());
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after() {
    let mock_server = MockServer::start().await;

    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets.json"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "1")
                    .insert_header("x-ratelimit-remaining", "0")
                    .set_body_string("Rate limited")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"tickets": [], "next_page": null}))
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let start = Instant::now();
    let tickets = client.tickets().list().collect_all().await.unwrap();

    assert!(tickets.is_empty());
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/1.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "RecordNotFound"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.tickets().get(1).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_create_organization_is_retried_on_server_error() {
    let mock_server = MockServer::start().await;

    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // The first POST fails with 503, the resend succeeds
    Mock::given(method("POST"))
        .and(path("/api/v2/organizations.json"))
        .and(body_json(json!({"organization": {"name": "Acme", "domain_names": ["acme.test"]}})))
        .respond_with(move |_req: &wiremock::Request| {
            if attempt_count_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(503).set_body_string("busy")
            } else {
                ResponseTemplate::new(201).set_body_json(json!({
                    "organization": {"id": 90, "name": "Acme", "domain_names": ["acme.test"]}
                }))
            }
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let organization = client
        .organizations()
        .create(&NewOrganization::new("Acme").with_domain("acme.test"))
        .await
        .unwrap();

    assert_eq!(organization.id, 90);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_offset_pagination_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets.json"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tickets": [ticket_json(1, 10, None), ticket_json(2, 10, None)],
            "next_page": "page-2",
            "count": 3
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets.json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tickets": [ticket_json(3, 10, None)],
            "next_page": null,
            "count": 3
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut pager = client.tickets().list().per_page(2);
    let tickets = pager.collect_all().await.unwrap();

    assert_eq!(tickets.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 2, 3]);
    assert!(pager.get_page().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_search_follows_cursors() {
    let mock_server = MockServer::start().await;

    for (after, next, id) in [(None, Some("t1"), 1), (Some("t1"), Some("t2"), 2), (Some("t2"), None, 3)] {
        let mut mock = Mock::given(method("GET"))
            .and(path("/api/v2/search/export.json"))
            .and(query_param("filter[type]", "ticket"))
            .and(query_param("query", "status:open"));
        if let Some(after) = after {
            mock = mock.and(query_param("page[after]", after));
        }
        mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [ticket_json(id, 10, None)],
            "meta": {"has_more": next.is_some(), "after_cursor": next}
        })))
        // Cursor requests are more specific than the first one.
        .with_priority(if after.is_some() { 1 } else { 5 })
        .expect(1)
        .mount(&mock_server)
        .await;
    }

    let client = client_for(&mock_server);
    let tickets: Vec<_> = client
        .search()
        .export_tickets(SearchQuery::new().status(TicketStatus::Open), None)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(tickets.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 2, 3]);
}

#[tokio::test]
async fn test_search_stops_at_result_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/search.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"result_type": "ticket", "id": 1, "requester_id": 2}],
            "next_page": "page-2"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/search.json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "invalid",
            "description": "Page beyond the search result limit"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tickets: Vec<_> = client
        .search()
        .tickets("printer", None)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(tickets.len(), 1);
}

#[tokio::test]
async fn test_enrichment_batches_user_lookups() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/5.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ticket": ticket_json(5, 1, Some(2))})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/5/comments.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": [
                {"id": 50, "author_id": 1, "body": "It is broken"},
                {"id": 51, "author_id": 3, "body": "Looking into it", "public": false}
            ],
            "next_page": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users/show_many.json"))
        .and(query_param("ids", "1,2,3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"id": 1, "name": "Requester"},
                {"id": 2, "name": "Assignee", "role": "agent"},
                {"id": 3, "name": "Lead", "role": "admin"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let enriched = client.tickets().get_enriched(5).await.unwrap();

    assert_eq!(enriched.requester.name, "Requester");
    assert_eq!(enriched.assignee.as_ref().map(|u| u.name.as_str()), Some("Assignee"));
    assert_eq!(enriched.users.len(), 3);
    assert!(!enriched.comments[1].public);

    // Users were seeded into the cache by the batch.
    let lead = client.users().get(3).await.unwrap();
    assert!(lead.is_staff());
}

#[tokio::test]
async fn test_concurrent_misses_share_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users/9.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": {"id": 9, "name": "Grace"}}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let users = client.users();
    let (a, b, c) = tokio::join!(users.get(9), users.get(9), users.get(9));

    assert_eq!(a.unwrap().name, "Grace");
    assert_eq!(b.unwrap(), c.unwrap());

    let stats = client.cache_stats().users;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/help_center/articles/4.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"article": {"id": 4, "title": "FAQ"}})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/api/v2/", mock_server.uri()))
        .unwrap()
        .cache_config(CacheConfig::disabled())
        .rate_limit_config(RateLimitConfig::disabled())
        .build()
        .unwrap();

    client.help_center().get_article(4).await.unwrap();
    client.help_center().get_article(4).await.unwrap();

    assert_eq!(client.cache_stats().articles.size, 0);
}

#[tokio::test]
async fn test_server_rate_limit_headers_throttle_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tickets/count.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "3")
                .set_body_json(json!({"count": {"value": 12}})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .execute(&Request::get("tickets/count.json"))
        .await
        .unwrap();

    // Refill since the response is well under one token.
    assert!(client.rate_limiter().available() < 4.0);
}
