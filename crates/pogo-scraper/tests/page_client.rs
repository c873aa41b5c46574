//! Integration tests for `PageClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pogo_scraper::{extract_friend_records, PageClient, PageFetcher, ScraperError};

fn test_client() -> PageClient {
    PageClient::new(5, "pogo-test/0.1").expect("failed to build test PageClient")
}

const LISTING: &str = r#"
<html><body>
  <div class="comment-bubble valor">
    <h3>Candela</h3><p>Level 50</p><strong>1234 5678 9012</strong>
    <div class="content"><a href="/city/paris">Paris</a></div>
  </div>
</body></html>
"#;

#[tokio::test]
async fn fetch_returns_body_on_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends/codes/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .mount(&server)
        .await;

    let url = format!("{}/friends/codes/", server.uri());
    let body = test_client().fetch(&url).await.expect("expected Ok body");

    let records = extract_friend_records(&body);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Candela");
    assert_eq!(records[0].location, "Paris");
}

#[tokio::test]
async fn fetch_sends_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "pogo-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_client().fetch(&server.uri()).await.unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn fetch_maps_429_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let result = test_client().fetch(&server.uri()).await;
    assert!(
        matches!(
            result,
            Err(ScraperError::RateLimited {
                retry_after_secs: 30,
                ..
            })
        ),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_client().fetch(&server.uri()).await;
    assert!(
        matches!(result, Err(ScraperError::NotFound { .. })),
        "expected NotFound, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_maps_500_to_unexpected_status_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client().fetch(&server.uri()).await;
    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_reports_connection_failure_as_http_error() {
    let result = test_client().fetch("http://127.0.0.1:1/").await;
    assert!(
        matches!(result, Err(ScraperError::Http(_))),
        "expected Http error, got: {result:?}"
    );
}
