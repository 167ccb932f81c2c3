use super::*;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_retries: u32) -> FeedClient {
    FeedClient::new(
        base_url,
        5,
        "vinpris-test/0.1",
        max_retries,
        0,
        ProxyPool::from_urls(&[]),
    )
    .expect("client should build")
}

fn page_body(codes: &[&str]) -> serde_json::Value {
    let products: Vec<serde_json::Value> = codes
        .iter()
        .map(|code| {
            serde_json::json!({
                "code": code,
                "name": format!("Product {code}"),
                "price": { "value": 99.9 },
                "volume": { "value": 75.0 }
            })
        })
        .collect();
    serde_json::json!({ "productSearchResult": { "products": products } })
}

#[test]
fn search_url_embeds_page_number() {
    let client = test_client("https://feed.example.com/api", 0);
    assert_eq!(
        client.search_url(7),
        "https://feed.example.com/api/search?fields=FULL&searchType=product&currentPage=7&q=%3Arelevance"
    );
}

#[test]
fn search_url_strips_trailing_slash_from_base() {
    let client = test_client("https://feed.example.com/api/", 0);
    assert!(client
        .search_url(0)
        .starts_with("https://feed.example.com/api/search?"));
}

#[test]
fn extract_feed_origin_strips_api_path() {
    assert_eq!(
        extract_feed_origin("https://shop.example.com/api/v2"),
        "https://shop.example.com"
    );
}

#[test]
fn extract_feed_origin_bare_domain() {
    assert_eq!(
        extract_feed_origin("https://shop.example.com"),
        "https://shop.example.com"
    );
}

#[test]
fn extract_feed_origin_fallback_no_scheme() {
    assert_eq!(
        extract_feed_origin("shop.example.com/api"),
        "shop.example.com"
    );
}

#[tokio::test]
async fn fetch_page_returns_items_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("currentPage", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["101", "102"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let products = client.fetch_page(0).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].code.as_deref(), Some("101"));
}

#[tokio::test]
async fn fetch_page_empty_list_signals_end_of_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let products = client.fetch_page(3).await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn fetch_page_missing_result_object_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let products = client.fetch_page(0).await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn fetch_page_retries_rate_limited_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["7"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let products = client.fetch_page(0).await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn fetch_page_retries_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["8"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let products = client.fetch_page(0).await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn fetch_page_rate_limited_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        // max_retries=1 → 2 total attempts
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client.fetch_page(0).await.unwrap_err();
    assert!(matches!(err, ScraperError::RateLimited { retry_after_secs: 0 }));
}

#[tokio::test]
async fn fetch_page_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client.fetch_page(0).await.unwrap_err();
    assert!(matches!(err, ScraperError::NotFound { .. }));
}

#[tokio::test]
async fn fetch_page_unexpected_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client.fetch_page(0).await.unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 403, .. }
    ));
}

#[tokio::test]
async fn fetch_page_malformed_body_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client.fetch_page(0).await.unwrap_err();
    assert!(matches!(err, ScraperError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_page_rejects_pages_beyond_the_guard() {
    let client = test_client("https://feed.example.com", 0);
    let err = client.fetch_page(MAX_PAGES).await.unwrap_err();
    assert!(matches!(err, ScraperError::PaginationLimit { .. }));
}
