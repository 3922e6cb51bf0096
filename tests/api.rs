//! End-to-end behavior of the search API, driven through the router.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;

use search_api::catalog::{CatalogQuery, CatalogStore, Operator, StoreError};
use search_api::lifecycle::startup::build_with_catalog;
use search_api::Shutdown;

mod common;

use common::{build_app, get, json, operator, test_config};

/// Catalog whose every read stalls past the request deadline.
struct StalledCatalog;

#[async_trait]
impl CatalogStore for StalledCatalog {
    async fn count(&self, _filter: Option<&str>) -> Result<u64, StoreError> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok(0)
    }

    async fn fetch(&self, _query: &CatalogQuery) -> Result<Vec<Operator>, StoreError> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_search_returns_envelope() {
    let (app, _shutdown) = build_app(
        &test_config(),
        vec![
            operator(1, "Saúde Total", "Santos"),
            operator(2, "Vida Plena", "Recife"),
            operator(3, "SAUDE MAIS", "Natal"),
        ],
    )
    .await;

    let (status, headers, body) = get(&app, "/api/v1/operators?search=saude&sortField=city", "1.1.1.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    assert!(headers.contains_key("x-request-id"));

    let body = json(&body);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["search"], "saude");
    assert_eq!(body["sortField"], "city");
    assert_eq!(body["sortDirection"], "asc");
    let cities: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["city"].as_str().unwrap())
        .collect();
    assert_eq!(cities, vec!["Natal", "Santos"]);
}

#[tokio::test]
async fn test_snake_case_and_query_aliases() {
    let (app, _shutdown) = build_app(
        &test_config(),
        (1..=5).map(|i| operator(i, "Alfa", "Recife")).collect(),
    )
    .await;

    let (status, _, body) = get(&app, "/api/v1/operators?query=alfa&page_size=2&page=2", "1.1.1.1").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["data"][0]["id"], 3);
}

#[tokio::test]
async fn test_last_page_holds_remainder() {
    let (app, _shutdown) = build_app(
        &test_config(),
        (1..=25).map(|i| operator(i, &format!("Operadora {i}"), "Santos")).collect(),
    )
    .await;

    let (status, _, body) = get(&app, "/api/v1/operators?page=3&pageSize=10", "1.1.1.1").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalItems"], 25);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_invalid_parameters_reported_together() {
    let (app, _shutdown) = build_app(&test_config(), vec![operator(1, "Alfa", "Recife")]).await;

    let (status, _, body) = get(
        &app,
        "/api/v1/operators?page=0&pageSize=500&sortField=password&sortDirection=sideways",
        "1.1.1.1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json(&body);
    assert_eq!(body["status"], 400);
    assert_eq!(body["type"], "/invalid-parameter");
    let names: Vec<_> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["page", "pageSize", "sortField", "sortDirection"]);
}

#[tokio::test]
async fn test_short_search_rejected() {
    let (app, _shutdown) = build_app(&test_config(), vec![operator(1, "Alfa", "Recife")]).await;
    let (status, _, body) = get(&app, "/api/v1/operators?search=a", "1.1.1.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["violations"][0]["name"], "search");
}

#[tokio::test]
async fn test_repeat_request_is_cache_hit() {
    let (app, _shutdown) = build_app(&test_config(), vec![operator(1, "Alfa", "Recife")]).await;

    let (_, first_headers, first) = get(&app, "/api/v1/operators?search=alfa&page=1", "1.1.1.1").await;
    assert_eq!(first_headers["x-cache"], "MISS");

    // Same criteria, different parameter order.
    let (_, second_headers, second) = get(&app, "/api/v1/operators?page=1&search=alfa", "1.1.1.1").await;
    assert_eq!(second_headers["x-cache"], "HIT");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rate_limit_counts_down_then_refuses() {
    let mut config = test_config();
    config.rate_limit.limit = 10;
    config.rate_limit.window_secs = 10;
    let (app, _shutdown) = build_app(&config, vec![operator(1, "Alfa", "Recife")]).await;

    for expected in (0..10).rev() {
        let (status, headers, _) = get(&app, "/api/v1/operators?search=alfa", "9.9.9.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["x-ratelimit-limit"], "10");
        assert_eq!(headers["x-ratelimit-remaining"], expected.to_string().as_str());
        let reset: u64 = headers["x-ratelimit-reset"].to_str().unwrap().parse().unwrap();
        assert!((1..=10).contains(&reset));
    }

    let (status, headers, body) = get(&app, "/api/v1/operators?search=alfa", "9.9.9.9").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.contains_key("retry-after"));
    assert_eq!(json(&body)["type"], "/rate-limit-exceeded");

    // Another client is unaffected.
    let (status, _, _) = get(&app, "/api/v1/operators?search=alfa", "8.8.8.8").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_exempt() {
    let mut config = test_config();
    config.rate_limit.limit = 1;
    let (app, _shutdown) = build_app(&config, Vec::new()).await;

    for path in ["/health", "/api/v1/health", "/health", "/api/v1/health"] {
        let (status, headers, body) = get(&app, path, "7.7.7.7").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!headers.contains_key("x-ratelimit-limit"));
        assert_eq!(json(&body)["status"], "ok");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _shutdown) = build_app(&test_config(), Vec::new()).await;
    let (status, _, body) = get(&app, "/api/v1/nothing-here", "1.1.1.1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["type"], "/resource-not-found");
}

#[tokio::test]
async fn test_disabled_limiter_adds_no_headers() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    config.cache.enabled = false;
    let (app, _shutdown) = build_app(&config, vec![operator(1, "Alfa", "Recife")]).await;

    let (status, headers, _) = get(&app, "/api/v1/operators", "1.1.1.1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key("x-ratelimit-limit"));
    assert!(!headers.contains_key("x-cache"));
}

#[tokio::test]
async fn test_request_deadline_returns_error_body_with_rate_headers() {
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    config.timeouts.query_ms = 10_000;
    config.rate_limit.limit = 5;
    let shutdown = Shutdown::new();
    let app = build_with_catalog(&config, Arc::new(StalledCatalog), &shutdown)
        .await
        .unwrap();

    let (status, headers, body) = get(&app.router, "/api/v1/operators", "6.6.6.6").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers["x-ratelimit-limit"], "5");
    assert_eq!(headers["x-ratelimit-remaining"], "4");
    assert!(headers.contains_key("x-request-id"));

    let body = json(&body);
    assert_eq!(body["status"], 500);
    assert_eq!(body["type"], "/internal-error");
    assert!(body["title"].is_string());
    assert!(body["detail"].is_string());
    assert!(body["timestamp"].is_string());
}
