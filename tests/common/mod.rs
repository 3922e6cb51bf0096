//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use tokio::net::TcpListener;
use tower::ServiceExt;

use search_api::catalog::{MemoryCatalog, Operator};
use search_api::config::AppConfig;
use search_api::lifecycle::startup::build_with_catalog;
use search_api::{HttpServer, Shutdown};

/// Minimal operator row; text fields not given are fixed placeholders.
pub fn operator(id: u64, corporate_name: &str, city: &str) -> Operator {
    Operator {
        id,
        operator_registry: format!("{:06}", id),
        cnpj: format!("{:014}", id),
        corporate_name: corporate_name.to_string(),
        trade_name: None,
        modality: "Medicina de Grupo".into(),
        street: "Rua A".into(),
        number: "1".into(),
        complement: None,
        neighborhood: "Centro".into(),
        city: city.to_string(),
        state: "SP".into(),
        zip: "01000000".into(),
        area_code: None,
        phone: None,
        fax: None,
        email: format!("op{}@example.com", id),
        representative: "Rep".into(),
        representative_position: "Diretor".into(),
        sales_region: Some(1),
        registration_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
    }
}

/// Defaults with in-process backends and a generous rate limit.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.rate_limit.limit = 1_000;
    config
}

/// Wire a router over `operators`. The returned `Shutdown` stops the sweepers.
pub async fn build_app(config: &AppConfig, operators: Vec<Operator>) -> (Router, Shutdown) {
    let shutdown = Shutdown::new();
    let catalog = Arc::new(MemoryCatalog::new(operators).unwrap());
    let app = build_with_catalog(config, catalog, &shutdown).await.unwrap();
    (app.router, shutdown)
}

/// Drive one request through the router without a socket.
pub async fn get(router: &Router, uri: &str, client_ip: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder()
        .uri(uri)
        .header("x-real-ip", client_ip)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

pub fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

/// Serve `router` on an ephemeral port until `shutdown` fires.
pub async fn start_server(router: Router, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut stop = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = HttpServer::new(router)
            .run(listener, async move {
                let _ = stop.recv().await;
            })
            .await;
    });

    addr
}
