//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, rate limit, request deadline)
//! - Bind server to listener and drain on shutdown
//!
//! Layer order, outermost first: request-id assignment, trace span,
//! request-id propagation, request metrics, then two route layers: the
//! rate-limit gate, so it sees the matched route template, and inside it
//! the request deadline, so a timed-out request still gets the error body
//! and its `X-RateLimit-*` headers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::error::AppError;
use crate::http::handlers::{health, not_found, search_operators};
use crate::observability::metrics;
use crate::search::{SearchLimits, SearchService};
use crate::security::{rate_limit_middleware, RateLimitGate};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub limits: SearchLimits,
}

/// Build the Axum router with all middleware layers.
///
/// `gate = None` disables rate limiting entirely.
pub fn build_router(state: AppState, gate: Option<Arc<RateLimitGate>>, request_timeout: Duration) -> Router {
    let mut routes = Router::new()
        .route("/api/v1/operators", get(search_operators))
        .route("/api/v1/health", get(health))
        .route("/health", get(health))
        .route_layer(middleware::from_fn_with_state(request_timeout, enforce_deadline));

    if let Some(gate) = gate {
        routes = routes.route_layer(middleware::from_fn_with_state(gate, rate_limit_middleware));
    }

    routes
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn enforce_deadline(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => AppError::Timeout(deadline).into_response(),
    }
}

async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(response.status().as_u16(), start);
    response
}

/// HTTP server for the search API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
