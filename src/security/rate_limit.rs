//! Rate-limit gate applied to every non-exempt route.
//!
//! # Responsibilities
//! - Build the limiter key from the route namespace and the client identity
//! - Admit or refuse the request before any handler work, cache hits included
//! - Report the standard `X-RateLimit-*` headers on admitted responses
//!
//! # Design Decisions
//! - [`RateLimitGate::intercept`] works on plain `http` types so it can be
//!   exercised without a server; the axum adapter only moves extensions
//! - Limit and window are per-process settings, not per-client
//! - Counter store failures fail open: the request proceeds without headers

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::RateLimitConfig;
use crate::http::error::AppError;
use crate::observability::metrics;
use crate::security::client_identity::{resolve_client_id, PeerAddr};
use crate::security::limiter::{Acquire, MovingWindowLimiter};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Route template of the matched handler, e.g. `/api/v1/operators/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate(pub String);

/// The caller exhausted its allowance for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit exceeded: {limit} requests per {window_secs}s, retry in {reset_in}s")]
pub struct RateLimitExceeded {
    pub limit: u64,
    pub window_secs: u64,
    pub reset_in: u64,
}

impl RateLimitExceeded {
    /// Headers carried by the 429 response.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset_in));
        headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(self.reset_in));
        headers
    }
}

/// Seconds until the current window boundary, in `1..=window_secs`.
pub fn reset_in(now_secs: u64, window_secs: u64) -> u64 {
    let window = window_secs.max(1);
    window - (now_secs % window)
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Collapse a request path into a limiter namespace.
///
/// Query strings and path parameters (`{id}`, `:id`) are dropped and the
/// remaining segments are joined with `_`: `/api/v1/operators?page=2`
/// becomes `api_v1_operators`.
pub fn namespace_for(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !(s.starts_with('{') || s.starts_with(':')))
        .collect();

    if segments.is_empty() {
        "root".to_string()
    } else {
        segments.join("_")
    }
}

/// Request-level rate-limit policy.
pub struct RateLimitGate {
    limiter: MovingWindowLimiter,
    limit: u64,
    window_secs: u64,
    exempt: HashSet<String>,
}

impl RateLimitGate {
    pub fn new(limiter: MovingWindowLimiter, limit: u64, window_secs: u64, exempt: impl IntoIterator<Item = String>) -> Self {
        Self {
            limiter,
            limit,
            window_secs: window_secs.max(1),
            exempt: exempt.into_iter().map(|p| normalize_exempt(&p)).collect(),
        }
    }

    pub fn from_config(limiter: MovingWindowLimiter, config: &RateLimitConfig) -> Self {
        Self::new(
            limiter,
            config.limit,
            config.window_secs,
            config.exempt_paths.iter().cloned(),
        )
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.contains(&normalize_exempt(path))
    }

    /// Gate `request`, running `next` only when it is admitted.
    ///
    /// On refusal nothing downstream runs and the caller receives
    /// [`RateLimitExceeded`] to translate into a 429.
    pub async fn intercept<ReqB, ResB, F, Fut>(
        &self,
        request: axum::http::Request<ReqB>,
        next: F,
    ) -> Result<axum::http::Response<ResB>, RateLimitExceeded>
    where
        F: FnOnce(axum::http::Request<ReqB>) -> Fut,
        Fut: Future<Output = axum::http::Response<ResB>>,
    {
        let path = request.uri().path().to_string();
        if self.is_exempt(&path) {
            return Ok(next(request).await);
        }

        let peer = request.extensions().get::<PeerAddr>().map(|p| p.0);
        let client_id = resolve_client_id(request.headers(), peer);
        let namespace = match request.extensions().get::<RouteTemplate>() {
            Some(template) => namespace_for(&template.0),
            None => namespace_for(&path),
        };
        let key = format!("{}:{}", namespace, client_id);

        let acquired = match self.limiter.try_acquire(&key, self.limit, self.window_secs).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Rate limiter unavailable, admitting request");
                metrics::record_rate_limit_error();
                return Ok(next(request).await);
            }
        };

        let count = match acquired {
            Acquire::Allowed { count } => count,
            Acquire::Denied { .. } => {
                let exceeded = RateLimitExceeded {
                    limit: self.limit,
                    window_secs: self.window_secs,
                    reset_in: reset_in(unix_now_secs(), self.window_secs),
                };
                tracing::info!(
                    client = %client_id,
                    namespace = %namespace,
                    reset_in = exceeded.reset_in,
                    "Rate limit exceeded"
                );
                metrics::record_rate_limited(&namespace);
                return Err(exceeded);
            }
        };

        let mut response = next(request).await;

        let current = self
            .limiter
            .current_count(&key, self.window_secs)
            .await
            .unwrap_or(count);
        let remaining = self.limit.saturating_sub(current);
        let headers = response.headers_mut();
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
        headers.insert(
            X_RATELIMIT_RESET,
            HeaderValue::from(reset_in(unix_now_secs(), self.window_secs)),
        );

        Ok(response)
    }
}

fn normalize_exempt(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Axum adapter for [`RateLimitGate::intercept`].
pub async fn rate_limit_middleware(
    State(gate): State<Arc<RateLimitGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>().cloned() {
        request.extensions_mut().insert(PeerAddr(addr));
    }
    if let Some(matched) = request.extensions().get::<MatchedPath>().cloned() {
        request
            .extensions_mut()
            .insert(RouteTemplate(matched.as_str().to_string()));
    }

    match gate.intercept(request, |req| next.run(req)).await {
        Ok(response) => response,
        Err(exceeded) => AppError::RateLimited(exceeded).into_response(),
    }
}
