//! Error responses.
//!
//! Every non-2xx response this service produces carries the same JSON body:
//! `{ status, type, title, detail, userMessage?, timestamp, violations? }`.
//! Internal causes are logged and never returned to the caller.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::search::{SearchError, ValidationError, Violation};
use crate::security::RateLimitExceeded;

/// Problem body returned on every error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, title: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            kind,
            title,
            detail: detail.into(),
            user_message: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            violations: None,
        }
    }

    fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }
}

/// Errors surfaced by HTTP handlers and middleware.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    #[error(transparent)]
    Search(SearchError),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("request exceeded its {0:?} deadline")]
    Timeout(Duration),
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Validation(v) => AppError::Validation(v),
            other => AppError::Search(other),
        }
    }
}

const GENERIC_DETAIL: &str = "An unexpected error occurred while processing the request";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(e) => {
                let mut body = ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "/invalid-parameter",
                    "Invalid parameter",
                    e.to_string(),
                )
                .with_user_message("One or more request parameters are invalid");
                body.violations = Some(e.violations);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::RateLimited(exceeded) => {
                let body = ApiError::new(
                    StatusCode::TOO_MANY_REQUESTS,
                    "/rate-limit-exceeded",
                    "Rate limit exceeded",
                    format!(
                        "Limit of {} requests per {} seconds exceeded",
                        exceeded.limit, exceeded.window_secs
                    ),
                )
                .with_user_message(format!("Too many requests. Try again in {} seconds", exceeded.reset_in));
                (StatusCode::TOO_MANY_REQUESTS, exceeded.headers(), Json(body)).into_response()
            }
            AppError::Search(SearchError::PoolExhausted(waited)) => {
                tracing::warn!(waited = ?waited, "Catalog pool exhausted");
                let body = ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "/service-unavailable",
                    "Service unavailable",
                    "The service is temporarily overloaded",
                )
                .with_user_message("Please retry shortly");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [(header::RETRY_AFTER, HeaderValue::from_static("1"))],
                    Json(body),
                )
                    .into_response()
            }
            AppError::Search(e) => {
                tracing::error!(error = %e, "Search failed");
                let body = ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "/internal-error",
                    "Internal server error",
                    GENERIC_DETAIL,
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::Timeout(deadline) => {
                tracing::error!(deadline = ?deadline, "Request deadline exceeded");
                let body = ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "/internal-error",
                    "Internal server error",
                    GENERIC_DETAIL,
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::NotFound(path) => {
                let body = ApiError::new(
                    StatusCode::NOT_FOUND,
                    "/resource-not-found",
                    "Resource not found",
                    format!("No resource at {}", path),
                );
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StoreError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_lists_violations() {
        let err = ValidationError {
            violations: vec![
                Violation::new("page", "must be at least 1"),
                Violation::new("sortField", "must be one of: city"),
            ],
        };
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["type"], "/invalid-parameter");
        assert_eq!(body["violations"].as_array().unwrap().len(), 2);
        assert_eq!(body["violations"][1]["name"], "sortField");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_search_validation_maps_to_400() {
        let err = SearchError::Validation(ValidationError::single("sortField", "nope"));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limited_carries_headers() {
        let response = AppError::RateLimited(RateLimitExceeded {
            limit: 10,
            window_secs: 10,
            reset_in: 4,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "4");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        let body = body_json(response).await;
        assert_eq!(body["type"], "/rate-limit-exceeded");
        assert!(body.get("violations").is_none());
    }

    #[tokio::test]
    async fn test_upstream_detail_is_hidden() {
        let err = SearchError::Upstream(StoreError::Unavailable("db password wrong".into()));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["type"], "/internal-error");
        assert!(!body["detail"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_timeout_is_generic_internal_error() {
        let response = AppError::Timeout(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
        assert_eq!(body["type"], "/internal-error");
        assert_eq!(body["detail"], GENERIC_DETAIL);
    }

    #[tokio::test]
    async fn test_pool_exhaustion_is_retriable() {
        let response = AppError::from(SearchError::PoolExhausted(Duration::from_secs(1))).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["retry-after"], "1");
    }
}
