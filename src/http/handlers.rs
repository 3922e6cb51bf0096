//! Request handlers.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::search::{CacheStatus, SearchCriteria, SearchParams, ValidationError};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// `GET /api/v1/operators`
pub async fn search_operators(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|rejection| ValidationError::single("query", rejection.body_text()))?;
    let criteria = SearchCriteria::parse(&params, state.service.engine().whitelist(), &state.limits)?;

    let outcome = state.service.search(&criteria).await?;

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        outcome.body,
    )
        .into_response();
    if outcome.cache != CacheStatus::Bypass {
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static(outcome.cache.as_str()));
    }
    Ok(response)
}

/// `GET /health` and `GET /api/v1/health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
