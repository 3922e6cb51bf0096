//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits, windows, TTLs, timeouts > 0)
//! - Check that Redis backends have a URL and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AppConfig, Backend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.query_ms", timeouts.query_ms),
        ("timeouts.pool_acquire_ms", timeouts.pool_acquire_ms),
        ("timeouts.cache_ms", timeouts.cache_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    let rl = &config.rate_limit;
    if rl.limit == 0 {
        errors.push(ValidationError::new("rate_limit.limit", "must be at least 1"));
    }
    if rl.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be at least 1"));
    }
    if rl.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_interval_secs", "must be at least 1"));
    }
    if rl.backend == Backend::Redis && rl.redis_url.as_deref().unwrap_or("").is_empty() {
        errors.push(ValidationError::new("rate_limit.redis_url", "required when backend is redis"));
    }
    for path in &rl.exempt_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "rate_limit.exempt_paths",
                format!("'{}' must start with '/'", path),
            ));
        }
    }

    let cache = &config.cache;
    if cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be at least 1"));
    }
    if cache.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("cache.sweep_interval_secs", "must be at least 1"));
    }
    if cache.backend == Backend::Redis && cache.redis_url.as_deref().unwrap_or("").is_empty() {
        errors.push(ValidationError::new("cache.redis_url", "required when backend is redis"));
    }

    let search = &config.search;
    if search.min_search_len == 0 || search.min_search_len > search.max_search_len {
        errors.push(ValidationError::new(
            "search.min_search_len",
            "must be between 1 and search.max_search_len",
        ));
    }
    if search.default_page_size == 0 || search.default_page_size > search.max_page_size {
        errors.push(ValidationError::new(
            "search.default_page_size",
            "must be between 1 and search.max_page_size",
        ));
    }

    if config.catalog.pool_size == 0 {
        errors.push(ValidationError::new("catalog.pool_size", "must be at least 1"));
    }
    if config.catalog.path.trim().is_empty() {
        errors.push(ValidationError::new("catalog.path", "must not be empty"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
