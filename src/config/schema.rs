//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the search service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Result cache configuration.
    pub cache: CacheConfig,

    /// Search parameter bounds.
    pub search: SearchConfig,

    /// Catalog source and access pool.
    pub catalog: CatalogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline in seconds.
    pub request_secs: u64,

    /// Deadline for a single catalog call in milliseconds.
    pub query_ms: u64,

    /// Maximum wait for a catalog pool slot in milliseconds.
    pub pool_acquire_ms: u64,

    /// Deadline for a single cache call in milliseconds.
    pub cache_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            query_ms: 5_000,
            pool_acquire_ms: 1_000,
            cache_ms: 250,
        }
    }
}

/// Where shared state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Redis,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per client and endpoint within one window.
    pub limit: u64,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Counter store backend.
    pub backend: Backend,

    /// Redis URL when `backend = "redis"`.
    pub redis_url: Option<String>,

    /// Key prefix inside Redis.
    pub redis_key_prefix: String,

    /// Paths that are never rate limited.
    pub exempt_paths: Vec<String>,

    /// How often idle in-process counters are dropped, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 100,
            window_secs: 60,
            backend: Backend::Memory,
            redis_url: None,
            redis_key_prefix: "ratelimit:".to_string(),
            exempt_paths: vec![
                "/health".to_string(),
                "/api/v1/health".to_string(),
                "/docs".to_string(),
                "/redoc".to_string(),
                "/openapi.json".to_string(),
            ],
            sweep_interval_secs: 60,
        }
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable result caching.
    pub enabled: bool,

    /// Lifetime of a cached search page, in seconds.
    pub ttl_secs: u64,

    /// Cache store backend.
    pub backend: Backend,

    /// Redis URL when `backend = "redis"`.
    pub redis_url: Option<String>,

    /// How often expired in-process entries are dropped, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3_600,
            backend: Backend::Memory,
            redis_url: None,
            sweep_interval_secs: 300,
        }
    }
}

/// Search parameter bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum length of a non-empty search text.
    pub min_search_len: usize,

    /// Maximum length of the search text.
    pub max_search_len: usize,

    /// Page size used when none is supplied.
    pub default_page_size: u32,

    /// Largest page size a caller may request.
    pub max_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_search_len: 2,
            max_search_len: 100,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file holding the operator rows.
    pub path: String,

    /// Concurrent catalog queries allowed.
    pub pool_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "data/operators.json".to_string(),
            pool_size: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
