//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Start background sweepers for in-process stores
//! - Hand back a router ready to be bound
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cache::{CacheError, CacheStore, MemoryCacheStore, RedisCacheStore, ResultCache};
use crate::catalog::{CatalogStore, MemoryCatalog, StoreError, OPERATOR_SCHEMA};
use crate::config::{AppConfig, Backend, SearchConfig};
use crate::http::{build_router, AppState};
use crate::lifecycle::sweeper::spawn_sweeper;
use crate::lifecycle::Shutdown;
use crate::search::{ColumnWhitelist, EngineSettings, SearchEngine, SearchLimits, SearchService};
use crate::security::{
    CounterStore, LimiterError, MemoryCounterStore, MovingWindowLimiter, RateLimitGate, RedisCounterStore,
};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] StoreError),

    #[error("failed to connect rate limiter store: {0}")]
    Limiter(#[from] LimiterError),

    #[error("failed to connect cache store: {0}")]
    Cache(#[from] CacheError),

    #[error("{0} requires a redis_url")]
    MissingRedisUrl(&'static str),
}

/// A fully wired application, not yet bound to a socket.
pub struct Application {
    pub router: Router,
    pub sweepers: Vec<JoinHandle<()>>,
}

impl From<&SearchConfig> for SearchLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_search_len: config.min_search_len,
            max_search_len: config.max_search_len,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// Load the catalog from `catalog.path` and wire everything around it.
pub async fn build_application(config: &AppConfig, shutdown: &Shutdown) -> Result<Application, StartupError> {
    let catalog = MemoryCatalog::load_from_file(Path::new(&config.catalog.path))?;
    build_with_catalog(config, Arc::new(catalog), shutdown).await
}

/// Wire the application around an already loaded catalog.
pub async fn build_with_catalog(
    config: &AppConfig,
    catalog: Arc<dyn CatalogStore>,
    shutdown: &Shutdown,
) -> Result<Application, StartupError> {
    let mut sweepers = Vec::new();

    let whitelist = Arc::new(ColumnWhitelist::from_schema(OPERATOR_SCHEMA));
    tracing::debug!(columns = %whitelist.describe(), "Sortable columns");

    let engine = Arc::new(SearchEngine::new(
        catalog,
        whitelist,
        EngineSettings {
            pool_size: config.catalog.pool_size,
            acquire_timeout: Duration::from_millis(config.timeouts.pool_acquire_ms),
            query_timeout: Duration::from_millis(config.timeouts.query_ms),
        },
    ));

    let cache = if config.cache.enabled {
        let store: Arc<dyn CacheStore> = match config.cache.backend {
            Backend::Memory => {
                let store = Arc::new(MemoryCacheStore::new());
                sweepers.push(spawn_sweeper(
                    store.clone(),
                    Duration::from_secs(config.cache.sweep_interval_secs),
                    shutdown.subscribe(),
                ));
                store
            }
            Backend::Redis => {
                let url = config
                    .cache
                    .redis_url
                    .as_deref()
                    .ok_or(StartupError::MissingRedisUrl("cache"))?;
                Arc::new(RedisCacheStore::connect(url).await?)
            }
        };
        Some(ResultCache::new(store, Duration::from_millis(config.timeouts.cache_ms)))
    } else {
        tracing::info!("Result cache disabled");
        None
    };

    let service = Arc::new(SearchService::new(
        engine,
        cache,
        Duration::from_secs(config.cache.ttl_secs),
    ));

    let gate = if config.rate_limit.enabled {
        let store: Arc<dyn CounterStore> = match config.rate_limit.backend {
            Backend::Memory => {
                let store = Arc::new(MemoryCounterStore::new());
                sweepers.push(spawn_sweeper(
                    store.clone(),
                    Duration::from_secs(config.rate_limit.sweep_interval_secs),
                    shutdown.subscribe(),
                ));
                store
            }
            Backend::Redis => {
                let url = config
                    .rate_limit
                    .redis_url
                    .as_deref()
                    .ok_or(StartupError::MissingRedisUrl("rate_limit"))?;
                Arc::new(RedisCounterStore::connect(url, config.rate_limit.redis_key_prefix.clone()).await?)
            }
        };
        tracing::info!(
            limit = config.rate_limit.limit,
            window_secs = config.rate_limit.window_secs,
            backend = ?config.rate_limit.backend,
            "Rate limiting enabled"
        );
        Some(Arc::new(RateLimitGate::from_config(
            MovingWindowLimiter::new(store),
            &config.rate_limit,
        )))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let state = AppState {
        service,
        limits: SearchLimits::from(&config.search),
    };
    let router = build_router(state, gate, Duration::from_secs(config.timeouts.request_secs));

    Ok(Application { router, sweepers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_catalog_file_is_fatal() {
        let mut config = AppConfig::default();
        config.catalog.path = "/nonexistent/operators.json".into();
        let shutdown = Shutdown::new();
        let err = build_application(&config, &shutdown).await.err().unwrap();
        assert!(matches!(err, StartupError::Catalog(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_memory_backends_spawn_sweepers() {
        let config = AppConfig::default();
        let shutdown = Shutdown::new();
        let catalog = Arc::new(MemoryCatalog::new(Vec::new()).unwrap());
        let app = build_with_catalog(&config, catalog, &shutdown).await.unwrap();
        assert_eq!(app.sweepers.len(), 2);

        shutdown.trigger();
        for handle in app.sweepers {
            handle.await.unwrap();
        }
    }

    #[test]
    fn test_limits_from_config() {
        let limits = SearchLimits::from(&SearchConfig::default());
        assert_eq!(limits, SearchLimits::default());
    }
}
