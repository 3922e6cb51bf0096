//! Result caching subsystem.
//!
//! # Data Flow
//! ```text
//! validated criteria
//!     → key.rs (canonical key, fixed field order)
//!     → ResultCache::get (bounded by cache timeout)
//!         → store.rs (in-process) or redis_store.rs (shared)
//! on miss, after the engine ran:
//!     → ResultCache::set (value = serialized result, TTL)
//! ```
//!
//! # Design Decisions
//! - Backend failures degrade to a miss; a broken cache never fails a request
//! - No invalidation API: entries leave only by TTL expiry
//! - No single-flight: concurrent misses may both compute and both write

pub mod key;
pub mod redis_store;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::observability::metrics;

pub use self::key::cache_key;
pub use self::redis_store::RedisCacheStore;
pub use self::store::{CacheEntry, CacheStore, MemoryCacheStore};

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// TTL-bounded store of serialized search results.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    op_timeout: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    /// Look up a cached value. Backend errors are logged and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        let outcome = match tokio::time::timeout(self.op_timeout, self.store.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        };

        match outcome {
            Ok(Some(value)) => {
                metrics::record_cache_lookup("hit");
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                metrics::record_cache_lookup("miss");
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                metrics::record_cache_lookup("error");
                tracing::warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Store a value for `ttl`. Failures are logged and otherwise ignored.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let outcome = match tokio::time::timeout(self.op_timeout, self.store.set_ex(key, value, ttl)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        };

        if let Err(e) = outcome {
            tracing::warn!(key = %key, error = %e, "Cache store failed");
        }
    }
}
