//! Cache-aside search.
//!
//! A lookup runs after the rate-limit gate admitted the request. On a hit the
//! stored body is returned verbatim; on a miss the engine runs and its
//! serialized result is stored under the same key.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{cache_key, ResultCache};
use crate::search::criteria::SearchCriteria;
use crate::search::engine::{SearchEngine, SearchError};

/// Where a response body came from, reported in `X-Cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Caching is disabled.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// Serialized search result ready to be sent.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub body: String,
    pub cache: CacheStatus,
}

pub struct SearchService {
    engine: Arc<SearchEngine>,
    cache: Option<ResultCache>,
    ttl: Duration,
}

impl SearchService {
    pub fn new(engine: Arc<SearchEngine>, cache: Option<ResultCache>, ttl: Duration) -> Self {
        Self { engine, cache, ttl }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchOutcome, SearchError> {
        let Some(cache) = &self.cache else {
            let result = self.engine.execute(criteria).await?;
            return Ok(SearchOutcome {
                body: serde_json::to_string(&result)?,
                cache: CacheStatus::Bypass,
            });
        };

        let key = cache_key(criteria);
        if let Some(body) = cache.get(&key).await {
            return Ok(SearchOutcome {
                body,
                cache: CacheStatus::Hit,
            });
        }

        let result = self.engine.execute(criteria).await?;
        let body = serde_json::to_string(&result)?;
        cache.set(&key, &body, self.ttl).await;

        Ok(SearchOutcome {
            body,
            cache: CacheStatus::Miss,
        })
    }
}
