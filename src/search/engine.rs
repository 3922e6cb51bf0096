//! Filtered, sorted, paginated catalog search.
//!
//! # Responsibilities
//! - Re-check the sort field against the whitelist before any catalog access
//! - Fold the search text and count matching rows
//! - Fetch one ordered page and attach pagination metadata
//!
//! # Design Decisions
//! - Catalog access is bounded by a semaphore standing in for a connection pool
//! - Every catalog call carries a deadline; timeouts are upstream errors

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::catalog::collation::fold;
use crate::catalog::{CatalogQuery, CatalogStore, Operator, SortOrder, StoreError};
use crate::observability::metrics;
use crate::search::criteria::{SearchCriteria, ValidationError};
use crate::search::whitelist::ColumnWhitelist;

/// Errors produced while executing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("catalog query failed: {0}")]
    Upstream(#[from] StoreError),

    #[error("catalog query timed out after {0:?}")]
    Timeout(Duration),

    #[error("no catalog connection available within {0:?}")]
    PoolExhausted(Duration),

    #[error("failed to serialize search result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One page of search results plus the criteria that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub data: Vec<Operator>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub search: String,
    pub sort_field: Option<String>,
    pub sort_direction: SortOrder,
}

/// Number of pages needed for `total_items`; never less than one.
pub fn total_pages(total_items: u64, page_size: u32) -> u64 {
    let size = u64::from(page_size.max(1));
    total_items.div_ceil(size).max(1)
}

/// Tuning for catalog access.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub pool_size: usize,
    pub acquire_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pool_size: 10,
            acquire_timeout: Duration::from_millis(1000),
            query_timeout: Duration::from_millis(5000),
        }
    }
}

/// Executes validated criteria against the catalog.
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
    whitelist: Arc<ColumnWhitelist>,
    pool: Semaphore,
    settings: EngineSettings,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>, whitelist: Arc<ColumnWhitelist>, settings: EngineSettings) -> Self {
        Self {
            store,
            whitelist,
            pool: Semaphore::new(settings.pool_size.max(1)),
            settings,
        }
    }

    pub fn whitelist(&self) -> &ColumnWhitelist {
        &self.whitelist
    }

    pub async fn execute(&self, criteria: &SearchCriteria) -> Result<SearchResult, SearchError> {
        if let Some(field) = criteria.sort_field() {
            if !self.whitelist.contains(field) {
                return Err(ValidationError::single(
                    "sortField",
                    format!("must be one of: {}", self.whitelist.describe()),
                )
                .into());
            }
        }

        let filter = Some(criteria.search())
            .filter(|s| !s.is_empty())
            .map(fold);

        let _permit = tokio::time::timeout(self.settings.acquire_timeout, self.pool.acquire())
            .await
            .map_err(|_| SearchError::PoolExhausted(self.settings.acquire_timeout))?
            .map_err(|_| StoreError::Unavailable("connection pool closed".into()))?;

        let started = Instant::now();

        let total_items = self.bounded(self.store.count(filter.as_deref())).await?;
        let total_pages = total_pages(total_items, criteria.page_size());

        let page_size = criteria.page_size() as usize;
        let offset = (criteria.page() as usize - 1).saturating_mul(page_size);
        let query = CatalogQuery {
            filter,
            order: criteria
                .sort_field()
                .map(|f| (f.to_string(), criteria.sort_direction())),
            offset,
            limit: page_size,
        };
        let data = self.bounded(self.store.fetch(&query)).await?;

        metrics::record_query(started);
        tracing::debug!(
            search = %criteria.search(),
            page = criteria.page(),
            page_size = criteria.page_size(),
            total_items,
            returned = data.len(),
            "Catalog query executed"
        );

        Ok(SearchResult {
            data,
            page: criteria.page(),
            page_size: criteria.page_size(),
            total_pages,
            total_items,
            search: criteria.search().to_string(),
            sort_field: criteria.sort_field().map(str::to_string),
            sort_direction: criteria.sort_direction(),
        })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, SearchError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                metrics::record_query_error("upstream");
                Err(SearchError::Upstream(e))
            }
            Err(_) => {
                metrics::record_query_error("timeout");
                Err(SearchError::Timeout(self.settings.query_timeout))
            }
        }
    }
}
