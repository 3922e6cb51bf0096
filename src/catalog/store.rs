//! Catalog storage.
//!
//! # Responsibilities
//! - Own the operator rows for the process lifetime
//! - Count and fetch rows matching a folded text filter
//! - Apply collation-aware ordering and offset/limit windows
//!
//! # Design Decisions
//! - Rows are sorted by id at load, so "no ordering" is id order
//! - Searchable text is folded once at load, not per query

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collation::{fold, sort_key};
use super::operator::Operator;
use super::schema::{searchable_fields, OPERATOR_SCHEMA};

/// Direction of an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A fully resolved catalog read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Folded needle; `None` matches every row.
    pub filter: Option<String>,
    /// Field name and direction, already checked against the whitelist.
    pub order: Option<(String, SortOrder)>,
    pub offset: usize,
    pub limit: usize,
}

/// Errors raised by catalog backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog file is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate operator id {0}")]
    DuplicateId(u64),

    #[error("catalog backend unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the operator catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Number of rows matching `filter`.
    async fn count(&self, filter: Option<&str>) -> Result<u64, StoreError>;

    /// Rows matching the query, ordered and windowed.
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<Operator>, StoreError>;
}

struct Row {
    operator: Operator,
    folded: Vec<String>,
}

impl Row {
    fn new(operator: Operator) -> Self {
        let folded = searchable_fields(OPERATOR_SCHEMA)
            .filter_map(|f| operator.text(f.name))
            .map(fold)
            .collect();
        Self { operator, folded }
    }

    fn matches(&self, needle: Option<&str>) -> bool {
        match needle {
            None => true,
            Some(n) if n.is_empty() => true,
            Some(n) => self.folded.iter().any(|haystack| haystack.contains(n)),
        }
    }
}

/// In-process, immutable catalog table.
pub struct MemoryCatalog {
    rows: Vec<Row>,
}

impl MemoryCatalog {
    /// Build a catalog from rows. Ids must be unique.
    pub fn new(mut operators: Vec<Operator>) -> Result<Self, StoreError> {
        operators.sort_by_key(|o| o.id);

        let mut seen = HashSet::with_capacity(operators.len());
        for op in &operators {
            if !seen.insert(op.id) {
                return Err(StoreError::DuplicateId(op.id));
            }
        }

        Ok(Self {
            rows: operators.into_iter().map(Row::new).collect(),
        })
    }

    /// Load a catalog from a JSON array of operators.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let operators: Vec<Operator> = serde_json::from_reader(BufReader::new(file))?;
        let catalog = Self::new(operators)?;
        tracing::info!(path = %path.display(), rows = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn select(&self, query: &CatalogQuery) -> Vec<&Operator> {
        let mut matched: Vec<&Operator> = self
            .rows
            .iter()
            .filter(|r| r.matches(query.filter.as_deref()))
            .map(|r| &r.operator)
            .collect();

        if let Some((field, order)) = &query.order {
            // Keys are folded once per row; the sort is stable, so equal keys keep id order.
            match order {
                SortOrder::Asc => matched.sort_by_cached_key(|op| sort_key(op.field(field))),
                SortOrder::Desc => matched.sort_by_cached_key(|op| Reverse(sort_key(op.field(field)))),
            }
        }

        matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn count(&self, filter: Option<&str>) -> Result<u64, StoreError> {
        Ok(self.rows.iter().filter(|r| r.matches(filter)).count() as u64)
    }

    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<Operator>, StoreError> {
        Ok(self.select(query).into_iter().cloned().collect())
    }
}

impl std::fmt::Debug for MemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCatalog")
            .field("rows", &self.rows.len())
            .finish()
    }
}
