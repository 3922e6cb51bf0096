//! Catalog subsystem.
//!
//! # Data Flow
//! ```text
//! operators.json (startup, read once)
//!     → operator.rs (deserialize rows)
//!     → store.rs (MemoryCatalog, immutable table)
//!     → search engine (count / fetch with filter, order, window)
//! ```
//!
//! # Design Decisions
//! - The catalog is read-only for the process lifetime
//! - Field typing comes from a static table in schema.rs, not reflection
//! - Filtering and ordering are collation-aware (case and accent folded)

pub mod collation;
pub mod operator;
pub mod schema;
pub mod store;

pub use operator::Operator;
pub use schema::{FieldDef, FieldKind, OPERATOR_SCHEMA};
pub use store::{CatalogQuery, CatalogStore, MemoryCatalog, SortOrder, StoreError};
