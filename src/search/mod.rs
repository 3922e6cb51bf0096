//! Operator search subsystem.
//!
//! # Data Flow
//! ```text
//! query string
//!     → criteria.rs (parse, validate against whitelist.rs and limits)
//!     → service.rs (cache key → ResultCache lookup)
//!         hit  → cached JSON body
//!         miss → engine.rs (filter, count, order, paginate)
//!              → serialize → ResultCache store → JSON body
//! ```
//!
//! # Design Decisions
//! - Criteria are validated once, at construction; invalid criteria never exist
//! - The whitelist is built once at startup and shared by reference
//! - Cached values are the serialized response, so hits are byte-identical

pub mod criteria;
pub mod engine;
pub mod service;
pub mod whitelist;

pub use criteria::{SearchCriteria, SearchLimits, SearchParams, ValidationError, Violation};
pub use engine::{total_pages, EngineSettings, SearchEngine, SearchError, SearchResult};
pub use service::{CacheStatus, SearchOutcome, SearchService};
pub use whitelist::ColumnWhitelist;
