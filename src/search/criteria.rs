//! Search criteria parsing and validation.
//!
//! # Responsibilities
//! - Accept raw query parameters (camelCase, snake_case aliases)
//! - Validate every field, reporting all violations at once
//! - Produce an immutable, normalized [`SearchCriteria`]
//!
//! # Design Decisions
//! - Raw values are strings so malformed numbers become violations, not rejections
//! - Empty `search` and empty `sortField` mean "not supplied"

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::SortOrder;
use crate::search::whitelist::ColumnWhitelist;

/// Raw query parameters as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "query")]
    pub search: Option<String>,

    #[serde(default)]
    pub page: Option<String>,

    #[serde(default, rename = "pageSize", alias = "page_size")]
    pub page_size: Option<String>,

    #[serde(default, rename = "sortField", alias = "sort_field")]
    pub sort_field: Option<String>,

    #[serde(default, rename = "sortDirection", alias = "sort_direction")]
    pub sort_direction: Option<String>,
}

/// Bounds applied while validating criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub min_search_len: usize,
    pub max_search_len: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            min_search_len: 2,
            max_search_len: 100,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub name: String,
    pub message: String,
}

impl Violation {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Malformed or out-of-range request criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::new(name, message)],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request parameters: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", v.name, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validated search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCriteria {
    search: String,
    page: u32,
    page_size: u32,
    sort_field: Option<String>,
    sort_direction: SortOrder,
}

impl SearchCriteria {
    /// Validate raw parameters into criteria.
    pub fn parse(
        params: &SearchParams,
        whitelist: &ColumnWhitelist,
        limits: &SearchLimits,
    ) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();

        let search = params.search.clone().unwrap_or_default();
        let search_len = search.chars().count();
        if search_len > 0 && search_len < limits.min_search_len {
            violations.push(Violation::new(
                "search",
                format!("must have at least {} characters", limits.min_search_len),
            ));
        }
        if search_len > limits.max_search_len {
            violations.push(Violation::new(
                "search",
                format!("must have at most {} characters", limits.max_search_len),
            ));
        }

        let page = match parse_int("page", params.page.as_deref(), 1, &mut violations) {
            Some(0) => {
                violations.push(Violation::new("page", "must be greater than zero"));
                1
            }
            Some(p) => p,
            None => 1,
        };

        let page_size = match parse_int(
            "pageSize",
            params.page_size.as_deref(),
            limits.default_page_size,
            &mut violations,
        ) {
            Some(size) if (1..=limits.max_page_size).contains(&size) => size,
            Some(_) => {
                violations.push(Violation::new(
                    "pageSize",
                    format!("must be between 1 and {}", limits.max_page_size),
                ));
                limits.default_page_size
            }
            None => limits.default_page_size,
        };

        let sort_field = params
            .sort_field
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        if let Some(field) = &sort_field {
            if !whitelist.contains(field) {
                violations.push(Violation::new(
                    "sortField",
                    format!("must be one of: {}", whitelist.describe()),
                ));
            }
        }

        let sort_direction = match params.sort_direction.as_deref() {
            None | Some("") | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => {
                violations.push(Violation::new("sortDirection", "must be 'asc' or 'desc'"));
                SortOrder::Asc
            }
        };

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        Ok(Self {
            search,
            page,
            page_size,
            sort_field,
            sort_direction,
        })
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn sort_direction(&self) -> SortOrder {
        self.sort_direction
    }
}

/// Parse an optional integer parameter, recording a violation on garbage.
///
/// Returns `None` only when a violation was recorded.
fn parse_int(name: &str, raw: Option<&str>, default: u32, violations: &mut Vec<Violation>) -> Option<u32> {
    match raw.map(str::trim) {
        None | Some("") => Some(default),
        Some(s) => match s.parse::<i64>() {
            Ok(n) if n < 0 => {
                violations.push(Violation::new(name, "must be greater than zero"));
                None
            }
            Ok(n) => match u32::try_from(n) {
                Ok(v) => Some(v),
                Err(_) => {
                    violations.push(Violation::new(name, "is too large"));
                    None
                }
            },
            Err(_) => {
                violations.push(Violation::new(name, "must be an integer"));
                None
            }
        },
    }
}
