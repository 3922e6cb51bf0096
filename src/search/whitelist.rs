//! Sortable column whitelist.

use std::collections::BTreeSet;

use crate::catalog::FieldDef;

/// Field names a caller may order by.
///
/// Derived once from the catalog schema and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnWhitelist {
    columns: BTreeSet<String>,
}

impl ColumnWhitelist {
    /// Collect the text and date fields of `schema`, skipping the identity.
    pub fn from_schema(schema: &[FieldDef]) -> Self {
        let columns = schema
            .iter()
            .filter(|f| f.kind.is_sortable())
            .map(|f| f.name.to_string())
            .collect();
        Self { columns }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains(field)
    }

    /// All allowed names, sorted.
    pub fn all(&self) -> &BTreeSet<String> {
        &self.columns
    }

    /// Comma-separated list for error messages.
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldKind, OPERATOR_SCHEMA};

    #[test]
    fn test_whitelist_from_operator_schema() {
        let wl = ColumnWhitelist::from_schema(OPERATOR_SCHEMA);
        assert!(wl.contains("city"));
        assert!(wl.contains("corporate_name"));
        assert!(wl.contains("registration_date"));
        assert!(!wl.contains("id"));
        assert!(!wl.contains("sales_region"));
        assert!(!wl.contains("City"));
        assert!(!wl.contains("city; drop table"));

        let expected = OPERATOR_SCHEMA
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Text | FieldKind::Date))
            .count();
        assert_eq!(wl.all().len(), expected);
    }

    #[test]
    fn test_whitelist_is_idempotent() {
        let a = ColumnWhitelist::from_schema(OPERATOR_SCHEMA);
        let b = ColumnWhitelist::from_schema(OPERATOR_SCHEMA);
        assert_eq!(a, b);
        assert_eq!(a.describe(), b.describe());
    }

    #[test]
    fn test_describe_is_sorted() {
        let wl = ColumnWhitelist::from_schema(OPERATOR_SCHEMA);
        let described = wl.describe();
        assert!(described.starts_with("area_code, city"));
    }
}
