//! Canonical cache keys for search criteria.
//!
//! Format: `search:search=<text>|page=<n>|pageSize=<n>|sortField=<f>|sortDirection=<d>`.
//! Field order is fixed. `\`, `|` and `=` inside values are backslash-escaped.
//! The format is shared by every process using the same cache store, so it
//! must not change without a key prefix bump.

use crate::search::SearchCriteria;

pub const KEY_PREFIX: &str = "search:";
const SEPARATOR: char = '|';

/// Build the cache key for validated criteria.
pub fn cache_key(criteria: &SearchCriteria) -> String {
    let page = criteria.page().to_string();
    let page_size = criteria.page_size().to_string();
    let fields: [(&str, &str); 5] = [
        ("search", criteria.search()),
        ("page", &page),
        ("pageSize", &page_size),
        ("sortField", criteria.sort_field().unwrap_or("")),
        ("sortDirection", criteria.sort_direction().as_str()),
    ];

    let mut key = String::with_capacity(KEY_PREFIX.len() + 64 + criteria.search().len());
    key.push_str(KEY_PREFIX);
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(name);
        key.push('=');
        escape_into(&mut key, value);
    }
    key
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | '|' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OPERATOR_SCHEMA;
    use crate::search::{ColumnWhitelist, SearchLimits, SearchParams};

    fn criteria_from(pairs: &[(&str, &str)]) -> SearchCriteria {
        let mut params = SearchParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search" => params.search = v,
                "page" => params.page = v,
                "pageSize" => params.page_size = v,
                "sortField" => params.sort_field = v,
                "sortDirection" => params.sort_direction = v,
                _ => unreachable!(),
            }
        }
        let wl = ColumnWhitelist::from_schema(OPERATOR_SCHEMA);
        SearchCriteria::parse(&params, &wl, &SearchLimits::default()).unwrap()
    }

    #[test]
    fn test_key_independent_of_parameter_order() {
        let a = criteria_from(&[
            ("search", "sp"),
            ("page", "1"),
            ("pageSize", "10"),
            ("sortField", "city"),
            ("sortDirection", "asc"),
        ]);
        let b = criteria_from(&[
            ("sortDirection", "asc"),
            ("page", "1"),
            ("sortField", "city"),
            ("pageSize", "10"),
            ("search", "sp"),
        ]);
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(
            cache_key(&a),
            "search:search=sp|page=1|pageSize=10|sortField=city|sortDirection=asc"
        );
    }

    #[test]
    fn test_defaults_and_explicit_values_share_a_key() {
        let implicit = criteria_from(&[("search", "sp")]);
        let explicit = criteria_from(&[
            ("search", "sp"),
            ("page", "1"),
            ("pageSize", "10"),
            ("sortDirection", "asc"),
        ]);
        assert_eq!(cache_key(&implicit), cache_key(&explicit));
    }

    #[test]
    fn test_distinct_criteria_distinct_keys() {
        let base = cache_key(&criteria_from(&[("search", "sp")]));
        assert_ne!(base, cache_key(&criteria_from(&[("search", "sp"), ("page", "2")])));
        assert_ne!(base, cache_key(&criteria_from(&[("search", "sp"), ("sortDirection", "desc")])));
        assert_ne!(base, cache_key(&criteria_from(&[("search", "SP")])));
    }

    #[test]
    fn test_separators_in_search_are_escaped() {
        let forged = criteria_from(&[("search", "sp|page=2")]);
        let key = cache_key(&forged);
        assert_eq!(
            key,
            "search:search=sp\\|page\\=2|page=1|pageSize=10|sortField=|sortDirection=asc"
        );
        assert_ne!(key, cache_key(&criteria_from(&[("search", "sp"), ("page", "2")])));

        let slash = criteria_from(&[("search", "a\\b")]);
        assert!(cache_key(&slash).starts_with("search:search=a\\\\b|"));
    }
}
