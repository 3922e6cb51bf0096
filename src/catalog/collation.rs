//! Case- and accent-insensitive text handling.
//!
//! Both filtering and ordering go through [`fold`], so "São Paulo",
//! "SAO PAULO" and "sao paulo" are the same value to the catalog.

use chrono::NaiveDate;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::operator::FieldValue;

/// Fold text to its collation form: decomposed, marks stripped, lowercase.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Owned ordering key for one field value, computed once per row and sort.
///
/// Text orders by its folded form, ties broken by the raw text so the order
/// stays total. Variant order puts [`SortKey::Absent`] after every present value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Integer(i64),
    Date(NaiveDate),
    Text { folded: String, raw: String },
    Absent,
}

/// Build the ordering key for an optional field value.
pub fn sort_key(value: Option<FieldValue<'_>>) -> SortKey {
    match value {
        None => SortKey::Absent,
        Some(FieldValue::Integer(n)) => SortKey::Integer(n),
        Some(FieldValue::Date(d)) => SortKey::Date(d),
        Some(FieldValue::Text(s)) => SortKey::Text {
            folded: fold(s),
            raw: s.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("São Paulo"), "sao paulo");
        assert_eq!(fold("ASSISTÊNCIA MÉDICA"), "assistencia medica");
        assert_eq!(fold("Cambuí"), "cambui");
        assert_eq!(fold("ç"), "c");
        assert_eq!(fold(""), "");
    }

    fn key(text: &str) -> SortKey {
        sort_key(Some(FieldValue::Text(text)))
    }

    #[test]
    fn test_text_key_ignores_accents() {
        assert!(key("Águas") < key("azul"));
        assert!(key("são josé") < key("Sorocaba"));

        assert_ne!(key("BELO"), key("belo"));
        assert_eq!(fold("BELO"), fold("belo"));
    }

    #[test]
    fn test_absent_sorts_last() {
        assert!(key("zzz") < sort_key(None));
        assert!(sort_key(Some(FieldValue::Integer(i64::MAX))) < sort_key(None));
        assert_eq!(sort_key(None), SortKey::Absent);
    }

    #[test]
    fn test_dates_order_chronologically() {
        let early = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(sort_key(Some(FieldValue::Date(early))) < sort_key(Some(FieldValue::Date(late))));
    }
}
