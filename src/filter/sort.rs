use std::collections::HashMap;

use super::error::FilterError;
use super::types::{FilterEq, SortSpec};

/// Query parameter that selects ordering instead of filtering.
pub const SORT_PARAM: &str = "sort";

impl SortSpec {
    /// `col` sorts ascending, `-col` descending, absent or empty falls back to
    /// `created_date` descending.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None | Some("") => SortSpec::default(),
            Some(s) => match s.strip_prefix('-') {
                Some(column) => SortSpec::descending(column),
                None => SortSpec::ascending(s),
            },
        }
    }
}

/// Split a raw query string into the sort spec and the equality filters.
///
/// Every non-empty parameter other than `sort` becomes a filter; on duplicate
/// keys the last value wins.
pub fn parse_list_query(raw: Option<&str>) -> (SortSpec, Vec<FilterEq>) {
    let mut sort = None;
    let mut order: Vec<String> = Vec::new();
    let mut values: HashMap<String, String> = HashMap::new();

    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
        if key == SORT_PARAM {
            sort = Some(value.into_owned());
            continue;
        }
        if value.is_empty() {
            continue;
        }
        if !values.contains_key(key.as_ref()) {
            order.push(key.to_string());
        }
        values.insert(key.into_owned(), value.into_owned());
    }

    let filters = order
        .into_iter()
        .filter_map(|column| values.remove(&column).map(|value| FilterEq { column, value }))
        .collect();

    (SortSpec::from_param(sort.as_deref()), filters)
}

/// Accept plain SQL identifiers only: letters, digits and `_`, not starting with a digit.
pub fn validate_identifier(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !first_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::SortDirection;

    #[test]
    fn default_sort_is_created_date_desc() {
        let sort = SortSpec::from_param(None);
        assert_eq!(sort.column, "created_date");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(SortSpec::from_param(Some("")), sort);
    }

    #[test]
    fn leading_dash_sorts_descending() {
        assert_eq!(SortSpec::from_param(Some("-created_date")), SortSpec::descending("created_date"));
        assert_eq!(SortSpec::from_param(Some("total")), SortSpec::ascending("total"));
    }

    #[test]
    fn query_string_splits_sort_and_filters() {
        let (sort, filters) = parse_list_query(Some("sort=-total&status=open&customer_id=42"));
        assert_eq!(sort, SortSpec::descending("total"));
        assert_eq!(
            filters,
            vec![FilterEq::new("status", "open"), FilterEq::new("customer_id", "42")]
        );
    }

    #[test]
    fn empty_values_are_skipped_and_last_duplicate_wins() {
        let (_, filters) = parse_list_query(Some("status=&plate=ABC&plate=XYZ"));
        assert_eq!(filters, vec![FilterEq::new("plate", "XYZ")]);
    }

    #[test]
    fn values_are_percent_decoded() {
        let (_, filters) = parse_list_query(Some("name=Jo%C3%A3o+Silva"));
        assert_eq!(filters, vec![FilterEq::new("name", "João Silva")]);
    }

    #[test]
    fn no_query_means_defaults() {
        let (sort, filters) = parse_list_query(None);
        assert_eq!(sort, SortSpec::default());
        assert!(filters.is_empty());
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("created_date").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("name\"; DROP TABLE quotes").is_err());
        assert!(validate_identifier("service-items").is_err());
    }
}
