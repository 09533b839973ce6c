//! Query parameter parsing for the listing endpoints.

use std::collections::HashMap;

use crate::error::ApiError;

/// Parses a comma-separated id list (`tags=1,2,3`). Any non-numeric token
/// fails the whole parameter.
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i32>()
                .map_err(|_| ApiError::validation(field, "Enter a comma separated list of ids."))
        })
        .collect()
}

/// Optional id-list parameter; absent or empty means no filter.
pub fn id_list_param(
    query: &HashMap<String, String>,
    field: &str,
) -> Result<Option<Vec<i32>>, ApiError> {
    match query.get(field).map(|s| s.as_str()) {
        Some(raw) if !raw.is_empty() => parse_id_list(field, raw).map(Some),
        _ => Ok(None),
    }
}

/// The `assigned_only` flag, `0`/`1` with `false`/`true` accepted as well.
pub fn assigned_only_param(query: &HashMap<String, String>) -> Result<bool, ApiError> {
    match query.get("assigned_only").map(|s| s.as_str()) {
        None | Some("") => Ok(false),
        Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(_) => Err(ApiError::validation(
            "assigned_only",
            "Enter 0 or 1.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_id_list("tags", "1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("tags", "7").unwrap(), vec![7]);
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        assert!(parse_id_list("tags", "1,abc").is_err());
        assert!(parse_id_list("tags", ",").is_err());
    }

    #[test]
    fn absent_id_list_is_no_filter() {
        assert_eq!(id_list_param(&query(&[]), "tags").unwrap(), None);
        assert_eq!(id_list_param(&query(&[("tags", "")]), "tags").unwrap(), None);
        assert_eq!(
            id_list_param(&query(&[("tags", "4,5")]), "tags").unwrap(),
            Some(vec![4, 5])
        );
    }

    #[test]
    fn assigned_only_flag_parsing() {
        assert!(!assigned_only_param(&query(&[])).unwrap());
        assert!(!assigned_only_param(&query(&[("assigned_only", "0")])).unwrap());
        assert!(assigned_only_param(&query(&[("assigned_only", "1")])).unwrap());
        assert!(assigned_only_param(&query(&[("assigned_only", "true")])).unwrap());
        assert!(assigned_only_param(&query(&[("assigned_only", "yes")])).is_err());
    }
}
