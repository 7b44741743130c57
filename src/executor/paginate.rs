//! Pagination driver helpers: continuation-token extraction and
//! shallow cross-page merging. The actual network loop lives in
//! `executor::mod`, which owns the HTTP round-trips; this module is
//! pure so the merge/extract laws are independently testable.

use crate::constants::{PAGINATION_CONTINUATION_FIELDS, PAGINATION_PARAM_NAMES, PAGINATION_TOTAL_FIELDS};
use crate::registry::{Operation, ParamLocation};
use serde_json::Value;

/// Looks up a dotted field path (`"pagination.next"`) inside a JSON
/// object.
fn get_dotted<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Extracts a non-empty continuation token from a page body, checking
/// the recognized field names in priority order.
#[must_use]
pub fn extract_continuation(body: &Value) -> Option<String> {
    for field in PAGINATION_CONTINUATION_FIELDS {
        if let Some(value) = get_dotted(body, field) {
            match value {
                Value::String(s) if !s.is_empty() => return Some(s.clone()),
                Value::Number(n) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// Extracts the first `totalCount`/`totalItems` value seen across
/// pages, in fetch order.
#[must_use]
pub fn first_total_items(pages: &[Value]) -> Option<u64> {
    for page in pages {
        for field in PAGINATION_TOTAL_FIELDS {
            if let Some(value) = get_dotted(page, field) {
                if let Some(n) = value.as_u64() {
                    return Some(n);
                }
            }
        }
    }
    None
}

/// Merges pages in fetch order: array-shaped fields with the same
/// name are concatenated across pages; all other fields take the
/// value from the last page that defines them.
#[must_use]
pub fn merge_pages(pages: &[Value]) -> Value {
    let mut merged = serde_json::Map::new();

    for page in pages {
        let Some(obj) = page.as_object() else {
            continue;
        };
        for (key, value) in obj {
            match (merged.get_mut(key), value) {
                (Some(Value::Array(existing)), Value::Array(items)) => {
                    existing.extend(items.clone());
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }

    Value::Object(merged)
}

/// Returns the query parameter name that should carry the
/// continuation token for this operation: the operation's own query
/// parameter whose name is in the recognized pagination set.
#[must_use]
pub fn cursor_param_name(op: &Operation) -> Option<&str> {
    op.parameters
        .iter()
        .filter(|p| p.location == ParamLocation::Query)
        .map(|p| p.name.as_str())
        .find(|name| PAGINATION_PARAM_NAMES.iter().any(|recognized| recognized.eq_ignore_ascii_case(name)))
}

/// Extracts the `rel="next"` URL from an RFC 5988 `Link` header value
/// (`<url>; rel="next", <url>; rel="prev"`), if present.
#[must_use]
pub fn parse_link_next(header: &str) -> Option<String> {
    header.split(',').find_map(|segment| {
        let segment = segment.trim();
        let (url_part, params) = segment.split_once(';')?;
        let is_next = params.split(';').any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let url = url_part.trim().trim_start_matches('<').trim_end_matches('>');
        if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        }
    })
}

/// Reduces an absolute URL from a `Link` header down to its path and
/// query string, since `Transport` addresses the signed host itself and
/// expects a request target rather than a full URL.
#[must_use]
pub fn path_and_query_from_link(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path_start = after_scheme.find('/')?;
    Some(after_scheme[path_start..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_next_page_token() {
        let body = json!({"items": [1], "nextPageToken": "abc"});
        assert_eq!(extract_continuation(&body), Some("abc".to_string()));
    }

    #[test]
    fn extracts_nested_pagination_next() {
        let body = json!({"items": [1], "pagination": {"next": "p2"}});
        assert_eq!(extract_continuation(&body), Some("p2".to_string()));
    }

    #[test]
    fn empty_continuation_field_is_treated_as_absent() {
        let body = json!({"items": [1], "cursor": ""});
        assert_eq!(extract_continuation(&body), None);
    }

    #[test]
    fn merges_array_fields_across_pages_in_fetch_order() {
        let pages = vec![json!({"items": [1]}), json!({"items": [2]}), json!({"items": [3]})];
        let merged = merge_pages(&pages);
        assert_eq!(merged, json!({"items": [1, 2, 3]}));
    }

    #[test]
    fn non_array_fields_take_last_page_value() {
        let pages = vec![json!({"status": "partial"}), json!({"status": "complete"})];
        let merged = merge_pages(&pages);
        assert_eq!(merged["status"], "complete");
    }

    #[test]
    fn first_total_items_from_earliest_page() {
        let pages = vec![json!({"items": []}), json!({"totalItems": 42}), json!({"totalItems": 99})];
        assert_eq!(first_total_items(&pages), Some(42));
    }

    #[test]
    fn parses_next_rel_out_of_multi_segment_link_header() {
        let header = r#"<https://example.com/api/v1/things?page=2>; rel="next", <https://example.com/api/v1/things?page=1>; rel="prev""#;
        assert_eq!(parse_link_next(header), Some("https://example.com/api/v1/things?page=2".to_string()));
    }

    #[test]
    fn no_next_rel_yields_none() {
        let header = r#"<https://example.com/api/v1/things?page=1>; rel="prev""#;
        assert_eq!(parse_link_next(header), None);
    }

    #[test]
    fn extracts_path_and_query_from_absolute_link_url() {
        let url = "https://akab-xxxxxxxxxx.luna.akamaiapis.net/papi/v1/properties?page=2&limit=50";
        assert_eq!(path_and_query_from_link(url), Some("/papi/v1/properties?page=2&limit=50".to_string()));
    }
}
