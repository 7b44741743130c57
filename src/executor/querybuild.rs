//! Query string assembly: scalars stringify directly, arrays become
//! repeated `name=v` pairs, booleans render as literal `true`/`false`.

use std::collections::HashMap;

/// Builds the ordered list of `(name, value)` pairs that make up a
/// query string, ready for URL-encoding by the caller.
#[must_use]
pub fn build(query_params: &HashMap<String, serde_json::Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut names: Vec<&String> = query_params.keys().collect();
    names.sort();

    for name in names {
        let value = &query_params[name];
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    pairs.push((name.clone(), scalar_to_string(item)));
                }
            }
            serde_json::Value::Null => {}
            other => pairs.push((name.clone(), scalar_to_string(other))),
        }
    }

    pairs
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Renders `pairs` into a `?`-prefixed, URL-encoded query string, or
/// an empty string if `pairs` is empty.
#[must_use]
pub fn to_query_string(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let encoded: Vec<String> =
        pairs.iter().map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))).collect();
    format!("?{}", encoded.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_stringify_directly() {
        let mut q = HashMap::new();
        q.insert("contractId".to_string(), serde_json::json!("ctr_A"));
        let pairs = build(&q);
        assert_eq!(pairs, vec![("contractId".to_string(), "ctr_A".to_string())]);
    }

    #[test]
    fn arrays_become_repeated_pairs() {
        let mut q = HashMap::new();
        q.insert("tag".to_string(), serde_json::json!(["a", "b"]));
        let pairs = build(&q);
        assert_eq!(pairs, vec![("tag".to_string(), "a".to_string()), ("tag".to_string(), "b".to_string())]);
    }

    #[test]
    fn booleans_render_as_literal_true_false() {
        let mut q = HashMap::new();
        q.insert("active".to_string(), serde_json::json!(true));
        let pairs = build(&q);
        assert_eq!(pairs, vec![("active".to_string(), "true".to_string())]);
    }

    #[test]
    fn to_query_string_empty_when_no_pairs() {
        assert_eq!(to_query_string(&[]), "");
    }

    #[test]
    fn to_query_string_joins_with_ampersand() {
        let pairs = vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())];
        assert_eq!(to_query_string(&pairs), "?a=1&b=2");
    }
}
