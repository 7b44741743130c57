//! Path template substitution: each `{name}` placeholder is replaced
//! by the URL-encoded supplied value. Unused `pathParams` are ignored.

use crate::error::Error;
use std::collections::HashMap;

/// Substitutes every `{name}` in `template` with its URL-encoded value
/// from `path_params`.
///
/// # Errors
/// Returns `Error::InvalidArgument` if a placeholder has no
/// corresponding entry (validation should have already caught this,
/// but the build step re-asserts it defensively).
pub fn build(template: &str, path_params: &HashMap<String, serde_json::Value>) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &rest[start + 1..start + end];
        let value = path_params
            .get(name)
            .ok_or_else(|| Error::invalid_argument(format!("missing required parameter '{name}'")))?;
        let scalar = scalar_to_string(value);
        out.push_str(&urlencoding::encode(&scalar));
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extracts the `{name}` placeholders from a path template, in order.
#[must_use]
pub fn placeholder_names(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + end]);
        rest = &rest[start + end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_single_placeholder() {
        let mut p = HashMap::new();
        p.insert("propertyId".to_string(), serde_json::json!("prp_1"));
        assert_eq!(build("/properties/{propertyId}", &p).unwrap(), "/properties/prp_1");
    }

    #[test]
    fn url_encodes_special_characters() {
        let mut p = HashMap::new();
        p.insert("id".to_string(), serde_json::json!("a b/c"));
        assert_eq!(build("/x/{id}", &p).unwrap(), "/x/a%20b%2Fc");
    }

    #[test]
    fn unused_path_params_ignored() {
        let mut p = HashMap::new();
        p.insert("propertyId".to_string(), serde_json::json!("prp_1"));
        p.insert("unused".to_string(), serde_json::json!("x"));
        assert_eq!(build("/properties/{propertyId}", &p).unwrap(), "/properties/prp_1");
    }

    #[test]
    fn missing_placeholder_value_errors() {
        let p = HashMap::new();
        let err = build("/properties/{propertyId}", &p).unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn placeholder_names_extracts_all() {
        assert_eq!(placeholder_names("/a/{x}/b/{y}"), vec!["x", "y"]);
    }

    #[test]
    fn build_then_placeholder_extraction_round_trips_identity_on_valid_input() {
        let template = "/properties/{propertyId}/versions/{version}";
        let mut p = HashMap::new();
        p.insert("propertyId".to_string(), serde_json::json!("prp_1"));
        p.insert("version".to_string(), serde_json::json!("3"));
        let built = build(template, &p).unwrap();
        assert_eq!(built, "/properties/prp_1/versions/3");
        assert_eq!(placeholder_names(template).len(), 2);
    }
}
