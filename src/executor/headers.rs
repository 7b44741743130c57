//! Header assembly: a minimal default set, merged with caller-supplied
//! headers through the allowlist. Anything outside the allowlist is
//! dropped and its name (never its value) logged at WARN.

use crate::constants::{self, HEADER_ACCEPT, HEADER_ALLOWLIST, HEADER_CONTENT_TYPE};

/// Builds the outbound header list for one call.
#[must_use]
pub fn assemble(caller_headers: &std::collections::HashMap<String, String>, has_body: bool) -> Vec<(String, String)> {
    let mut out = vec![(HEADER_ACCEPT.to_string(), constants::CONTENT_TYPE_JSON.to_string())];
    if has_body {
        out.push((HEADER_CONTENT_TYPE.to_string(), constants::CONTENT_TYPE_JSON.to_string()));
    }

    for (name, value) in caller_headers {
        let lower = name.to_lowercase();
        if HEADER_ALLOWLIST.contains(&lower.as_str()) {
            if let Some(slot) = out.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&lower)) {
                slot.1 = value.clone();
            } else {
                out.push((lower, value.clone()));
            }
        } else {
            tracing::warn!(header = %lower, "dropping header outside allowlist");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_present_without_body() {
        let out = assemble(&HashMap::new(), false);
        assert!(out.iter().any(|(n, v)| n == "accept" && v == "application/json"));
        assert!(!out.iter().any(|(n, _)| n == "content-type"));
    }

    #[test]
    fn content_type_added_when_body_present() {
        let out = assemble(&HashMap::new(), true);
        assert!(out.iter().any(|(n, _)| n == "content-type"));
    }

    #[test]
    fn allowlisted_header_merged_case_insensitively() {
        let mut h = HashMap::new();
        h.insert("X-Request-Id".to_string(), "abc".to_string());
        let out = assemble(&h, false);
        assert!(out.iter().any(|(n, v)| n == "x-request-id" && v == "abc"));
    }

    #[test]
    fn disallowed_header_dropped() {
        let mut h = HashMap::new();
        h.insert("Authorization".to_string(), "secret".to_string());
        let out = assemble(&h, false);
        assert!(!out.iter().any(|(n, _)| n == "authorization"));
    }

    #[test]
    fn idempotent_allowlist_filter() {
        let mut h = HashMap::new();
        h.insert("Prefer".to_string(), "respond-async".to_string());
        h.insert("X-Evil".to_string(), "nope".to_string());
        let once = assemble(&h, false);
        let once_map: HashMap<String, String> = once.into_iter().collect();
        let again = assemble(&once_map, false);
        let again_map: HashMap<String, String> = again.into_iter().collect();
        assert_eq!(once_map, again_map);
    }
}
