//! Deterministic tool-name generation: `toolName` is a pure function of
//! `(product, operationId)`; regenerating a registry from the same
//! inputs yields identical names. Collisions are resolved by appending
//! `_2`, `_3`, … in stable iteration order.

use crate::constants::TOOL_NAME_PREFIX;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn non_alnum_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static regex is valid"))
}

/// Lowercases, replaces any non-`[a-z0-9]` run with a single
/// underscore, and trims leading/trailing underscores.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let collapsed = non_alnum_run().replace_all(&lowered, "_");
    collapsed.trim_matches('_').to_string()
}

/// Generates the base tool name for a `(product, operationId)` pair,
/// before collision resolution.
#[must_use]
pub fn base_tool_name(product: &str, operation_id: &str) -> String {
    format!("{TOOL_NAME_PREFIX}_{}_{}", sanitize(product), sanitize(operation_id))
}

/// Resolves a candidate tool name against the set of names already
/// assigned in this load, appending `_2`, `_3`, … on collision.
pub fn make_unique(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut suffix = 2;
    loop {
        let attempt = format!("{candidate}_{suffix}");
        if used.insert(attempt.clone()) {
            return attempt;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_non_alnum_runs() {
        assert_eq!(sanitize("Papi V1!!Groups"), "papi_v1_groups");
    }

    #[test]
    fn sanitize_trims_leading_trailing_underscores() {
        assert_eq!(sanitize("--hello--"), "hello");
    }

    #[test]
    fn base_tool_name_is_deterministic() {
        let a = base_tool_name("papi", "listProperties");
        let b = base_tool_name("papi", "listProperties");
        assert_eq!(a, b);
        assert_eq!(a, "akamai_papi_listproperties");
    }

    #[test]
    fn make_unique_resolves_collisions_in_order() {
        let mut used = HashSet::new();
        let first = make_unique("akamai_papi_list".to_string(), &mut used);
        let second = make_unique("akamai_papi_list".to_string(), &mut used);
        let third = make_unique("akamai_papi_list".to_string(), &mut used);
        assert_eq!(first, "akamai_papi_list");
        assert_eq!(second, "akamai_papi_list_2");
        assert_eq!(third, "akamai_papi_list_3");
    }
}
