//! Cache key computation: canonicalizes method, path, query, and the
//! subset of headers that affect response variance, then defers to the
//! transport cache's fingerprint function.
//!
//! Per the open-question decision recorded in the design ledger, the
//! account key is folded into the fingerprint to avoid cross-account
//! cache bleed.

use crate::constants::{HEADER_PAPI_USE_PREFIXES, HEADER_PREFER, HEADER_X_AKAMAI_CONTRACT, HEADER_X_AKAMAI_GROUP};
use crate::transport::cache::ResponseCache;

const VARIANCE_HEADERS: &[&str] = &[HEADER_PREFER, HEADER_PAPI_USE_PREFIXES, HEADER_X_AKAMAI_CONTRACT, HEADER_X_AKAMAI_GROUP];

/// Computes the canonical cache key for one GET call.
#[must_use]
pub fn compute(
    method: &str,
    path: &str,
    query_pairs: &[(String, String)],
    assembled_headers: &[(String, String)],
    body: Option<&serde_json::Value>,
    account_key: Option<&str>,
) -> String {
    let varying_headers: Vec<(String, String)> = assembled_headers
        .iter()
        .filter(|(name, _)| VARIANCE_HEADERS.contains(&name.as_str()))
        .cloned()
        .collect();

    ResponseCache::fingerprint(method, path, query_pairs, &varying_headers, body, account_key)
}
