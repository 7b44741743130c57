//! Centralized string and numeric constants for the gateway.

// HTTP Headers
pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_IF_MATCH: &str = "if-match";
pub const HEADER_IF_NONE_MATCH: &str = "if-none-match";
pub const HEADER_PREFER: &str = "prefer";
pub const HEADER_X_REQUEST_ID: &str = "x-request-id";
pub const HEADER_PAPI_USE_PREFIXES: &str = "papi-use-prefixes";
pub const HEADER_X_AKAMAI_CONTRACT: &str = "x-akamai-contract";
pub const HEADER_X_AKAMAI_GROUP: &str = "x-akamai-group";
pub const HEADER_X_AKAMAI_PURGE: &str = "x-akamai-purge";
pub const HEADER_AKAMAI_SIGNATURE_ALGORITHM: &str = "akamai-signature-algorithm";
pub const HEADER_RETRY_AFTER: &str = "retry-after";
pub const HEADER_ACCOUNT_SWITCH_KEY: &str = "x-akamai-account-key";

/// Caller-supplied headers allowed onto the wire; anything else is
/// dropped and logged at WARN by name only.
pub const HEADER_ALLOWLIST: &[&str] = &[
    HEADER_ACCEPT,
    HEADER_CONTENT_TYPE,
    HEADER_IF_MATCH,
    HEADER_IF_NONE_MATCH,
    HEADER_PREFER,
    HEADER_X_REQUEST_ID,
    HEADER_PAPI_USE_PREFIXES,
    HEADER_X_AKAMAI_CONTRACT,
    HEADER_X_AKAMAI_GROUP,
    HEADER_X_AKAMAI_PURGE,
    HEADER_AKAMAI_SIGNATURE_ALGORITHM,
];

// Content types
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Environment variables
pub const ENV_AKAMAI_HOST: &str = "AKAMAI_HOST";
pub const ENV_AKAMAI_CLIENT_TOKEN: &str = "AKAMAI_CLIENT_TOKEN";
pub const ENV_AKAMAI_CLIENT_SECRET: &str = "AKAMAI_CLIENT_SECRET";
pub const ENV_AKAMAI_ACCESS_TOKEN: &str = "AKAMAI_ACCESS_TOKEN";
pub const ENV_AKAMAI_ACCOUNT_KEY: &str = "AKAMAI_ACCOUNT_KEY";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "RETRY_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
pub const ENV_EDGERC_SECTION: &str = "EDGERC_SECTION";
pub const ENV_EDGERC_PATH: &str = "EDGERC_PATH";
pub const ENV_LOG_BODIES: &str = "LOG_BODIES";

// Edgerc file section keys
pub const EDGERC_KEY_HOST: &str = "host";
pub const EDGERC_KEY_CLIENT_TOKEN: &str = "client_token";
pub const EDGERC_KEY_CLIENT_SECRET: &str = "client_secret";
pub const EDGERC_KEY_ACCESS_TOKEN: &str = "access_token";
pub const EDGERC_KEY_ACCOUNT_KEY: &str = "account_key";
pub const EDGERC_DEFAULT_SECTION: &str = "default";

// Config numeric bounds
pub const MIN_MAX_RETRIES: u32 = 0;
pub const MAX_MAX_RETRIES: u32 = 10;
pub const MIN_RETRY_DELAY_MS: u64 = 100;
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// Recognized vendor host suffixes (EdgeGrid hosts end in one of these)
pub const VENDOR_HOST_SUFFIXES: &[&str] = &[".luna.akamaiapis.net", ".akamaiapis.net"];

// Registry
pub const TOOL_NAME_PREFIX: &str = "akamai";
pub const PAGINATION_PARAM_NAMES: &[&str] =
    &["limit", "offset", "page", "pageSize", "cursor", "continuationToken"];
pub const PAGINATION_CONTINUATION_FIELDS: &[&str] =
    &["nextPageToken", "cursor", "nextLink", "pagination.next"];
pub const PAGINATION_TOTAL_FIELDS: &[&str] = &["totalCount", "totalItems"];
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const HARD_MAX_PAGES: u32 = 100;

// Rate limiter
pub const RATE_LIMITER_CAPACITY: u32 = 20;
pub const RATE_LIMITER_REFILL_PER_SEC: u32 = 2;

// Circuit breaker
pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
pub const CIRCUIT_SUCCESS_THRESHOLD: u32 = 2;
pub const CIRCUIT_OPEN_TIMEOUT_SECS: u64 = 60;
pub const CIRCUIT_WINDOW_SECS: u64 = 10;

// Response cache
pub const CACHE_DEFAULT_TTL_SECS: u64 = 60;
pub const CACHE_MAX_ENTRIES: usize = 1_000;
pub const CACHE_HEALTHY_HIT_RATE: f64 = 0.20;
pub const CACHE_HEALTH_MIN_SAMPLES: u64 = 50;

// HTTP transport
pub const HTTP_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;
pub const HTTP_IDLE_TIMEOUT_SECS: u64 = 90;
pub const HTTP_MAX_IDLE_PER_HOST: usize = 10;

// Dispatcher / shutdown
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;
pub const JSONRPC_VERSION: &str = "2.0";
pub const JSONRPC_PARSE_ERROR: i64 = -32700;
pub const JSONRPC_METHOD_NOT_FOUND: i64 = -32601;
pub const JSONRPC_INVALID_PARAMS: i64 = -32602;
pub const JSONRPC_INTERNAL_ERROR: i64 = -32603;

// Logging
pub const MIN_SECRET_LENGTH_FOR_BODY_REDACTION: usize = 8;
pub const MAX_LOGGED_BODY_CHARS: usize = 1_000;
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Meta-tool names
pub const TOOL_RAW_REQUEST: &str = "raw_request";
pub const TOOL_LIST_OPERATIONS: &str = "list_operations";
pub const TOOL_REGISTRY_STATS: &str = "registry_stats";

/// Checks if a header name should be redacted in logs and is excluded
/// from the caller-supplied allowlist merge.
#[must_use]
pub fn is_auth_header(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "authorization" | "proxy-authorization" | "cookie")
}

/// Checks if a field key should be redacted per the logger's mandatory
/// redaction rule: `*_secret`, `*_token`, `*_key`, `authorization`.
#[must_use]
pub fn is_redacted_field_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower == "authorization"
        || lower.ends_with("_secret")
        || lower.ends_with("_token")
        || lower.ends_with("_key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_is_lowercase() {
        for h in HEADER_ALLOWLIST {
            assert_eq!(*h, h.to_lowercase());
        }
    }

    #[test]
    fn redacted_field_key_matches_suffixes() {
        assert!(is_redacted_field_key("clientSecret_secret"));
        assert!(is_redacted_field_key("access_token"));
        assert!(is_redacted_field_key("api_key"));
        assert!(is_redacted_field_key("Authorization"));
        assert!(!is_redacted_field_key("status"));
    }
}
