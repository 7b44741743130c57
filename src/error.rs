//! Consolidated error handling for the gateway.
//!
//! All application errors funnel through a single `thiserror`-derived
//! `Error` enum, one variant per taxonomy row in the error handling
//! design, plus passthroughs for genuinely external error sources
//! (I/O, network, (de)serialization). Every variant can be rendered to
//! a redacted `JsonError` for the dispatcher's content envelope.

use crate::constants;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {field}: {reason}")]
    Config { field: Cow<'static, str>, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upstream returned {status}: {body}")]
    UpstreamClientError { status: u16, body: String, request_id: String },

    #[error("rate limited (HTTP 429), retries exhausted")]
    RateLimited { retry_after_secs: Option<u64>, request_id: String },

    #[error("upstream unavailable after retries: {reason}")]
    UpstreamUnavailable { reason: String, request_id: String },

    #[error("circuit open for host {host}")]
    CircuitOpen { host: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("response payload exceeded {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON representation of an error for the dispatcher's content envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: Cow<'static, str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    #[must_use]
    pub fn config(field: impl Into<Cow<'static, str>>, reason: impl Into<String>) -> Self {
        Self::Config { field: field.into(), reason: reason.into() }
    }

    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Error-kind identifier used by the taxonomy table and by tests.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "Io",
            Self::Network(_) => "Network",
            Self::Yaml(_) => "Yaml",
            Self::Json(_) => "Json",
            Self::Config { .. } => "ConfigError",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::UpstreamClientError { .. } => "UpstreamClientError",
            Self::RateLimited { .. } => "RateLimited",
            Self::UpstreamUnavailable { .. } => "UpstreamUnavailable",
            Self::CircuitOpen { .. } => "CircuitOpen",
            Self::Cancelled => "Cancelled",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::Protocol(_) => "ProtocolError",
            Self::Anyhow(_) => "Unknown",
        }
    }

    /// Whether this error represents a protocol-level fault that must be
    /// surfaced as a JSON-RPC `error` object rather than wrapped in the
    /// tool-call content envelope.
    #[must_use]
    pub const fn is_protocol_fault(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Convert to the redacted structured form used in tool-call error
    /// envelopes. Never includes credential values; request paths are
    /// reported without query strings.
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let details = match self {
            Self::Config { field, reason } => {
                Some(json!({ "field": field, "reason": reason }))
            }
            Self::UpstreamClientError { status, body, request_id } => Some(json!({
                "status": status,
                "body": truncate(body, constants::MAX_LOGGED_BODY_CHARS),
                "requestId": request_id,
            })),
            Self::RateLimited { retry_after_secs, request_id } => Some(json!({
                "retryAfterSecs": retry_after_secs,
                "requestId": request_id,
            })),
            Self::UpstreamUnavailable { reason, request_id } => Some(json!({
                "reason": reason,
                "requestId": request_id,
            })),
            Self::CircuitOpen { host } => Some(json!({ "host": redact_host(host) })),
            Self::PayloadTooLarge { limit_bytes } => Some(json!({ "limitBytes": limit_bytes })),
            _ => None,
        };

        JsonError {
            error_type: Cow::Borrowed(self.kind()),
            message: self.to_string(),
            details,
        }
    }

    /// True if this failure should be retried by the transport retry
    /// driver given the current outcome. Upstream-level retry
    /// classification itself lives in `transport::retry`; this is a
    /// coarse check for already-constructed `Error` values seen at
    /// higher layers (e.g. the executor deciding whether to surface an
    /// error to the caller as-is).
    #[must_use]
    pub const fn is_retryable_kind(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::UpstreamUnavailable { .. })
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max).map_or(s.len(), |(i, _)| i);
        format!("{}…", &s[..end])
    }
}

/// Truncates a host to its first 10 characters plus an ellipsis, per the
/// mandatory credential-redaction rule.
#[must_use]
pub fn redact_host(host: &str) -> String {
    if host.chars().count() <= 10 {
        host.to_string()
    } else {
        let prefix: String = host.chars().take(10).collect();
        format!("{prefix}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_host_short_unchanged() {
        assert_eq!(redact_host("short"), "short");
    }

    #[test]
    fn redact_host_truncates_long() {
        assert_eq!(redact_host("akab-xxxxxxxxxx.luna.example.net"), "akab-xxxxx…");
    }

    #[test]
    fn kind_matches_taxonomy_row() {
        let e = Error::CircuitOpen { host: "akab-xxxxxxxxxx".into() };
        assert_eq!(e.kind(), "CircuitOpen");
        assert!(!e.is_retryable_kind());
    }

    #[test]
    fn to_json_never_includes_raw_message_for_config_value() {
        let e = Error::config("host", "missing recognized vendor suffix");
        let j = e.to_json();
        assert_eq!(j.error_type, "ConfigError");
        assert!(j.details.is_some());
    }

    #[test]
    fn truncate_is_char_boundary_safe_on_multibyte_bodies() {
        let body = "€".repeat(2000);
        let e = Error::UpstreamClientError { status: 500, body: body.clone(), request_id: String::new() };
        let j = e.to_json();
        let rendered = j.details.unwrap()["body"].as_str().unwrap().to_string();
        assert!(rendered.starts_with('€'));
        assert!(rendered.ends_with('…'));
    }
}
