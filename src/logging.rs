//! Structured, leveled, credential-redacting logging sink.
//!
//! Built on `tracing`/`tracing-subscriber` rather than hand-rolled,
//! following the ambient-stack rule that ecosystem crates win over a
//! bespoke logger wherever the teacher repo already reaches for one.
//! A custom [`RedactingLayer`] inspects every event's fields before they
//! reach the writer: any field whose key matches `*_secret`, `*_token`,
//! `*_key`, or `authorization` (case-insensitive) is replaced with
//! `[REDACTED]`; any field named `host` is truncated to its first 10
//! characters plus an ellipsis. Request/response bodies are only ever
//! attached at `debug`/`trace` level, and only when explicitly enabled.

use crate::constants::{self, REDACTED_PLACEHOLDER};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(crate::error::Error::config(
                "log_format",
                format!("unrecognized log format '{other}', expected 'text' or 'json'"),
            )),
        }
    }
}

/// Installs the global tracing subscriber. Must be called exactly once,
/// before any other subsystem starts logging.
pub fn init(level: &str, format: LogFormat) -> Result<(), crate::error::Error> {
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = tracing_subscriber::EnvFilter::try_new(level)
        .map_err(|e| crate::error::Error::config("log_level", e.to_string()))?;
    let layer = RedactingLayer { writer: Mutex::new(std::io::stderr()), format };
    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| crate::error::Error::config("log_level", e.to_string()))
}

struct RedactingLayer<W> {
    writer: Mutex<W>,
    format: LogFormat,
}

struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self { message: None, fields: BTreeMap::new() }
    }

    fn record(&mut self, field: &Field, value: String) {
        let redacted = redact_field(field.name(), &value);
        if field.name() == "message" {
            self.message = Some(redacted);
        } else {
            self.fields.insert(field.name().to_string(), redacted);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }
}

/// Applies the mandatory redaction rules to a single field's value.
#[must_use]
fn redact_field(key: &str, value: &str) -> String {
    if constants::is_redacted_field_key(key) {
        REDACTED_PLACEHOLDER.to_string()
    } else if key.eq_ignore_ascii_case("host") {
        crate::error::redact_host(value)
    } else {
        value.to_string()
    }
}

impl<S, W> Layer<S> for RedactingLayer<W>
where
    S: Subscriber,
    W: std::io::Write + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let meta = event.metadata();
        let line = match self.format {
            LogFormat::Json => render_json(meta.level(), meta.target(), &visitor),
            LogFormat::Text => render_text(meta.level(), meta.target(), &visitor),
        };

        if let Ok(mut w) = self.writer.lock() {
            let _ = writeln!(w, "{line}");
        }
    }
}

fn render_text(level: &Level, target: &str, visitor: &FieldVisitor) -> String {
    let mut out = String::new();
    let _ = write!(out, "{level} {target}: {}", visitor.message.as_deref().unwrap_or(""));
    for (k, v) in &visitor.fields {
        let _ = write!(out, " {k}={v}");
    }
    out
}

fn render_json(level: &Level, target: &str, visitor: &FieldVisitor) -> String {
    let mut map = serde_json::Map::new();
    map.insert("level".into(), serde_json::Value::String(level.to_string()));
    map.insert("target".into(), serde_json::Value::String(target.to_string()));
    map.insert(
        "message".into(),
        serde_json::Value::String(visitor.message.clone().unwrap_or_default()),
    );
    for (k, v) in &visitor.fields {
        map.insert(k.clone(), serde_json::Value::String(v.clone()));
    }
    serde_json::Value::Object(map).to_string()
}

// ---- HTTP request/response logging helpers (used by transport::http) ----

fn should_redact_query_param(param_name: &str) -> bool {
    let lower = param_name.to_lowercase();
    matches!(
        lower.as_str(),
        "api_key"
            | "apikey"
            | "api-key"
            | "key"
            | "token"
            | "access_token"
            | "accesstoken"
            | "auth_token"
            | "authtoken"
            | "bearer_token"
            | "refresh_token"
            | "secret"
            | "api_secret"
            | "client_secret"
            | "password"
            | "passwd"
            | "pwd"
            | "signature"
            | "sig"
            | "session_id"
            | "sessionid"
            | "auth"
            | "authorization"
            | "credentials"
    )
}

/// Redacts sensitive query parameters from a URL before it is logged.
#[must_use]
pub fn redact_url_query_params(url: &str) -> String {
    let Some(query_start) = url.find('?') else {
        return url.to_string();
    };
    let base_url = &url[..query_start];
    let query_string = &url[query_start + 1..];

    let (query_part, fragment) = query_string
        .find('#')
        .map_or((query_string, None), |frag_start| {
            (&query_string[..frag_start], Some(&query_string[frag_start..]))
        });

    let redacted_params: Vec<String> = query_part
        .split('&')
        .map(|param| {
            param.find('=').map_or_else(
                || param.to_string(),
                |eq_pos| {
                    let name = &param[..eq_pos];
                    if should_redact_query_param(name) {
                        format!("{name}={REDACTED_PLACEHOLDER}")
                    } else {
                        param.to_string()
                    }
                },
            )
        })
        .collect();

    let mut result = format!("{base_url}?{}", redacted_params.join("&"));
    if let Some(frag) = fragment {
        result.push_str(frag);
    }
    result
}

/// Canonical status text, used in INFO-level request/response lines.
#[must_use]
pub const fn http_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        409 => "Conflict",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Redacts request/response body content for debug/trace logging when a
/// caller-supplied set of known secret values is in scope (e.g. the
/// account key, if it is ever echoed back by an endpoint).
#[must_use]
pub fn redact_secrets_in_text(text: &str, secrets: &[String]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if secret.len() >= constants::MIN_SECRET_LENGTH_FOR_BODY_REDACTION {
            result = result.replace(secret.as_str(), REDACTED_PLACEHOLDER);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_url_query_params_with_api_key() {
        let url = "https://api.example.com/users?api_key=secret123&page=1";
        assert_eq!(
            redact_url_query_params(url),
            "https://api.example.com/users?api_key=[REDACTED]&page=1"
        );
    }

    #[test]
    fn redact_url_query_params_no_query_string() {
        let url = "https://api.example.com/users";
        assert_eq!(redact_url_query_params(url), url);
    }

    #[test]
    fn redact_url_query_params_with_fragment() {
        let url = "https://api.example.com/users?api_key=secret123#section";
        assert_eq!(
            redact_url_query_params(url),
            "https://api.example.com/users?api_key=[REDACTED]#section"
        );
    }

    #[test]
    fn redact_field_hits_token_and_secret_suffixes() {
        assert_eq!(redact_field("client_secret", "abc"), REDACTED_PLACEHOLDER);
        assert_eq!(redact_field("access_token", "abc"), REDACTED_PLACEHOLDER);
        assert_eq!(redact_field("status", "200"), "200");
    }

    #[test]
    fn redact_field_truncates_host() {
        assert_eq!(redact_field("host", "akab-xxxxxxxxxx.luna.example.net"), "akab-xxxxx…");
    }

    #[test]
    fn redact_secrets_in_text_skips_short_values() {
        let out = redact_secrets_in_text("value is short", &["short".to_string()]);
        assert_eq!(out, "value is short");
    }

    #[test]
    fn http_status_text_known_and_unknown() {
        assert_eq!(http_status_text(200), "OK");
        assert_eq!(http_status_text(999), "");
    }
}
