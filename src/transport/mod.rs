//! Signed Transport: composes the signer, rate limiter, retry driver,
//! circuit breaker, response cache, and HTTP client into the single
//! call the executor invokes for each HTTP round-trip (§4.I step 6).

pub mod cache;
pub mod circuit_breaker;
pub mod http;
pub mod rate_limiter;
pub mod retry;
pub mod signer;

use crate::config::{Credentials, Settings};
use crate::error::Error;
use cache::ResponseCache;
use circuit_breaker::CircuitBreakerManager;
use rate_limiter::RateLimiter;
use retry::{Outcome, RetryPolicy};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One outbound HTTP call, already fully assembled by the executor.
pub struct OutboundRequest<'a> {
    pub method: &'a str,
    pub path_and_query: &'a str,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub cache_key: Option<String>,
}

pub struct OutboundResponse {
    pub status: u16,
    pub body: serde_json::Value,
    pub from_cache: bool,
    /// Raw `Link` response header, when the upstream declared one
    /// (RFC 5988 continuation idiom). `None` on cache hits.
    pub link_header: Option<String>,
}

pub struct Transport {
    client: reqwest::Client,
    credentials: Credentials,
    rate_limiter: RateLimiter,
    circuit_breakers: CircuitBreakerManager,
    cache: ResponseCache,
    retry_policy: RetryPolicy,
    log_bodies: bool,
}

impl Transport {
    /// Builds the transport's HTTP client and wires its subsystems
    /// together.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(credentials: Credentials, settings: &Settings, user_agent: &str) -> Result<Self, Error> {
        let client = http::build_client(Duration::from_millis(settings.request_timeout_ms), user_agent)?;
        Ok(Self {
            client,
            credentials,
            rate_limiter: RateLimiter::default(),
            circuit_breakers: CircuitBreakerManager::new(),
            cache: ResponseCache::default(),
            retry_policy: RetryPolicy { max_retries: settings.max_retries, base_delay_ms: settings.retry_delay_ms },
            log_bodies: settings.log_bodies,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Secret values to scrub out of a logged body on top of the header
    /// redaction already applied, in case an upstream ever echoes one back.
    fn known_secrets(&self) -> Vec<String> {
        let mut secrets = vec![self.credentials.client_secret.clone(), self.credentials.access_token.clone()];
        if let Some(key) = &self.credentials.account_key {
            secrets.push(key.clone());
        }
        secrets
    }

    /// Executes one HTTP call end to end: cache lookup, rate limit,
    /// circuit breaker, sign, send, retry, cache store.
    ///
    /// # Errors
    /// Returns `Error::CircuitOpen`, `Error::Cancelled`,
    /// `Error::UpstreamClientError`, `Error::UpstreamUnavailable`, or
    /// `Error::PayloadTooLarge` per the error taxonomy.
    pub async fn execute(&self, req: OutboundRequest<'_>, cancel: &CancellationToken) -> Result<OutboundResponse, Error> {
        let is_get = req.method.eq_ignore_ascii_case("GET");

        if is_get {
            if let Some(key) = &req.cache_key {
                if let Some(cached) = self.cache.get(key) {
                    return Ok(OutboundResponse { status: 200, body: cached, from_cache: true, link_header: None });
                }
            }
        }

        self.circuit_breakers.admit(&self.credentials.host)?;
        self.rate_limiter.admit(cancel).await?;

        let host = self.credentials.host.clone();
        let method = req.method.to_string();
        let path_and_query = req.path_and_query.to_string();
        let headers = req.headers;
        let body = req.body;

        let result = retry::run(self.retry_policy, cancel, |_attempt| {
            self.attempt(&host, &method, &path_and_query, &headers, body.as_deref())
        })
        .await;

        let (status, body, link_header) = result?;

        if is_get {
            if let Some(key) = req.cache_key {
                if ResponseCache::should_cache(is_get, status) {
                    self.cache.set(key, body.clone());
                }
            }
        }

        Ok(OutboundResponse { status, body, from_cache: false, link_header })
    }

    async fn attempt(
        &self,
        host: &str,
        method: &str,
        path_and_query: &str,
        headers: &[(String, String)],
        body: Option<&[u8]>,
    ) -> Outcome<(u16, serde_json::Value, Option<String>)> {
        match self.send_once(host, method, path_and_query, headers, body).await {
            Ok((status, body, link_header)) => {
                if (400..500).contains(&status) && !matches!(status, 408 | 429) {
                    self.circuit_breakers.record_failure(host);
                    Outcome::Fatal(Error::UpstreamClientError { status, body: body.to_string(), request_id: String::new() })
                } else if retry::is_retryable_status(status) {
                    self.circuit_breakers.record_failure(host);
                    Outcome::Retryable { retry_after: None }
                } else {
                    self.circuit_breakers.record_success(host);
                    Outcome::Success((status, body, link_header))
                }
            }
            Err(Error::Network(e)) => {
                self.circuit_breakers.record_failure(host);
                if e.is_timeout() || e.is_connect() {
                    Outcome::Retryable { retry_after: None }
                } else {
                    Outcome::Fatal(Error::Network(e))
                }
            }
            Err(other) => Outcome::Fatal(other),
        }
    }

    async fn send_once(
        &self,
        host: &str,
        method: &str,
        path_and_query: &str,
        headers: &[(String, String)],
        body: Option<&[u8]>,
    ) -> Result<(u16, serde_json::Value, Option<String>), Error> {
        let now = chrono::Utc::now();
        let nonce = uuid::Uuid::new_v4();
        let auth = signer::sign(&self.credentials, method, host, path_and_query, body, now, nonce);

        let url = format!("https://{host}{path_and_query}");
        if self.log_bodies {
            let redacted_url = crate::logging::redact_url_query_params(&url);
            let redacted_body = body.map(|b| {
                crate::logging::redact_secrets_in_text(&String::from_utf8_lossy(b), &self.known_secrets())
            });
            tracing::debug!(method = %method, url = %redacted_url, body = redacted_body.as_deref(), "sending request");
        }

        let http_method = reqwest::Method::from_bytes(method.as_bytes()).unwrap_or(reqwest::Method::GET);
        let mut builder = self.client.request(http_method, url).header("Authorization", auth);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let link_header = response.headers().get("link").and_then(|v| v.to_str().ok()).map(str::to_string);
        let bytes = http::read_bounded_body(response).await?;

        if self.log_bodies {
            let redacted_body = crate::logging::redact_secrets_in_text(&String::from_utf8_lossy(&bytes), &self.known_secrets());
            tracing::trace!(status, status_text = crate::logging::http_status_text(status), body = %redacted_body, "received response");
        }

        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}));
        Ok((status, body, link_header))
    }
}
