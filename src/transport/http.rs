//! HTTP transport: a persistent, per-process `reqwest::Client` with
//! TLS >= 1.2, connection pooling, and a bounded response body read.

use crate::constants::{HTTP_IDLE_TIMEOUT_SECS, HTTP_MAX_BODY_BYTES, HTTP_MAX_IDLE_PER_HOST};
use crate::error::Error;
use std::time::Duration;

/// Builds the shared client used for every outbound call to the
/// vendor. `request_timeout` comes from `Settings::request_timeout_ms`.
///
/// # Errors
/// Returns an error if the underlying TLS backend fails to initialize.
pub fn build_client(request_timeout: Duration, user_agent: &str) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .pool_idle_timeout(Duration::from_secs(HTTP_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(HTTP_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|e| Error::config("http_client", e.to_string()))
}

/// Reads a response body, failing with `Error::PayloadTooLarge` if it
/// exceeds the hard cap rather than buffering an unbounded amount of
/// memory.
///
/// # Errors
/// Returns `Error::PayloadTooLarge` if the body exceeds
/// `HTTP_MAX_BODY_BYTES`, or `Error::Network` on a transport failure.
pub async fn read_bounded_body(response: reqwest::Response) -> Result<Vec<u8>, Error> {
    if let Some(len) = response.content_length() {
        if len > HTTP_MAX_BODY_BYTES {
            return Err(Error::PayloadTooLarge { limit_bytes: HTTP_MAX_BODY_BYTES });
        }
    }

    use futures_util::StreamExt;
    let mut stream = response.bytes_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buf.len() as u64 + chunk.len() as u64 > HTTP_MAX_BODY_BYTES {
            return Err(Error::PayloadTooLarge { limit_bytes: HTTP_MAX_BODY_BYTES });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds_with_reasonable_timeout() {
        let client = build_client(Duration::from_secs(30), "akamai-mcp-gateway/0.1");
        assert!(client.is_ok());
    }
}
