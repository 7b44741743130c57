//! EdgeGrid request signer: HMAC-SHA256 over a canonicalized request,
//! keyed by a timestamp-derived key so the raw client secret is used
//! only once per request and never leaves this module.

use crate::config::Credentials;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_ALGORITHM: &str = "EG1-HMAC-SHA256";

/// Compact ISO-8601 UTC timestamp with no separators, e.g.
/// `20260728T120000+0000`.
#[must_use]
pub fn format_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%Y%m%dT%H:%M:%S+0000").to_string()
}

fn content_hash(body: Option<&[u8]>) -> String {
    let Some(body) = body else {
        return String::new();
    };
    if body.is_empty() {
        return String::new();
    }
    let mut hasher = Sha256::new();
    hasher.update(body);
    BASE64.encode(hasher.finalize())
}

fn hmac_base64(key: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Signs one outbound request, returning the `Authorization` header
/// value. `path_and_query` must already be URL-encoded and include any
/// query string.
#[must_use]
pub fn sign(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path_and_query: &str,
    body: Option<&[u8]>,
    now: chrono::DateTime<chrono::Utc>,
    nonce: uuid::Uuid,
) -> String {
    let timestamp = format_timestamp(now);
    let auth_header_no_signature = format!(
        "{SIGNATURE_ALGORITHM} client_token={};access_token={};timestamp={};nonce={};",
        credentials.client_token, credentials.access_token, timestamp, nonce
    );

    let data_to_sign = format!(
        "{}\thttps\t{}\t{}\t\t{}\t{}",
        method.to_uppercase(),
        host,
        path_and_query,
        content_hash(body),
        auth_header_no_signature,
    );

    let signing_key = hmac_base64(credentials.client_secret.as_bytes(), &timestamp);
    let signature = hmac_base64(signing_key.as_bytes(), &data_to_sign);

    format!("{auth_header_no_signature}signature={signature}")
}
