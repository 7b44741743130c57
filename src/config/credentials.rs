//! `Credentials`: the four EdgeGrid secrets plus optional account key.
//!
//! Loaded once at startup, held behind the root `Server` value, never
//! written to any log or error message. `Debug` is implemented by hand
//! so an accidental `{:?}` never leaks a secret — the teacher's
//! `error.rs`/`logging.rs` apply the same "never derive Debug naively
//! on secrets" discipline to credential-bearing types.

use crate::constants;
use crate::error::{redact_host, Error};

#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub client_token: String,
    pub client_secret: String,
    pub access_token: String,
    pub account_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &redact_host(&self.host))
            .field("client_token", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("account_key", &self.account_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    /// Validates non-empty fields and a recognized vendor host suffix.
    /// Returns the first invalid field, naming it but never echoing the
    /// offending value.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::config("host", "must not be empty"));
        }
        if !constants::VENDOR_HOST_SUFFIXES.iter().any(|suffix| self.host.ends_with(suffix)) {
            return Err(Error::config(
                "host",
                "does not contain a recognized vendor suffix (expected one of .luna.akamaiapis.net, .akamaiapis.net)",
            ));
        }
        if self.client_token.is_empty() {
            return Err(Error::config("client_token", "must not be empty"));
        }
        if self.client_secret.is_empty() {
            return Err(Error::config("client_secret", "must not be empty"));
        }
        if self.access_token.is_empty() {
            return Err(Error::config("access_token", "must not be empty"));
        }
        Ok(())
    }
}
