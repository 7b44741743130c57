//! Confirms secret values never surface through the public error/debug
//! surface, building on (not duplicating) the narrower unit tests
//! already in `config::credentials` and `error`.

use akamai_mcp_gateway::config::{Credentials, Settings};
use akamai_mcp_gateway::server::Server;

const SECRET_TOKEN: &str = "akab-super-secret-client-token-zzzz";
const SECRET_SECRET: &str = "akab-super-secret-client-secret-zzzz";
const SECRET_ACCESS: &str = "akab-super-secret-access-token-zzzz";

fn leaky_credentials() -> Credentials {
    Credentials {
        host: "example.com".to_string(),
        client_token: SECRET_TOKEN.to_string(),
        client_secret: SECRET_SECRET.to_string(),
        access_token: SECRET_ACCESS.to_string(),
        account_key: Some("acct-super-secret-key".to_string()),
    }
}

#[test]
fn validate_rejects_an_unrecognized_host_without_echoing_any_secret() {
    let creds = leaky_credentials();
    let err = creds.validate().unwrap_err();

    let message = err.to_string();
    let json = serde_json::to_string(&err.to_json()).unwrap();

    for secret in [SECRET_TOKEN, SECRET_SECRET, SECRET_ACCESS, "acct-super-secret-key"] {
        assert!(!message.contains(secret), "Display leaked a secret: {message}");
        assert!(!json.contains(secret), "to_json leaked a secret: {json}");
    }
    assert_eq!(err.kind(), "ConfigError");
}

#[test]
fn debug_formatting_never_includes_any_of_the_four_secrets() {
    let creds = leaky_credentials();
    let rendered = format!("{creds:?}");

    for secret in [SECRET_TOKEN, SECRET_SECRET, SECRET_ACCESS, "acct-super-secret-key"] {
        assert!(!rendered.contains(secret), "Debug leaked a secret: {rendered}");
    }
    assert!(rendered.contains("[REDACTED]"));
}

#[test]
fn host_is_truncated_rather_than_echoed_verbatim_in_debug_output() {
    let mut creds = leaky_credentials();
    creds.host = "akab-0123456789abcdef.luna.akamaiapis.net".to_string();
    let rendered = format!("{creds:?}");
    assert!(!rendered.contains("akab-0123456789abcdef"), "full host leaked into Debug output: {rendered}");
}

/// `Server::new` never calls `Credentials::validate` itself (only
/// `config::loader::load_credentials` does), so constructing a server
/// with secret-shaped-but-invalid credentials must not panic and must
/// not surface those secrets in the registry-load error path either.
#[test]
fn server_construction_with_invalid_credentials_does_not_leak_them_on_registry_error() {
    let empty_dir = tempfile::tempdir().unwrap();
    let creds = leaky_credentials();
    let err = Server::new(empty_dir.path(), creds, &Settings::default(), 5).unwrap_err();

    let message = err.to_string();
    for secret in [SECRET_TOKEN, SECRET_SECRET, SECRET_ACCESS] {
        assert!(!message.contains(secret), "registry-load error leaked a credential: {message}");
    }
    assert_eq!(err.kind(), "ConfigError", "an empty spec tree should fail registry load, not credential validation");
}
