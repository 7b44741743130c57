//! Loads `Credentials` and `Settings` from environment and an
//! INI-like edgerc file, environment taking precedence.
//!
//! The file format is not real INI — no nesting, no multi-line values —
//! so it is parsed with a small hand-rolled line scanner, the same
//! shape the teacher's config manager builds before validating into
//! typed structs.

use super::credentials::Credentials;
use super::settings::Settings;
use crate::constants;
use crate::error::Error;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
struct EdgercSection {
    values: HashMap<String, String>,
}

/// Parses an edgerc-format string into section -> key -> value maps.
/// `#` and `;` begin comments; blank lines are ignored.
fn parse_edgerc(contents: &str) -> HashMap<String, EdgercSection> {
    let mut sections: HashMap<String, EdgercSection> = HashMap::new();
    let mut current: Option<String> = None;

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let Some(section_name) = current.as_ref() else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let section = sections.entry(section_name.clone()).or_default();
        section.values.insert(key.trim().to_string(), value.trim().to_string());
    }

    sections
}

fn default_edgerc_path() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".edgerc")
}

fn read_edgerc_section(path: &Path, section_name: &str) -> Option<EdgercSection> {
    let contents = std::fs::read_to_string(path).ok()?;
    let sections = parse_edgerc(&contents);
    sections.get(section_name).cloned()
}

/// Loads credentials: environment variables take precedence, falling
/// back to the named section of the edgerc file.
pub fn load_credentials() -> Result<Credentials, Error> {
    let edgerc_path = std::env::var(constants::ENV_EDGERC_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_edgerc_path());
    let section_name = std::env::var(constants::ENV_EDGERC_SECTION)
        .unwrap_or_else(|_| constants::EDGERC_DEFAULT_SECTION.to_string());
    let file_section = read_edgerc_section(&edgerc_path, &section_name).unwrap_or_default();

    let field = |env_var: &str, file_key: &str| -> String {
        std::env::var(env_var)
            .ok()
            .or_else(|| file_section.values.get(file_key).cloned())
            .unwrap_or_default()
    };

    let credentials = Credentials {
        host: field(constants::ENV_AKAMAI_HOST, constants::EDGERC_KEY_HOST),
        client_token: field(constants::ENV_AKAMAI_CLIENT_TOKEN, constants::EDGERC_KEY_CLIENT_TOKEN),
        client_secret: field(constants::ENV_AKAMAI_CLIENT_SECRET, constants::EDGERC_KEY_CLIENT_SECRET),
        access_token: field(constants::ENV_AKAMAI_ACCESS_TOKEN, constants::EDGERC_KEY_ACCESS_TOKEN),
        account_key: {
            let v = field(constants::ENV_AKAMAI_ACCOUNT_KEY, constants::EDGERC_KEY_ACCOUNT_KEY);
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        },
    };

    credentials.validate()?;
    Ok(credentials)
}

fn parse_bounded<T>(env_var: &str, field_name: &'static str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
{
    match std::env::var(env_var) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(field_name, format!("'{raw}' is not a valid number"))),
        Err(_) => Ok(None),
    }
}

/// Loads settings from environment, falling back to defaults. Validates
/// the composed result so an invalid override fails fast at startup.
pub fn load_settings() -> Result<Settings, Error> {
    let mut settings = Settings::default();

    if let Ok(level) = std::env::var(constants::ENV_LOG_LEVEL) {
        settings.log_level = level;
    }
    if let Some(v) = parse_bounded::<u32>(constants::ENV_MAX_RETRIES, "max_retries")? {
        settings.max_retries = v;
    }
    if let Some(v) = parse_bounded::<u64>(constants::ENV_RETRY_DELAY_MS, "retry_delay_ms")? {
        settings.retry_delay_ms = v;
    }
    if let Some(v) = parse_bounded::<u64>(constants::ENV_REQUEST_TIMEOUT_MS, "request_timeout_ms")? {
        settings.request_timeout_ms = v;
    }
    if let Ok(raw) = std::env::var(constants::ENV_LOG_BODIES) {
        settings.log_bodies = matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_edgerc_basic_section() {
        let contents = "[default]\nhost = akab-x.luna.akamaiapis.net\nclient_token = ct\n";
        let sections = parse_edgerc(contents);
        let default = sections.get("default").unwrap();
        assert_eq!(default.values.get("host").unwrap(), "akab-x.luna.akamaiapis.net");
        assert_eq!(default.values.get("client_token").unwrap(), "ct");
    }

    #[test]
    fn parse_edgerc_ignores_comments_and_blank_lines() {
        let contents = "# comment\n\n[default]\n; also a comment\nhost = h\n";
        let sections = parse_edgerc(contents);
        assert_eq!(sections.get("default").unwrap().values.len(), 1);
    }

    #[test]
    fn parse_edgerc_multiple_sections() {
        let contents = "[default]\nhost = h1\n\n[staging]\nhost = h2\n";
        let sections = parse_edgerc(contents);
        assert_eq!(sections.get("default").unwrap().values.get("host").unwrap(), "h1");
        assert_eq!(sections.get("staging").unwrap().values.get("host").unwrap(), "h2");
    }

    #[test]
    fn parse_edgerc_ignores_lines_outside_any_section() {
        let contents = "host = orphan\n[default]\nhost = h\n";
        let sections = parse_edgerc(contents);
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn log_bodies_defaults_to_off() {
        assert!(!Settings::default().log_bodies);
    }
}
