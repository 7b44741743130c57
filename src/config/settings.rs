//! `Settings`: the tunable, validated numeric knobs for retry/timeout
//! behavior, loaded alongside `Credentials`.

use crate::constants;
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    /// Attach (redacted) request/response bodies to `debug`/`trace`
    /// events. Off by default — bodies can carry sensitive customer
    /// data even after redaction passes.
    pub log_bodies: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,
            request_timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            log_bodies: false,
        }
    }
}

impl Settings {
    /// Validates the numeric bounds named in the spec: `0 <= maxRetries
    /// <= 10`; `100 <= retryDelayMs <= 10_000`; `1_000 <= timeoutMs <=
    /// 300_000`. Fails on the first invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_retries > constants::MAX_MAX_RETRIES {
            return Err(Error::config(
                "max_retries",
                format!(
                    "must be between {} and {}",
                    constants::MIN_MAX_RETRIES,
                    constants::MAX_MAX_RETRIES
                ),
            ));
        }
        if !(constants::MIN_RETRY_DELAY_MS..=constants::MAX_RETRY_DELAY_MS)
            .contains(&self.retry_delay_ms)
        {
            return Err(Error::config(
                "retry_delay_ms",
                format!(
                    "must be between {} and {}",
                    constants::MIN_RETRY_DELAY_MS,
                    constants::MAX_RETRY_DELAY_MS
                ),
            ));
        }
        if !(constants::MIN_TIMEOUT_MS..=constants::MAX_TIMEOUT_MS)
            .contains(&self.request_timeout_ms)
        {
            return Err(Error::config(
                "request_timeout_ms",
                format!(
                    "must be between {} and {}",
                    constants::MIN_TIMEOUT_MS,
                    constants::MAX_TIMEOUT_MS
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_max_retries_above_bound() {
        let s = Settings { max_retries: 11, ..Settings::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_retry_delay_below_bound() {
        let s = Settings { retry_delay_ms: 50, ..Settings::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_timeout_above_bound() {
        let s = Settings { request_timeout_ms: 400_000, ..Settings::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        let s = Settings {
            max_retries: constants::MAX_MAX_RETRIES,
            retry_delay_ms: constants::MIN_RETRY_DELAY_MS,
            request_timeout_ms: constants::MAX_TIMEOUT_MS,
            ..Settings::default()
        };
        assert!(s.validate().is_ok());
    }
}
