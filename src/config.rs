//! Client configuration from the environment

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_ADMIN_ID: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base path every operation is relative to
    pub api_url: String,
    pub timeout: Duration,
    pub admin_id: String,
    pub admin_password: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: crate::api::DEFAULT_TIMEOUT,
            admin_id: DEFAULT_ADMIN_ID.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            log_json: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeout = match lookup("SALESBOT_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        name: "SALESBOT_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => defaults.timeout,
        };

        Ok(Self {
            api_url: lookup("SALESBOT_API_URL").unwrap_or(defaults.api_url),
            timeout,
            admin_id: lookup("SALESBOT_ADMIN_ID").unwrap_or(defaults.admin_id),
            admin_password: lookup("SALESBOT_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            log_json: lookup("SALESBOT_LOG_JSON")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }
}
