// Environment-driven configuration: where the moderation service lives and how
// long a session reset may take.

use crate::infra::moderation::http_gateway::DEFAULT_RESET_TIMEOUT;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

pub const API_URL_VAR: &str = "PROMPTGUARD_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const RESET_TIMEOUT_VAR: &str = "PROMPTGUARD_RESET_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var} '{value}': {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid {var} '{value}': expected a whole number of seconds above zero")]
    InvalidTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub reset_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

impl GuardConfig {
    /// Read the configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_value(std::env::var(API_URL_VAR).ok())?;
        config.reset_timeout = parse_reset_timeout(std::env::var(RESET_TIMEOUT_VAR).ok())?;
        Ok(config)
    }

    /// Build the configuration from the raw variable value. Unset or blank means default.
    pub fn from_value(value: Option<String>) -> Result<Self, ConfigError> {
        let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
            return Ok(Self::default());
        };

        let invalid = |reason: String| ConfigError::InvalidUrl {
            var: API_URL_VAR,
            value: value.clone(),
            reason,
        };

        let url = Url::parse(&value).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self {
            base_url: value.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }
}

/// Seconds as a positive integer. Unset or blank means the default.
fn parse_reset_timeout(value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_RESET_TIMEOUT);
    };

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            var: RESET_TIMEOUT_VAR,
            value,
        }),
    }
}
