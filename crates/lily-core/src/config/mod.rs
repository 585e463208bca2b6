//! Client configuration shared by every host.
//!
//! `ClientConfig` is loaded from the host's own storage (the CLI keeps it in
//! a JSON profile file), then environment overrides are applied on top.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::jobs::RetryPolicy;
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const API_URL_ENV: &str = "LILY_API_URL";
pub const SYNC_INTERVAL_ENV: &str = "LILY_SYNC_INTERVAL_SECS";

/// Endpoints and timings for talking to the expense API.
///
/// Holds no secrets; access tokens live in the host's credential store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub sync_interval_secs: u64,
    pub reminder_interval_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_initial_backoff_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            sync_interval_secs: 15 * 60,
            reminder_interval_secs: 24 * 60 * 60,
            retry_max_attempts: 3,
            retry_initial_backoff_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Check ranges and normalize the base URL in place.
    pub fn validate(&mut self) -> Result<()> {
        let url = normalize_text_option(Some(self.api_base_url.clone()))
            .ok_or_else(|| Error::Config("api_base_url must not be empty".to_string()))?;
        if !is_http_url(&url) {
            return Err(Error::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        self.api_base_url = url.trim_end_matches('/').to_string();

        for (field, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("sync_interval_secs", self.sync_interval_secs),
            ("reminder_interval_secs", self.reminder_interval_secs),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{field} must be greater than zero")));
            }
        }
        if self.retry_max_attempts == 0 {
            return Err(Error::Config(
                "retry_max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `LILY_API_URL` / `LILY_SYNC_INTERVAL_SECS` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = normalize_text_option(lookup(API_URL_ENV)) {
            self.api_base_url = url;
        }
        if let Some(raw) = normalize_text_option(lookup(SYNC_INTERVAL_ENV)) {
            self.sync_interval_secs = raw.parse().map_err(|_| {
                Error::Config(format!("{SYNC_INTERVAL_ENV} must be a whole number of seconds"))
            })?;
        }
        self.validate()
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub const fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            initial_backoff: Duration::from_secs(self.retry_initial_backoff_secs),
            ..RetryPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_base_url":"https://api.example.com"}"#).unwrap();
        assert_eq!(config.sync_interval_secs, 900);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = serde_json::from_str::<ClientConfig>(r#"{"supabase_url":"x"}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn validate_normalizes_and_rejects() {
        let mut config = ClientConfig {
            api_base_url: " https://api.example.com/api/ ".to_string(),
            ..ClientConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/api");

        let mut bad_url = ClientConfig {
            api_base_url: "api.example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(bad_url.validate().is_err());

        let mut zero_interval = ClientConfig {
            sync_interval_secs: 0,
            ..ClientConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let mut no_attempts = ClientConfig {
            retry_max_attempts: 0,
            ..ClientConfig::default()
        };
        assert!(no_attempts.validate().is_err());
    }

    #[test]
    fn env_overrides_win() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| match key {
                API_URL_ENV => Some("https://staging.example.com/api".to_string()),
                SYNC_INTERVAL_ENV => Some("60".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.api_base_url, "https://staging.example.com/api");
        assert_eq!(config.sync_interval(), Duration::from_secs(60));
    }

    #[test]
    fn malformed_interval_override_is_a_config_error() {
        let mut config = ClientConfig::default();
        let error = config
            .apply_overrides(|key| (key == SYNC_INTERVAL_ENV).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
