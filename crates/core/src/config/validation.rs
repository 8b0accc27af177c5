//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value_ms > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// The credential is not checked here; see [`AppConfig::require_api_key`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_content_chars` is 0 or exceeds 10 million
    /// - either timeout is less than 100ms or exceeds 5 minutes
    /// - `temperature` is outside 0.0..=2.0
    /// - `user_agent` or `model` is empty
    /// - `cache_ttl_secs` is 0
    /// - `model_base_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_chars == 0 {
            return Err(invalid("max_content_chars", "must be greater than 0"));
        }
        if self.max_content_chars > 10_000_000 {
            return Err(invalid("max_content_chars", "must not exceed 10000000"));
        }

        check_timeout("fetch_timeout_ms", self.fetch_timeout_ms)?;
        check_timeout("model_timeout_ms", self.model_timeout_ms)?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be between 0.0 and 2.0"));
        }

        if self.max_tokens == 0 {
            return Err(invalid("max_tokens", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(invalid("model", "must not be empty"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }

        match url::Url::parse(&self.model_base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => return Err(invalid("model_base_url", "must be an absolute http(s) URL")),
        }

        Ok(())
    }
}
