//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITEINTEL_*)
//! 2. TOML config file (if SITEINTEL_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The model service credential has no built-in default. Anything that calls
//! the model service must go through [`AppConfig::require_api_key`].

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITEINTEL_*)
/// 2. TOML config file (if SITEINTEL_CONFIG_FILE set)
/// 3. `OPENAI_API_KEY` for the credential only
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    ///
    /// Set via SITEINTEL_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port the HTTP server listens on.
    ///
    /// Set via SITEINTEL_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Credential for the model service.
    ///
    /// Set via SITEINTEL_OPENAI_API_KEY (or OPENAI_API_KEY).
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Base address of the chat-completions compatible model service.
    ///
    /// Set via SITEINTEL_MODEL_BASE_URL environment variable.
    #[serde(default = "default_model_base_url")]
    pub model_base_url: String,

    /// Model identifier sent with every analysis request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for the model call.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cap on generated tokens per analysis.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Model call timeout in milliseconds.
    #[serde(default = "default_model_timeout_ms")]
    pub model_timeout_ms: u64,

    /// User-Agent string for page retrieval.
    ///
    /// Set via SITEINTEL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page retrieval timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum number of redirects followed during retrieval.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Page bodies longer than this many characters are clipped.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Lifetime of a cached analysis in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Resolve hostnames and reject private/reserved addresses.
    ///
    /// Set via SITEINTEL_RESOLVE_DNS environment variable.
    #[serde(default)]
    pub resolve_dns: bool,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_model_timeout_ms() -> u64 {
    60_000
}

fn default_user_agent() -> String {
    "siteintel/0.1 (+analysis bot)".into()
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_content_chars() -> usize {
    800_000
}

fn default_cache_ttl_secs() -> u64 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            openai_api_key: None,
            model_base_url: default_model_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            model_timeout_ms: default_model_timeout_ms(),
            user_agent: default_user_agent(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_content_chars: default_max_content_chars(),
            cache_ttl_secs: default_cache_ttl_secs(),
            resolve_dns: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Page retrieval timeout as Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Model call timeout as Duration.
    pub fn model_timeout(&self) -> Duration {
        Duration::from_millis(self.model_timeout_ms)
    }

    /// Cache entry lifetime as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `host:port` the server should listen on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai_api_key".into()));

        if let Ok(config_path) = std::env::var("SITEINTEL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SITEINTEL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Return the model service credential, failing closed when it is absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is unset or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "openai_api_key".into(),
                hint: "Set SITEINTEL_OPENAI_API_KEY or OPENAI_API_KEY environment variable".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.model_base_url, "https://api.openai.com/v1");
        assert_eq!(config.fetch_timeout_ms, 15_000);
        assert_eq!(config.max_content_chars, 800_000);
        assert_eq!(config.cache_ttl_secs, 600);
        assert!(config.openai_api_key.is_none());
        assert!(!config.resolve_dns);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.model_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_listen_addr() {
        let config = AppConfig { port: 8080, ..Default::default() };
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_require_api_key_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.require_api_key(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_api_key_blank() {
        let config = AppConfig { openai_api_key: Some("   ".into()), ..Default::default() };
        assert!(matches!(config.require_api_key(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_api_key_present() {
        let config = AppConfig { openai_api_key: Some("sk-test".into()), ..Default::default() };
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = AppConfig { openai_api_key: Some("sk-secret".into()), ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
