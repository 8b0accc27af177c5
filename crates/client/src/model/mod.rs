//! Chat-completions model client.
//!
//! Sends the analysis prompt to an OpenAI-compatible endpoint in JSON-object
//! mode and parses the generated content into an [`AnalysisResult`].
//!
//! - **Endpoint**: `{base_url}/chat/completions`
//! - **Authentication**: `Authorization: Bearer <key>`; there is no default key
//! - **Timeout**: whole-request, default 60s
//! - **Retries**: none

pub mod request;
pub mod response;

pub use request::{ChatRequest, ResponseFormat};
pub use response::{extract_content, parse_report};

use async_trait::async_trait;
use reqwest::header;
use siteintel_core::{AnalysisResult, AppConfig, Error};
use std::time::{Duration, Instant};

use crate::prompt::Prompt;

/// Longest slice of an upstream error body carried into the error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Model client configuration.
#[derive(Clone)]
pub struct ModelConfig {
    /// Bearer credential for the model service.
    pub api_key: String,
    /// Base URL (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Model identifier (default: gpt-4o-mini).
    pub model: String,
    /// Sampling temperature (default: 0.2).
    pub temperature: f32,
    /// Cap on generated tokens (default: 2000).
    pub max_tokens: u32,
    /// Request timeout (default: 60s).
    pub timeout: Duration,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelConfig {
    /// Build from application config, failing if no credential is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            api_key,
            base_url: config.model_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.model_timeout(),
        })
    }
}

/// Anything that can turn a prompt into a report.
#[async_trait]
pub trait ReportModel: Send + Sync {
    async fn analyze(&self, prompt: &Prompt) -> Result<AnalysisResult, Error>;
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    /// Create a new model client with the given configuration.
    pub fn new(config: ModelConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("model service API key is not set".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Send `prompt` and return the raw generated content.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String, Error> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.config.base_url);

        let body = ChatRequest {
            model: &self.config.model,
            messages: prompt.messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat::json_object(),
        };

        tracing::debug!("calling model {} at {}", self.config.model, url);

        let http_response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = http_response.status();
        let text = http_response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %text, "model service error");
            let reason = status.canonical_reason().unwrap_or("Unknown");
            let detail: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(Error::ModelHttp(format!("{} {}: {}", status.as_u16(), reason, detail)));
        }

        let content = extract_content(&text)?;

        tracing::debug!("model responded in {:?} ({} chars)", start.elapsed(), content.len());

        Ok(content)
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::ModelTimeout(format!("no response within {:?}", self.config.timeout))
        } else {
            Error::ModelHttp(format!("network error: {}", err))
        }
    }
}

#[async_trait]
impl ReportModel for ModelClient {
    async fn analyze(&self, prompt: &Prompt) -> Result<AnalysisResult, Error> {
        let content = self.complete(prompt).await?;
        parse_report(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::normalize;
    use crate::prompt::build_prompt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ModelConfig {
        ModelConfig {
            api_key: "sk-test".into(),
            base_url: server.uri(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout: Duration::from_secs(5),
        }
    }

    fn prompt() -> Prompt {
        build_prompt(&normalize("example.com").unwrap(), "<html></html>")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[test]
    fn test_client_new_missing_key() {
        let config = ModelConfig {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        };
        assert!(matches!(ModelClient::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_from_app_config_requires_key() {
        let app = AppConfig::default();
        assert!(matches!(ModelConfig::from_app_config(&app), Err(Error::Config(_))));

        let app = AppConfig {
            openai_api_key: Some("sk-live".into()),
            model_base_url: "https://llm.example.com/v1/".into(),
            ..Default::default()
        };
        let config = ModelConfig::from_app_config(&app).unwrap();
        assert_eq!(config.api_key, "sk-live");
        assert_eq!(config.base_url, "https://llm.example.com/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ModelConfig {
            api_key: "sk-secret".into(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        };
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header_eq("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 2000,
                "response_format": { "type": "json_object" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"site":{"url":"https://example.com/","title":"Example"},"cms":null,"summary":"A placeholder domain."}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = ModelClient::new(config_for(&server)).unwrap();
        let result = client.analyze(&prompt()).await.unwrap();
        assert_eq!(result.report().site.title.as_deref(), Some("Example"));
        assert_eq!(result.report().summary, "A placeholder domain.");
        assert_eq!(result.document()["cms"], json!(null));
    }

    #[tokio::test]
    async fn test_analyze_sends_both_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
            .mount(&server)
            .await;

        let client = ModelClient::new(config_for(&server)).unwrap();
        assert!(client.analyze(&prompt()).await.is_ok());

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], crate::prompt::SYSTEM_INSTRUCTION);
        assert_eq!(messages[1]["role"], "user");
    }

    #[tokio::test]
    async fn test_analyze_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
            .mount(&server)
            .await;

        let client = ModelClient::new(config_for(&server)).unwrap();
        let err = client.analyze(&prompt()).await.unwrap_err();
        match err {
            Error::ModelHttp(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("Too Many Requests"));
                assert!(msg.contains("rate limit exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_missing_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = ModelClient::new(config_for(&server)).unwrap();
        let err = client.analyze(&prompt()).await.unwrap_err();
        assert!(matches!(err, Error::ModelEmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_malformed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("```json\nnot json\n```")))
            .mount(&server)
            .await;

        let client = ModelClient::new(config_for(&server)).unwrap();
        let err = client.analyze(&prompt()).await.unwrap_err();
        assert!(matches!(err, Error::ModelMalformed(_)));
    }

    #[tokio::test]
    async fn test_analyze_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let config = ModelConfig { timeout: Duration::from_millis(300), ..config_for(&server) };
        let client = ModelClient::new(config).unwrap();
        let err = client.analyze(&prompt()).await.unwrap_err();
        assert!(matches!(err, Error::ModelTimeout(_)));
    }
}
