//! OpenAI-compatible chat-completions client
//!
//! This module implements the LlmClient trait for any endpoint that speaks the
//! `/chat/completions` protocol (OpenAI, Azure-style gateways, LiteLLM proxies).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdrError};
use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{CompletionRequest, CompletionResponse, FinishReason, Message, Usage};

/// OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Seconds to wait after a 429 without a usable retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Configuration for the OpenAI client
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create a config for the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Use a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the HTTP timeout for one completion call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Chat-completions API client
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
    usage: Arc<Mutex<Usage>>,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// Fails with a configuration error when the API key or model is empty,
    /// so a misconfigured run is rejected before any stage is attempted.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SdrError::Configuration("API key must be provided".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(SdrError::Configuration("model identifier must be provided".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SdrError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the API
    fn build_request(&self, request: CompletionRequest) -> ApiRequest {
        ApiRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: ApiResponse) -> std::result::Result<CompletionResponse, LlmError> {
        let usage = body
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        {
            let mut total = self.usage.lock().unwrap_or_else(|e| e.into_inner());
            total.add(&usage);
        }

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
            usage,
            model: body.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    /// Send a request to the API
    async fn send_request(&self, body: &ApiRequest) -> std::result::Result<ApiResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(status_error(status.as_u16(), retry_after.as_deref(), &error_text));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Map a non-success HTTP status and its body to an error.
///
/// 429 becomes `RateLimited`, honouring a numeric `retry-after`; anything else
/// becomes `Api` with the `{"error": {"message"}}` text when the body has one.
fn status_error(status: u16, retry_after: Option<&str>, body: &str) -> LlmError {
    if status == 429 {
        let secs = retry_after
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return LlmError::RateLimited {
            retry_after: Duration::from_secs(secs),
        };
    }

    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    LlmError::Api { status, message }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, LlmError> {
        let body = self.build_request(request);
        log::debug!("POST {} model={} messages={}", self.endpoint(), body.model, body.messages.len());
        let response = self.send_request(&body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig::new("sk-test-key")).unwrap()
    }

    fn parse(client: &OpenAiClient, value: serde_json::Value) -> std::result::Result<CompletionResponse, LlmError> {
        client.parse_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::new("key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiClient::new(OpenAiConfig::new("  "));
        assert!(matches!(result, Err(SdrError::Configuration(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = OpenAiClient::new(OpenAiConfig::new("key").with_model(""));
        assert!(matches!(result, Err(SdrError::Configuration(_))));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new(OpenAiConfig::new("key").with_base_url("http://localhost:4000/v1/")).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:4000/v1/chat/completions");
    }

    #[test]
    fn test_build_request_uses_default_model() {
        let client = client();
        let request = CompletionRequest::prompt("Hello")
            .with_temperature(0.3)
            .with_max_tokens(8000);

        let body = serde_json::to_value(client.build_request(request)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 8000);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_build_request_custom_model() {
        let client = client();
        let mut request = CompletionRequest::prompt("Hello");
        request.model = Some("gpt-4o-mini".to_string());

        let body = serde_json::to_value(client.build_request(request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response_text() {
        let client = client();
        let response = parse(
            &client,
            json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "## 1. EXECUTIVE SUMMARY" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160 }
            }),
        )
        .unwrap();

        assert_eq!(response.content, "## 1. EXECUTIVE SUMMARY");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.model, "gpt-4o-2024-08-06");
        assert_eq!(response.usage, Usage::new(120, 40));
    }

    #[test]
    fn test_parse_response_truncated() {
        let client = client();
        let response = parse(
            &client,
            json!({
                "choices": [{ "message": { "content": "partial" }, "finish_reason": "length" }]
            }),
        )
        .unwrap();

        assert!(response.finish_reason.is_truncated());
        assert_eq!(response.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_parse_response_null_content() {
        let client = client();
        let response = parse(&client, json!({ "choices": [{ "message": { "content": null } }] })).unwrap();
        assert!(response.content.is_empty());
    }

    #[test]
    fn test_parse_response_no_choices() {
        let client = client();
        let result = parse(&client, json!({ "choices": [] }));
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_total_usage_accumulation() {
        let client = client();
        let one = json!({
            "choices": [{ "message": { "content": "a" } }],
            "usage": { "prompt_tokens": 100, "completion_tokens": 50 }
        });
        let two = json!({
            "choices": [{ "message": { "content": "b" } }],
            "usage": { "prompt_tokens": 200, "completion_tokens": 100 }
        });
        parse(&client, one).unwrap();
        parse(&client, two).unwrap();

        assert_eq!(client.total_usage(), Usage::new(300, 150));
    }

    #[test]
    fn test_status_429_uses_retry_after() {
        let err = status_error(429, Some("12"), "");
        assert!(matches!(
            err,
            LlmError::RateLimited { retry_after } if retry_after == Duration::from_secs(12)
        ));
    }

    #[test]
    fn test_status_429_without_usable_retry_after() {
        for header in [None, Some("Wed, 21 Oct 2026 07:28:00 GMT")] {
            let err = status_error(429, header, "slow down");
            assert!(matches!(
                err,
                LlmError::RateLimited { retry_after } if retry_after == Duration::from_secs(DEFAULT_RETRY_AFTER_SECS)
            ));
        }
    }

    #[test]
    fn test_status_error_extracts_api_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let err = status_error(401, None, body);
        assert!(matches!(
            &err,
            LlmError::Api { status: 401, message } if message == "Incorrect API key provided"
        ));
        assert_eq!(err.to_string(), "API error 401: Incorrect API key provided");
    }

    #[test]
    fn test_status_error_keeps_raw_body() {
        let err = status_error(502, None, "<html>Bad Gateway</html>");
        assert!(matches!(
            err,
            LlmError::Api { status: 502, message } if message == "<html>Bad Gateway</html>"
        ));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = client();
        let debug_str = format!("{:?} {:?}", client, client.config);
        assert!(debug_str.contains("OpenAiClient"));
        assert!(debug_str.contains(DEFAULT_MODEL));
        assert!(!debug_str.contains("sk-test-key"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenAiClient>();
    }
}
