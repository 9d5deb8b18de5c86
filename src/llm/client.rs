//! Core LLM client trait and a scripted client for tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier used when a request does not name one
    fn model(&self) -> &str;

    /// Send one user prompt and return the generated text
    async fn generate(&self, prompt: &str, temperature: f32, max_output_tokens: u32) -> Result<String, LlmError> {
        let request = CompletionRequest::prompt(prompt)
            .with_temperature(temperature)
            .with_max_tokens(max_output_tokens);
        let response = self.complete(request).await?;
        if response.finish_reason.is_truncated() {
            log::warn!(
                "Generation hit the {} token limit, output may be truncated",
                max_output_tokens
            );
        }
        Ok(response.content)
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// LLM client that replays a scripted sequence of replies.
///
/// Every request is recorded so tests can assert on the prompts that were sent.
/// Once the script runs dry, further calls fail with `InvalidResponse`.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Create a client with no scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that answers with the given texts, in order
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for text in texts {
            client.push_text(text);
        }
        client
    }

    /// Queue a successful text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.push_reply(Ok(CompletionResponse::text(text)));
    }

    /// Queue a failing reply
    pub fn push_error(&self, error: LlmError) {
        self.push_reply(Err(error));
    }

    /// Queue an arbitrary reply
    pub fn push_reply(&self, reply: Result<CompletionResponse, LlmError>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of scripted replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::InvalidResponse(
                    "mock client has no scripted replies left".to_string(),
                ))
            })
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
