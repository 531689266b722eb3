//! OpenAI-compatible chat backend
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI wire
//! format (Groq, OpenAI, Together, vLLM, ...). The API key is resolved from the
//! `SecretManager` on every call, so a missing key surfaces as
//! `LLMError::MissingCredential` at the moment generation is attempted.

use super::{ChatBackend, ChatRequest, LLMError, Message, Result};
use crate::config::GenerationConfig;
use crate::secrets::SecretManager;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub struct OpenAICompatibleBackend {
    base_url: String,
    api_key_env: String,
    secrets: Arc<SecretManager>,
    client: reqwest::Client,
}

impl OpenAICompatibleBackend {
    /// Create a backend for `base_url` (e.g. "https://api.groq.com/openai/v1")
    pub fn new(
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
        secrets: Arc<SecretManager>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::ProviderUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key_env: api_key_env.into(),
            secrets,
            client,
        })
    }

    /// Create a backend from the `[generation]` config section
    pub fn from_config(config: &GenerationConfig, secrets: Arc<SecretManager>) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.api_key_env.clone(),
            secrets,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl ChatBackend for OpenAICompatibleBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn check_health(&self) -> bool {
        self.secrets.has_secret(&self.api_key_env)
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = self
            .secrets
            .get_secret(&self.api_key_env)
            .ok_or_else(|| LLMError::MissingCredential(self.api_key_env.clone()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let payload = CompletionPayload::from(request);

        tracing::debug!(
            "Chat request: model={}, messages={}, total_chars={}, json_mode={}",
            request.model,
            request.messages.len(),
            request
                .messages
                .iter()
                .map(|m| m.content.len())
                .sum::<usize>(),
            request.json_mode
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.unsecure())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!("Cannot connect to {}", self.base_url))
                } else {
                    LLMError::NetworkError(SecretManager::scrub(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = SecretManager::scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(format!("{}: {}", status, text)),
                _ => LLMError::InvalidRequest(format!("{}: {}", status, text)),
            });
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        tracing::info!(
            "Chat response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> From<&'a ChatRequest> for CompletionPayload<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            stream: false,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}
