//! Chat Backend Abstraction Layer
//!
//! This module provides a common interface for chat-completion backends. The
//! `ChatBackend` trait is the only seam the pipeline uses to reach a model, so
//! the code generator and the research provider can run against any
//! OpenAI-compatible vendor, or a test double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message in a chat request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (system or user)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// System message
    System,
}

/// A complete chat-completion request: model, messages and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,

    /// Ask the provider to constrain output to a single JSON object.
    /// A hint only; output still has to be parsed and validated.
    pub json_mode: bool,
}

impl ChatRequest {
    /// Create a request with neutral sampling settings
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            frequency_penalty: 0.0,
            json_mode: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = frequency_penalty;
        self
    }

    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Chat backend trait that all model vendors must implement
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "openai-compatible")
    fn name(&self) -> &str;

    /// Run one non-streaming completion
    ///
    /// # Returns
    /// * `Ok(String)` - The content of the first choice; empty when the model
    ///   produced no content
    /// * `Err(LLMError)` - If the request fails
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    /// Check if the backend is currently usable
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}
