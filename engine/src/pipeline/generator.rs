//! Code Generator
//!
//! Sends one chat completion to the generation backend: a fixed system prompt
//! describing the output contract, and a user message carrying the research
//! context and the task. No retries happen here.

use sdk::errors::PipelineError;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::llm::{ChatBackend, ChatRequest, Message};
use crate::secrets::SecretManager;

/// Output contract given to the model
pub const SYSTEM_PROMPT: &str = r#"You are a specialized Node.js code generation agent.
Output ONLY a JSON object. No markdown, no preamble.

### CONTEXT GROUNDING
The user message contains a "RESEARCH/CONTEXT" block.
1. Use the specific library versions named in that context.
2. Follow the architectural patterns and best practices it describes.
3. When the context names a specific API or tool, prefer it over general knowledge.

### OUTPUT SCHEMA
{
  "projectFiles": [
    { "name": "filename.js", "content": "source_code" }
  ]
}

### RULES
- No folders. Flat file structure only.
- Use ES Modules (import/export).
- "projectFiles" must contain everything needed to run the task.
"#;

/// Sampling settings for a generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub json_mode: bool,
    pub timeout: Duration,
}

impl From<&GenerationConfig> for GenerationSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            json_mode: config.json_mode,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

pub struct CodeGenerator {
    backend: Arc<dyn ChatBackend>,
    settings: GenerationSettings,
}

impl CodeGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The user turn sent alongside the system prompt
    pub fn user_message(task: &str, context: &str) -> String {
        format!("RESEARCH/CONTEXT:{}\nTASK:\n{}", context, task)
    }

    /// Build the chat request for one task
    pub fn request(&self, task: &str, context: &str) -> ChatRequest {
        ChatRequest::new(
            self.settings.model.clone(),
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(Self::user_message(task, context)),
            ],
        )
        .temperature(self.settings.temperature)
        .max_tokens(self.settings.max_tokens)
        .top_p(self.settings.top_p)
        .frequency_penalty(self.settings.frequency_penalty)
        .json_mode(self.settings.json_mode)
    }

    /// Ask the backend for the project and return its raw text.
    ///
    /// # Errors
    ///
    /// - `Upstream` when the backend fails, is unreachable, lacks a
    ///   credential or does not answer within the configured timeout
    /// - `EmptyResponse` when the answer is empty or whitespace-only
    pub async fn generate(&self, task: &str, context: &str) -> Result<String, PipelineError> {
        let request = self.request(task, context);

        tracing::debug!(
            "Requesting generation from {} (model: {})",
            self.backend.name(),
            request.model
        );

        let raw = tokio::time::timeout(self.settings.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| {
                PipelineError::Upstream(format!(
                    "generation timed out after {}s",
                    self.settings.timeout.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::Upstream(SecretManager::scrub(&e.to_string())))?;

        if raw.trim().is_empty() {
            return Err(PipelineError::EmptyResponse);
        }

        tracing::debug!("Model returned {} bytes", raw.len());
        Ok(raw)
    }
}
