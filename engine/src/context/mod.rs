//! Context Providers
//!
//! A context provider turns a coding task into grounding text (library
//! versions, recommended patterns) that is injected into the generation
//! prompt. Providers may fail; the pipeline replaces any failure with a
//! fallback string, so nothing here is allowed to abort a run.

use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::{ChatBackend, ChatRequest, Message};

/// Errors a context provider can report
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Context source unavailable: {0}")]
    Unavailable(String),

    #[error("Context source returned no text")]
    Empty,
}

/// Source of grounding text for a coding task
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Returns the name of the provider (used in logs)
    fn name(&self) -> &str;

    /// Produce grounding text for `task`
    async fn gather(&self, task: &str) -> Result<String, ContextError>;
}

/// Provider that always returns the same text
pub struct StaticContext {
    text: String,
}

impl StaticContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ContextProvider for StaticContext {
    fn name(&self) -> &str {
        "static"
    }

    async fn gather(&self, _task: &str) -> Result<String, ContextError> {
        Ok(self.text.clone())
    }
}

const RESEARCH_PROMPT: &str = r#"You are a research assistant for a Node.js code generator.
Given a coding task, list:
1. The npm packages the task needs, each with its current stable version.
2. Key API usage patterns or best practices for those packages.
3. Pitfalls to avoid with ES Modules.
Answer in concise plain text. Do not write the solution."#;

/// Provider that asks a chat model for library versions and usage patterns
pub struct ResearchProvider {
    backend: Arc<dyn ChatBackend>,
    model: String,
    max_tokens: u32,
}

impl ResearchProvider {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl ContextProvider for ResearchProvider {
    fn name(&self) -> &str {
        "research"
    }

    async fn gather(&self, task: &str) -> Result<String, ContextError> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![Message::system(RESEARCH_PROMPT), Message::user(task)],
        )
        .temperature(0.2)
        .max_tokens(self.max_tokens);

        let text = self
            .backend
            .complete(&request)
            .await
            .map_err(|e| ContextError::Unavailable(e.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ContextError::Empty);
        }

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, Result as LLMResult};
    use std::sync::Mutex;

    struct ScriptedBackend {
        reply: Mutex<Option<LLMResult<String>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(reply: LLMResult<String>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> LLMResult<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    #[tokio::test]
    async fn test_static_context_returns_text() {
        let provider = StaticContext::new("express@4.19.2");
        assert_eq!(provider.gather("anything").await.unwrap(), "express@4.19.2");
    }

    #[tokio::test]
    async fn test_research_provider_sends_task_in_text_mode() {
        let backend = Arc::new(ScriptedBackend::new(Ok("  use express 4.19  ".to_string())));
        let provider = ResearchProvider::new(backend.clone(), "research-model", 500);

        let text = provider.gather("build an http server").await.unwrap();
        assert_eq!(text, "use express 4.19");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "research-model");
        assert_eq!(seen[0].max_tokens, 500);
        assert!(!seen[0].json_mode);
        assert_eq!(seen[0].messages[1].content, "build an http server");
    }

    #[tokio::test]
    async fn test_research_provider_reports_backend_failure() {
        let backend = Arc::new(ScriptedBackend::new(Err(LLMError::RateLimitExceeded)));
        let provider = ResearchProvider::new(backend, "m", 100);

        let err = provider.gather("task").await.unwrap_err();
        assert!(matches!(err, ContextError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_research_provider_rejects_blank_text() {
        let backend = Arc::new(ScriptedBackend::new(Ok("   \n".to_string())));
        let provider = ResearchProvider::new(backend, "m", 100);

        assert!(matches!(
            provider.gather("task").await,
            Err(ContextError::Empty)
        ));
    }
}
