//! Generation Pipeline
//!
//! Turns a coding task into a published, recorded project:
//!
//! 1. Gather research context (failures fall back to a fixed string)
//! 2. Generate the project with the chat backend
//! 3. Parse the raw model output into JSON
//! 4. Validate it against the project shape
//! 5. Publish README + files to the content store
//! 6. Append a manifest entry for the run
//!
//! Every stage after context gathering short-circuits on failure. The run
//! produces one `Result<PipelineReport, PipelineError>`; nothing panics and no
//! raw model text reaches the caller.

use sdk::errors::{PipelineError, PipelineErrorExt};
use sdk::types::{GenerationRequest, PipelineOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};

pub mod generator;
pub mod parser;
pub mod publisher;
pub mod recorder;
pub mod schema;

pub use generator::{CodeGenerator, GenerationSettings};
pub use parser::parse_model_output;
pub use publisher::Publisher;
pub use recorder::ManifestRecorder;
pub use schema::validate_project;

use crate::config::Config;
use crate::context::{ContextProvider, ResearchProvider, StaticContext};
use crate::db::{Database, ManifestEntry};
use crate::llm::openai::OpenAICompatibleBackend;
use crate::llm::ChatBackend;
use crate::secrets::SecretManager;
use crate::storage::{ContentStore, MemoryStore, PinataStore};

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ContextFetched,
    Generated,
    Parsed,
    Validated,
    Published,
    Recorded,
    Done,
    /// Terminal; holds the failure class
    Failed(&'static str),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::ContextFetched => write!(f, "context_fetched"),
            Stage::Generated => write!(f, "generated"),
            Stage::Parsed => write!(f, "parsed"),
            Stage::Validated => write!(f, "validated"),
            Stage::Published => write!(f, "published"),
            Stage::Recorded => write!(f, "recorded"),
            Stage::Done => write!(f, "done"),
            Stage::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The manifest entry appended for this run
    pub entry: ManifestEntry,

    /// True when the context provider failed and the fallback text was used
    pub used_fallback_context: bool,

    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Convert a run result into the caller-facing outcome.
///
/// Failures carry only the error's user hint.
pub fn outcome_of(result: &Result<PipelineReport, PipelineError>) -> PipelineOutcome {
    match result {
        Ok(_) => PipelineOutcome::succeeded(),
        Err(e) => PipelineOutcome::failed(e.user_hint()),
    }
}

/// The generation pipeline.
///
/// Holds no per-run state, so one instance is shared across concurrent
/// requests behind an `Arc`.
pub struct Pipeline {
    context: Arc<dyn ContextProvider>,
    context_fallback: String,
    context_timeout: Duration,
    generator: CodeGenerator,
    publisher: Publisher,
    recorder: ManifestRecorder,
}

impl Pipeline {
    pub fn new(
        context: Arc<dyn ContextProvider>,
        context_fallback: impl Into<String>,
        context_timeout: Duration,
        generator: CodeGenerator,
        publisher: Publisher,
        recorder: ManifestRecorder,
    ) -> Self {
        Self {
            context,
            context_fallback: context_fallback.into(),
            context_timeout,
            generator,
            publisher,
            recorder,
        }
    }

    /// Wire the pipeline from configuration
    ///
    /// Credentials are not checked here; a missing key surfaces when a run
    /// reaches the stage that needs it.
    pub fn from_config(
        config: &Config,
        secrets: Arc<SecretManager>,
        db: &Database,
    ) -> Result<Self, PipelineError> {
        let backend: Arc<dyn ChatBackend> = Arc::new(
            OpenAICompatibleBackend::from_config(&config.generation, secrets.clone())
                .map_err(|e| PipelineError::Config(e.to_string()))?,
        );

        let research = &config.research;
        let context: Arc<dyn ContextProvider> = if research.enabled {
            let model = research
                .model
                .clone()
                .unwrap_or_else(|| config.generation.model.clone());
            Arc::new(ResearchProvider::new(
                backend.clone(),
                model,
                research.max_tokens,
            ))
        } else {
            Arc::new(StaticContext::new(research.fallback.clone()))
        };

        let store: Arc<dyn ContentStore> = match config.storage.backend.as_str() {
            "pinata" => Arc::new(
                PinataStore::from_config(&config.storage, secrets)
                    .map_err(|e| PipelineError::Config(e.to_string()))?,
            ),
            "memory" => Arc::new(MemoryStore::new()),
            other => {
                return Err(PipelineError::Config(format!(
                    "Unknown storage backend '{}'",
                    other
                )))
            }
        };

        info!(
            "Pipeline ready (model: {}, context: {}, storage: {})",
            config.generation.model,
            context.name(),
            store.name()
        );

        Ok(Self::new(
            context,
            research.fallback.clone(),
            Duration::from_secs(research.timeout_secs),
            CodeGenerator::new(backend, GenerationSettings::from(&config.generation)),
            Publisher::new(store),
            ManifestRecorder::new(Arc::new(db.manifests()), config.manifest.owner_key.clone()),
        ))
    }

    /// Run the pipeline once for `request`
    pub async fn run(&self, request: &GenerationRequest) -> Result<PipelineReport, PipelineError> {
        let span = tracing::info_span!(
            "pipeline",
            owner = %request.owner(),
            folder = %request.folder()
        );

        async move {
            let started = Instant::now();
            let mut stage = Stage::Idle;

            let result = self.run_stages(request, &mut stage).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok((entry, used_fallback_context)) => {
                    advance(&mut stage, Stage::Done);
                    info!(
                        "Published {} files in {}ms",
                        entry.uploads.len(),
                        duration_ms
                    );
                    Ok(PipelineReport {
                        entry,
                        used_fallback_context,
                        duration_ms,
                    })
                }
                Err(e) => {
                    error!("Pipeline failed after stage {}: {}", stage, e);
                    if let Some(raw) = e.raw_output() {
                        error!("Raw model output: {}", raw);
                    }
                    advance(&mut stage, Stage::Failed(e.kind()));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        request: &GenerationRequest,
        stage: &mut Stage,
    ) -> Result<(ManifestEntry, bool), PipelineError> {
        let (context, used_fallback) = self.gather_context(request.prompt()).await;
        advance(stage, Stage::ContextFetched);

        let raw = self.generator.generate(request.prompt(), &context).await?;
        advance(stage, Stage::Generated);

        let value = parse_model_output(&raw)?;
        advance(stage, Stage::Parsed);

        let project = validate_project(&value)?;
        advance(stage, Stage::Validated);

        let readme = Publisher::readme(request.folder());
        let receipts = self.publisher.publish(&readme, project.files()).await?;
        advance(stage, Stage::Published);

        let entry = self
            .recorder
            .record(request.owner(), request.folder(), receipts)
            .await?;
        advance(stage, Stage::Recorded);

        Ok((entry, used_fallback))
    }

    /// Research context for `task`, or the fallback text if gathering fails
    async fn gather_context(&self, task: &str) -> (String, bool) {
        match timeout(self.context_timeout, self.context.gather(task)).await {
            Ok(Ok(text)) => (text, false),
            Ok(Err(e)) => {
                warn!(
                    "Context provider '{}' failed, using fallback: {}",
                    self.context.name(),
                    SecretManager::scrub(&e.to_string())
                );
                (self.context_fallback.clone(), true)
            }
            Err(_) => {
                warn!(
                    "Context provider '{}' timed out after {}s, using fallback",
                    self.context.name(),
                    self.context_timeout.as_secs()
                );
                (self.context_fallback.clone(), true)
            }
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("Stage {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::ContextFetched.to_string(), "context_fetched");
        assert_eq!(Stage::Failed("schema").to_string(), "failed(schema)");
    }

    #[test]
    fn test_outcome_of_failure_uses_hint() {
        let result: Result<PipelineReport, PipelineError> =
            Err(PipelineError::parse("bad json", "RAW MODEL TEXT"));
        let outcome = outcome_of(&result);

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Could not parse AI response as JSON")
        );
    }

    #[tokio::test]
    async fn test_from_config_rejects_unknown_storage_backend() {
        let mut config = Config::default_config();
        config.storage.backend = "s3".to_string();
        let db = Database::in_memory().await.unwrap();

        let secrets = Arc::new(SecretManager::with_values(Vec::<(String, String)>::new()));

        let err = Pipeline::from_config(&config, secrets, &db).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_from_config_with_memory_storage() {
        let mut config = Config::default_config();
        config.storage.backend = "memory".to_string();
        config.research.enabled = false;
        let db = Database::in_memory().await.unwrap();

        let pipeline = Pipeline::from_config(
            &config,
            Arc::new(SecretManager::with_values([("GROQ_API_KEY", "gsk_test")])),
            &db,
        )
        .unwrap();

        assert_eq!(pipeline.context.name(), "static");
        assert_eq!(pipeline.recorder.owner_key(), "system");
    }
}
