//! Request, project and outcome types shared by the engine and the API server

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// A validated request to generate and publish one project.
///
/// Constructed once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    owner: String,
    folder: String,
    prompt: String,
}

impl GenerationRequest {
    /// Create a request, rejecting empty or whitespace-only fields.
    ///
    /// The error lists every missing field, in `wallet, foldername, prompt`
    /// order.
    pub fn new(
        owner: impl Into<String>,
        folder: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let owner = owner.into();
        let folder = folder.into();
        let prompt = prompt.into();

        let missing: Vec<&str> = [
            ("wallet", &owner),
            ("foldername", &folder),
            ("prompt", &prompt),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

        if !missing.is_empty() {
            return Err(PipelineError::Validation(missing.join(", ")));
        }

        Ok(Self {
            owner,
            folder,
            prompt,
        })
    }

    /// Identity the manifest entry is recorded for (the wallet address)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Target folder name, used in the synthesized README
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Natural-language coding task
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// One generated source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub name: String,
    pub content: String,
}

impl ProjectFile {
    /// Create a new project file
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Validated model output: a non-empty, ordered list of files.
///
/// Only the schema validator constructs this type, so holding one means the
/// model output was structurally checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectManifestInput {
    #[serde(rename = "projectFiles")]
    project_files: Vec<ProjectFile>,
}

impl ProjectManifestInput {
    /// Wrap a file list, refusing an empty one
    pub fn new(project_files: Vec<ProjectFile>) -> Result<Self, PipelineError> {
        if project_files.is_empty() {
            return Err(PipelineError::Schema("projectFiles is empty".to_string()));
        }
        Ok(Self { project_files })
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.project_files
    }

    pub fn len(&self) -> usize {
        self.project_files.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.project_files.is_empty()
    }
}

/// Caller-facing result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl PipelineOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}
