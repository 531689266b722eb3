//! Error types and handling
//!
//! This module provides the single error type threaded through every stage of
//! the generation pipeline. Each variant maps to one failure class of the
//! pipeline and carries enough detail for diagnostic logging.
//!
//! # Security
//!
//! `Display` output of an error may contain upstream detail (status bodies,
//! schema violations). It is meant for logs. Anything returned to a remote
//! caller must go through [`PipelineErrorExt::user_hint`], which never
//! includes raw model text, credentials or backend internals.

use thiserror::Error;

/// Trait for pipeline error extensions
///
/// Provides the caller-facing view of an error: a safe message and the HTTP
/// status class the error belongs to.
pub trait PipelineErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to remote callers and does not contain:
    /// - Secrets (API keys, tokens)
    /// - Raw model output
    /// - Backend error bodies
    fn user_hint(&self) -> &str;

    /// Returns the HTTP status code this error maps to
    fn status_code(&self) -> u16;

    /// Short machine-readable name of the failure class (used in logs)
    fn kind(&self) -> &'static str;
}

/// Main pipeline error type
///
/// # Error Categories
///
/// - **Validation**: the inbound request is missing required fields
/// - **Upstream**: the generation backend is unavailable or misconfigured
/// - **EmptyResponse**: the model answered with no content
/// - **Parse / Schema**: the model output is unusable
/// - **Storage**: a file upload failed
/// - **Persistence**: the manifest write failed
/// - **Config**: local configuration is invalid
///
/// # Examples
///
/// ```
/// use sdk::errors::{PipelineError, PipelineErrorExt};
///
/// let error = PipelineError::Validation("prompt".to_string());
/// assert_eq!(error.status_code(), 400);
///
/// let error = PipelineError::Schema("projectFiles is empty".to_string());
/// assert_eq!(error.status_code(), 500);
/// assert!(!error.user_hint().contains("projectFiles"));
/// ```
#[derive(Debug, Error)]
pub enum PipelineError {
    // Inbound request errors
    #[error("Missing required field(s): {0}")]
    Validation(String),

    // Generation backend errors
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    // Model output errors
    #[error("Parse error: {reason}")]
    Parse {
        reason: String,
        /// Untouched model output, kept for diagnostics only
        raw: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    // Publication errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Build a parse error that keeps the raw model output
    pub fn parse(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// The raw model output attached to a parse failure, if any
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl PipelineErrorExt for PipelineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Validation(_) => "Missing wallet, foldername or prompt",
            Self::Upstream(_) => "Code generation service is unavailable. Try again later",
            Self::EmptyResponse => "Code generation returned no content. Try again",
            Self::Parse { .. } => "Could not parse AI response as JSON",
            Self::Schema(_) => "AI response did not contain a valid project",
            Self::Storage(_) => "Failed to upload generated files",
            Self::Persistence(_) => "Failed to record the project manifest",
            Self::Config(_) => "Server is misconfigured",
        }
    }

    fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upstream(_) => "upstream",
            Self::EmptyResponse => "empty_response",
            Self::Parse { .. } => "parse",
            Self::Schema(_) => "schema",
            Self::Storage(_) => "storage",
            Self::Persistence(_) => "persistence",
            Self::Config(_) => "config",
        }
    }
}
