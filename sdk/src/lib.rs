//! Codepin SDK
//!
//! Shared types and the error taxonomy for Codepin components.
//! This crate is used by both the engine and the API server.

/// Error types and handling
pub mod errors;

/// Request, project and outcome types
pub mod types;

// Re-export commonly used types
pub use errors::{PipelineError, PipelineErrorExt};
pub use types::{GenerationRequest, PipelineOutcome, ProjectFile, ProjectManifestInput};
