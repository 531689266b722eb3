//! Schema Validator
//!
//! Checks a parsed model response against the project shape:
//!
//! ```json
//! { "projectFiles": [ { "name": "index.js", "content": "..." } ] }
//! ```
//!
//! Validation is all-or-nothing. One malformed entry rejects the whole
//! response; entries are never dropped or repaired.

use sdk::errors::PipelineError;
use sdk::types::{ProjectFile, ProjectManifestInput};
use serde_json::Value;
use std::collections::HashSet;

/// Validate a parsed response and convert it into trusted project input
pub fn validate_project(value: &Value) -> Result<ProjectManifestInput, PipelineError> {
    let object = value
        .as_object()
        .ok_or_else(|| schema_error(format!("response is {}, not an object", type_name(value))))?;

    let files = object
        .get("projectFiles")
        .ok_or_else(|| schema_error("missing projectFiles field"))?;

    let entries = files.as_array().ok_or_else(|| {
        schema_error(format!(
            "projectFiles is {}, not an array",
            type_name(files)
        ))
    })?;

    if entries.is_empty() {
        return Err(schema_error("projectFiles is empty"));
    }

    let mut project_files = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        project_files.push(validate_entry(index, entry)?);
    }

    let mut seen = HashSet::new();
    for file in &project_files {
        if !seen.insert(file.name.as_str()) {
            tracing::warn!("Model produced duplicate file name '{}'", file.name);
        }
    }

    ProjectManifestInput::new(project_files)
}

fn validate_entry(index: usize, entry: &Value) -> Result<ProjectFile, PipelineError> {
    let object = entry.as_object().ok_or_else(|| {
        schema_error(format!(
            "projectFiles[{}] is {}, not an object",
            index,
            type_name(entry)
        ))
    })?;

    let name = match object.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) => {
            return Err(schema_error(format!("projectFiles[{}].name is empty", index)))
        }
        Some(other) => {
            return Err(schema_error(format!(
                "projectFiles[{}].name is {}, not a string",
                index,
                type_name(other)
            )))
        }
        None => return Err(schema_error(format!("projectFiles[{}] has no name", index))),
    };

    let content = match object.get("content") {
        Some(Value::String(content)) => content,
        Some(other) => {
            return Err(schema_error(format!(
                "projectFiles[{}].content is {}, not a string",
                index,
                type_name(other)
            )))
        }
        None => {
            return Err(schema_error(format!(
                "projectFiles[{}] has no content",
                index
            )))
        }
    };

    Ok(ProjectFile::new(name.clone(), content.clone()))
}

fn schema_error(violation: impl Into<String>) -> PipelineError {
    PipelineError::Schema(violation.into())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
