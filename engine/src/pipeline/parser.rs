//! Response Parser
//!
//! Recovers a JSON value from raw model output in two tiers:
//!
//! 1. Strict decode of the whole string.
//! 2. Decode of the slice from the first `{` to the last `}` inclusive, which
//!    strips leading/trailing prose and markdown fences.
//!
//! The slice is a heuristic, not a tolerant grammar. A stray brace in the
//! surrounding prose (or unbalanced braces inside string content) moves the
//! slice boundary and the second tier fails.

use sdk::errors::PipelineError;
use serde_json::Value;

/// Parse raw model output into a JSON value.
///
/// On failure the returned `PipelineError::Parse` carries the untouched raw
/// text for diagnostics.
pub fn parse_model_output(raw: &str) -> Result<Value, PipelineError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(e) => tracing::debug!("Direct parse failed: {}", e),
    }

    let slice = brace_slice(raw)
        .ok_or_else(|| PipelineError::parse("No JSON object found in response", raw))?;

    serde_json::from_str::<Value>(slice)
        .map_err(|e| PipelineError::parse(format!("Extraction failed: {}", e), raw))
}

/// The substring from the first `{` to the last `}` inclusive
fn brace_slice(raw: &str) -> Option<&str> {
    let first = raw.find('{')?;
    let last = raw.rfind('}')?;

    if first > last {
        return None;
    }

    Some(&raw[first..=last])
}
