//! Structured intent extraction from free-form text.
//!
//! Every extractor follows the same pattern: prompt the reasoning gateway
//! for a JSON object, decode it into a raw serde struct, then validate the
//! raw fields into a typed intent. Malformed output is logged and collapses
//! to a safe default rather than propagating.

pub mod calendar;
pub mod email;
pub mod plan;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("reasoning service unavailable")]
    Unavailable,

    #[error("malformed structured output: {0}")]
    Malformed(String),
}

/// Strips a markdown code fence from model output, if present.
///
/// Accepts ```json ... ``` and bare ``` ... ``` fences; anything else is
/// returned unchanged.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    rest.strip_suffix("```").map(str::trim).unwrap_or(trimmed)
}

/// Normalizes an optional string field: trims and drops empty values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
