//! Parsing of model output

use crate::error::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?(.*?)\s*```\z")
        .unwrap_or_else(|e| unreachable!("fence pattern is valid: {e}"))
});

/// Field names accepted for object-shaped verdicts
const VERDICT_FIELDS: [&str; 3] = ["verdict", "answer", "result"];

/// Unwrap text wrapped in a single fenced code block
///
/// Returns the trimmed input unchanged when it is not fenced.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a judge reply into a boolean
///
/// Accepted shapes, after fence stripping:
/// - a bare `true` / `false` token (any case)
/// - a JSON string `"true"` / `"false"`
/// - a JSON object with exactly one boolean field named `verdict`, `answer` or `result`
///
/// Everything else is [`LlmError::UnparseableVerdict`].
///
/// # Errors
/// Returns `UnparseableVerdict` carrying the raw reply.
pub fn parse_verdict(text: &str) -> Result<bool, LlmError> {
    let body = strip_code_fences(text);
    let unparseable = || LlmError::UnparseableVerdict(text.to_string());

    match body.to_ascii_lowercase().as_str() {
        "true" => return Ok(true),
        "false" => return Ok(false),
        _ => {}
    }

    match serde_json::from_str::<Value>(body).map_err(|_| unparseable())? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(unparseable()),
        },
        Value::Object(map) if map.len() == 1 => {
            let (key, value) = map.iter().next().ok_or_else(unparseable)?;
            match value {
                Value::Bool(b) if VERDICT_FIELDS.contains(&key.as_str()) => Ok(*b),
                _ => Err(unparseable()),
            }
        }
        _ => Err(unparseable()),
    }
}
