//! Response adapters: every schema the model side has been seen to return is
//! turned into the canonical `MatchResult` here, and nowhere else.
//!
//! Canonical:  `{ "score": 82, "confidence": "high", "feedback": ["..."] }`
//! Legacy:     `{ "matchScore": "82%", "recommendation": "...", "summary": ["..."] }`
//! Envelope:   a generateContent response whose first part's text holds either
//!             of the above, optionally wrapped in code fences. A bare JSON
//!             string holding either of the above is unwrapped the same way.

use serde_json::Value;
use thiserror::Error;

use crate::llm_client::{candidate_text, strip_json_fences};
use crate::scoring::MatchResult;

#[derive(Debug, Error, PartialEq)]
pub enum AdapterError {
    #[error("response has no recognised score field")]
    MissingScore,

    #[error("score is not a finite number: {0}")]
    InvalidScore(String),

    #[error("embedded model text is not JSON: {0}")]
    EmbeddedText(String),
}

pub fn normalize_response(value: &Value) -> Result<MatchResult, AdapterError> {
    if let Some(text) = candidate_text(value) {
        return normalize_embedded(text);
    }
    if let Value::String(text) = value {
        return normalize_embedded(text);
    }
    normalize_object(value)
}

fn normalize_embedded(text: &str) -> Result<MatchResult, AdapterError> {
    let inner: Value = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| AdapterError::EmbeddedText(e.to_string()))?;
    normalize_object(&inner)
}

fn normalize_object(value: &Value) -> Result<MatchResult, AdapterError> {
    if let Some(score) = value.get("score") {
        return Ok(MatchResult {
            score: parse_score(score)?,
            confidence: label(value.get("confidence")),
            feedback: lines(value.get("feedback")),
        });
    }
    if let Some(score) = value.get("matchScore") {
        return Ok(MatchResult {
            score: parse_score(score)?,
            confidence: label(value.get("recommendation")),
            feedback: lines(value.get("summary")),
        });
    }
    Err(AdapterError::MissingScore)
}

/// Accepts numbers and numeric strings (`"82"`, `"82%"`), rounded and clamped to 0–100.
fn parse_score(value: &Value) -> Result<u8, AdapterError> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(score) if score.is_finite() => Ok(score.round().clamp(0.0, 100.0) as u8),
        _ => Err(AdapterError::InvalidScore(value.to_string())),
    }
}

fn label(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn lines(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                other => other.get("text").and_then(Value::as_str).map(|s| s.trim().to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
