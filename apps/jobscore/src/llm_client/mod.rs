//! LLM Client: the single point of entry for all hosted-model calls in JobScore.
//!
//! ARCHITECTURAL RULE: scoring and résumé parsing never talk HTTP themselves.
//! They go through `EndpointClient` (the hosted proxy) or `GeminiClient`.
//!
//! No retries: a failed call is surfaced to the user immediately.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub mod prompts;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned empty content")]
    EmptyContent,
}

pub fn build_http_client(timeout: Duration) -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

// ────────────────────────────────────────────────────────────────────────────
// Hosted endpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TaskRequest<'a> {
    #[serde(rename = "type")]
    task: &'a str,
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct EndpointError {
    error: String,
}

/// Client for the hosted proxy that fronts the model. Every call is one JSON
/// POST of `{ "type": <task>, "payload": ... }`.
#[derive(Clone)]
pub struct EndpointClient {
    client: Client,
    endpoint: Url,
}

impl EndpointClient {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub async fn call_task(&self, task: &str, payload: Value) -> Result<Value, LlmError> {
        debug!("Calling hosted endpoint: task={task}");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&TaskRequest { task, payload })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<EndpointError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        debug!("Hosted endpoint answered task={task}");
        Ok(value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini generateContent
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: &str, base64_data: String) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: base64_data,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self::with_base_url(client, api_key, model, GEMINI_API_URL.to_string())
    }

    pub fn with_base_url(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url,
        }
    }

    /// Sends one user turn made of `parts` and returns the first candidate's text.
    pub async fn generate_text(&self, parts: Vec<Part>) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!("Gemini generate_content: model={}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        candidate_text(&value)
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// `candidates[0].content.parts[0].text` of a generateContent response.
pub fn candidate_text(response: &Value) -> Option<&str> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
