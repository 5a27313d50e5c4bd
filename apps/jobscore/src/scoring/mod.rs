//! Match scoring: pluggable, trait-based scorer comparing a résumé with a job.
//!
//! Default: `EndpointMatchScorer` (the hosted proxy's `job-match` task).
//! Alternative: `GeminiMatchScorer` (direct generateContent with a JSON-only prompt).
//!
//! The orchestrator holds an `Arc<dyn MatchScorer>`, chosen at startup via config.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::JobDetails;
use crate::llm_client::prompts::job_match_prompt;
use crate::llm_client::{EndpointClient, GeminiClient, LlmError, Part};

pub mod adapters;
pub mod band;

pub use adapters::normalize_response;
pub use band::ScoreBand;

const JOB_MATCH_TASK: &str = "job-match";

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

/// Canonical scoring result. Schema variance stops at `adapters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8, // 0 – 100
    pub confidence: Option<String>,
    pub feedback: Vec<String>,
}

impl MatchResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Transport failure, non-2xx status, or a body that is not JSON at all.
    #[error("Remote scoring call failed: {0}")]
    Remote(String),

    /// The model answered, but not in a shape we can read.
    #[error("Scoring response could not be parsed: {0}")]
    Response(String),
}

impl From<LlmError> for ScoringError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyContent => ScoringError::Response(err.to_string()),
            other => ScoringError::Remote(other.to_string()),
        }
    }
}

impl From<adapters::AdapterError> for ScoringError {
    fn from(err: adapters::AdapterError) -> Self {
        ScoringError::Response(err.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the orchestrator.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, resume: &str, job: &JobDetails) -> Result<MatchResult, ScoringError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Backends
// ────────────────────────────────────────────────────────────────────────────

pub struct EndpointMatchScorer(pub EndpointClient);

#[async_trait]
impl MatchScorer for EndpointMatchScorer {
    async fn score(&self, resume: &str, job: &JobDetails) -> Result<MatchResult, ScoringError> {
        let payload = json!({
            "resumeContent": resume,
            "jobDetails": job,
        });
        let response = self.0.call_task(JOB_MATCH_TASK, payload).await?;
        let result = normalize_response(&response).map_err(|e| {
            warn!("Unreadable job-match response: {e}");
            ScoringError::from(e)
        })?;
        debug!("Job match score for '{}': {}", job.title, result.score);
        Ok(result)
    }
}

pub struct GeminiMatchScorer(pub GeminiClient);

#[async_trait]
impl MatchScorer for GeminiMatchScorer {
    async fn score(&self, resume: &str, job: &JobDetails) -> Result<MatchResult, ScoringError> {
        let prompt = job_match_prompt(resume, &job.title, &job.company, &job.description);
        let text = self.0.generate_text(vec![Part::text(prompt)]).await?;
        let result = normalize_response(&serde_json::Value::String(text))?;
        debug!("Gemini match score for '{}': {}", job.title, result.score);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::build_http_client;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> JobDetails {
        JobDetails {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build APIs".to_string(),
        }
    }

    async fn endpoint_scorer(server: &MockServer) -> EndpointMatchScorer {
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        EndpointMatchScorer(EndpointClient::new(http, Url::parse(&server.uri()).unwrap()))
    }

    #[tokio::test]
    async fn test_endpoint_scorer_sends_resume_and_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "type": "job-match",
                "payload": {
                    "resumeContent": "my resume",
                    "jobDetails": {"title": "Backend Engineer", "company": "Acme", "description": "Build APIs"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "score": 82, "confidence": "high", "feedback": ["a", "b", "c"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = endpoint_scorer(&server)
            .await
            .score("my resume", &job())
            .await
            .unwrap();
        assert_eq!(result.score, 82);
        assert_eq!(result.band(), ScoreBand::Good);
        assert_eq!(result.feedback.len(), 3);
    }

    #[tokio::test]
    async fn test_endpoint_failure_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = endpoint_scorer(&server)
            .await
            .score("r", &job())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Remote(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_unreadable_result_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verdict": "yes"})))
            .mount(&server)
            .await;

        let err = endpoint_scorer(&server)
            .await
            .score("r", &job())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Response(_)));
    }

    #[tokio::test]
    async fn test_gemini_scorer_reads_embedded_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{
                    "text": "```json\n{\"score\": 55, \"confidence\": \"low\", \"feedback\": [\"x\"]}\n```"
                }]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(
            build_http_client(Duration::from_secs(5)).unwrap(),
            "k".to_string(),
            "m".to_string(),
            server.uri(),
        );
        let result = GeminiMatchScorer(client).score("r", &job()).await.unwrap();
        assert_eq!(result.score, 55);
        assert_eq!(result.band(), ScoreBand::Moderate);
    }
}
