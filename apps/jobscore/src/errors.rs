use thiserror::Error;

use crate::extraction::ExtractError;
use crate::scoring::ScoringError;

pub const NO_RESUME_MESSAGE: &str =
    "No resume found. Please upload a resume in the extension settings.";
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Could not extract job details. Please try refreshing the page.";
pub const SCORING_FAILED_MESSAGE: &str = "Failed to calculate match score. Please try again.";

/// Why a job's scoring pipeline ended without a result.
/// Every variant is terminal for that job and is shown on the card.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("No default resume stored")]
    NoDefaultResume,

    #[error("Extraction timed out: {0}")]
    ExtractionTimeout(String),

    #[error("Extraction incomplete: {0}")]
    ExtractionIncomplete(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    #[error("Response parse failed: {0}")]
    ResponseParseFailed(String),
}

impl MatchError {
    /// Short message for the card. Internal details are logged, not shown.
    pub fn user_message(&self) -> &'static str {
        match self {
            MatchError::NoDefaultResume => NO_RESUME_MESSAGE,
            MatchError::ExtractionTimeout(detail) | MatchError::ExtractionIncomplete(detail) => {
                tracing::warn!("Job extraction failed: {detail}");
                EXTRACTION_FAILED_MESSAGE
            }
            MatchError::RemoteCallFailed(detail) => {
                tracing::error!("Scoring call failed: {detail}");
                SCORING_FAILED_MESSAGE
            }
            MatchError::ResponseParseFailed(detail) => {
                tracing::error!("Scoring response unreadable: {detail}");
                SCORING_FAILED_MESSAGE
            }
        }
    }
}

impl From<ExtractError> for MatchError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Timeout(detail) => MatchError::ExtractionTimeout(detail),
            other => MatchError::ExtractionIncomplete(other.to_string()),
        }
    }
}

impl From<ScoringError> for MatchError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Remote(detail) => MatchError::RemoteCallFailed(detail),
            ScoringError::Response(detail) => MatchError::ResponseParseFailed(detail),
        }
    }
}
