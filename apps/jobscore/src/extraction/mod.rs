//! Job Detail Extractor: reads title, company and description off the page
//! once the asynchronously rendered job panel is ready.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::page::wait::{wait_for_element, WaitError, DEFAULT_WAIT_TIMEOUT};
use crate::page::{parse_selector, LivePage, PageError};

/// Upper bound on the description sent to the model, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 3000;
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    pub description: String,
}

/// CSS selectors for the job panel. Defaults target the LinkedIn job view.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub title: String,
    pub company: String,
    pub description: String,
    /// Element the match card is inserted in front of.
    pub card_anchor: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            title: ".jobs-unified-top-card__job-title, \
                    .job-details-jobs-unified-top-card__job-title"
                .to_string(),
            company: ".jobs-unified-top-card__company-name, \
                      .job-details-jobs-unified-top-card__company-name"
                .to_string(),
            description: ".jobs-box__html-content div".to_string(),
            card_anchor: ".jobs-description__content, .jobs-description".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Job details did not render in time: {0}")]
    Timeout(String),

    #[error("Job details are incomplete (missing {0})")]
    Incomplete(&'static str),

    #[error(transparent)]
    Page(#[from] PageError),
}

impl From<WaitError> for ExtractError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Page(e) => ExtractError::Page(e),
            other => ExtractError::Timeout(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobDetailExtractor {
    selectors: PageSelectors,
    wait_timeout: Duration,
}

impl Default for JobDetailExtractor {
    fn default() -> Self {
        Self::new(PageSelectors::default(), DEFAULT_WAIT_TIMEOUT)
    }
}

impl JobDetailExtractor {
    pub fn new(selectors: PageSelectors, wait_timeout: Duration) -> Self {
        Self {
            selectors,
            wait_timeout,
        }
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.selectors
    }

    /// Waits for the title and then the description, and reads the details.
    pub async fn extract(&self, page: &LivePage) -> Result<JobDetails, ExtractError> {
        wait_for_element(page, &self.selectors.title, self.wait_timeout).await?;
        wait_for_element(page, &self.selectors.description, self.wait_timeout).await?;
        let details = self.read_details(page)?;
        debug!(
            "Extracted '{}' at '{}' ({} description chars)",
            details.title,
            details.company,
            details.description.chars().count()
        );
        Ok(details)
    }

    /// Reads the details as the page currently stands, without waiting.
    pub fn read_details(&self, page: &LivePage) -> Result<JobDetails, ExtractError> {
        let title = read_trimmed(page, &self.selectors.title)?;
        let company = read_trimmed(page, &self.selectors.company)?;
        let description = read_trimmed(page, &self.selectors.description)?;

        if title.is_empty() {
            warn!("Job title element is empty");
            return Err(ExtractError::Incomplete("title"));
        }
        if description.is_empty() {
            warn!("Job description element is empty");
            return Err(ExtractError::Incomplete("description"));
        }

        Ok(JobDetails {
            title,
            company: if company.is_empty() {
                UNKNOWN_COMPANY.to_string()
            } else {
                company
            },
            description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        })
    }
}

fn read_trimmed(page: &LivePage, selector: &str) -> Result<String, PageError> {
    let parsed = parse_selector(selector)?;
    Ok(page
        .query_text(&parsed)
        .map(|text| text.trim().to_string())
        .unwrap_or_default())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
