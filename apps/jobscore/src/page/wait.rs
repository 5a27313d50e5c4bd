//! Readiness waits: block (asynchronously) until an element with text exists.

use std::time::Duration;

use scraper::Selector;
use thiserror::Error;
use tracing::debug;

use crate::page::{parse_selector, LivePage, PageError};

/// Default bound for a single readiness wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Page closed while waiting for '{0}'")]
    PageClosed(String),
}

/// Text of the first element matching `selector`, if that text is not blank.
fn ready_text(page: &LivePage, selector: &Selector) -> Option<String> {
    page.query_text(selector)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Waits until the first element matching `selector` has non-blank text and
/// returns that text, trimmed.
///
/// Resolves without observing anything when the element is already there.
/// Otherwise one observer and one timer are registered with the page; both are
/// released on every exit path, including the future being dropped. When the
/// timer fires the page is checked one last time before giving up.
pub async fn wait_for_element(
    page: &LivePage,
    selector: &str,
    timeout: Duration,
) -> Result<String, WaitError> {
    let parsed = parse_selector(selector)?;

    if let Some(text) = ready_text(page, &parsed) {
        return Ok(text);
    }

    let mut observer = page.observe();
    // A mutation may have landed between the first check and subscribing.
    if let Some(text) = ready_text(page, &parsed) {
        return Ok(text);
    }

    let mut timer = page.set_timeout(timeout);
    loop {
        tokio::select! {
            batch = observer.next_batch() => {
                if batch.is_none() {
                    return Err(WaitError::PageClosed(selector.to_string()));
                }
                if let Some(text) = ready_text(page, &parsed) {
                    return Ok(text);
                }
            }
            _ = &mut timer => break,
        }
    }
    drop(observer);
    drop(timer);

    match ready_text(page, &parsed) {
        Some(text) => Ok(text),
        None => {
            debug!("Readiness wait for '{selector}' timed out");
            Err(WaitError::Timeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}
