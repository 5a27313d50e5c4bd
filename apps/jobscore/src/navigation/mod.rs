//! Navigation watching for a single-page application.
//!
//! The host page never reloads between jobs, so navigation is detected by
//! watching document mutations and comparing the URL against the last one
//! seen. Sources yield each distinct URL exactly once.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::orchestrator::{JobMatchOrchestrator, NavigationOutcome, PipelineOutcome};
use crate::page::{LivePage, MutationObserver};

pub mod job_id;

/// Last URL a navigation source has reported.
#[derive(Debug, Default)]
pub struct PageLocationState {
    last_observed_url: Option<Url>,
}

impl PageLocationState {
    pub fn starting_at(url: Url) -> Self {
        Self {
            last_observed_url: Some(url),
        }
    }

    /// Records `url`; returns `true` when it differs from the last one seen.
    pub fn observe(&mut self, url: &Url) -> bool {
        if self.last_observed_url.as_ref() == Some(url) {
            return false;
        }
        self.last_observed_url = Some(url.clone());
        true
    }

    pub fn last_observed_url(&self) -> Option<&Url> {
        self.last_observed_url.as_ref()
    }
}

/// Something that reports "location changed" events.
#[async_trait]
pub trait NavigationSource: Send {
    /// Location to process once before any change is observed.
    fn initial_location(&mut self) -> Option<Url> {
        None
    }

    /// Waits for the next distinct location. `None` ends the stream.
    async fn next_location(&mut self) -> Option<Url>;
}

/// Watches a live page through one page-wide mutation observer.
pub struct PageNavigationSource {
    page: LivePage,
    observer: MutationObserver,
    location: PageLocationState,
}

impl PageNavigationSource {
    pub fn new(page: LivePage) -> Self {
        let observer = page.observe();
        let location = PageLocationState::starting_at(page.url());
        Self {
            page,
            observer,
            location,
        }
    }
}

#[async_trait]
impl NavigationSource for PageNavigationSource {
    fn initial_location(&mut self) -> Option<Url> {
        self.location.last_observed_url().cloned()
    }

    async fn next_location(&mut self) -> Option<Url> {
        loop {
            self.observer.next_batch().await?;
            let url = self.page.url();
            if self.location.observe(&url) {
                debug!("Location changed to {url}");
                return Some(url);
            }
        }
    }
}

/// Synthetic feed of locations, de-duplicated the same way as the page source.
pub struct ChannelNavigationSource {
    rx: mpsc::Receiver<Url>,
    location: PageLocationState,
}

impl ChannelNavigationSource {
    pub fn new(rx: mpsc::Receiver<Url>) -> Self {
        Self {
            rx,
            location: PageLocationState::default(),
        }
    }

    pub fn channel(buffer: usize) -> (mpsc::Sender<Url>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl NavigationSource for ChannelNavigationSource {
    async fn next_location(&mut self) -> Option<Url> {
        loop {
            let url = self.rx.recv().await?;
            if self.location.observe(&url) {
                return Some(url);
            }
        }
    }
}

/// Feeds every location from `source` to the orchestrator until the source ends.
/// Returns the pipeline runs it started, which may still be in flight.
pub async fn run_navigation_loop<S: NavigationSource>(
    mut source: S,
    orchestrator: &mut JobMatchOrchestrator,
) -> Vec<JoinHandle<PipelineOutcome>> {
    let mut runs = Vec::new();
    let mut location = source.initial_location();
    if location.is_none() {
        location = source.next_location().await;
    }
    while let Some(url) = location {
        if let NavigationOutcome::Started { handle, .. } = orchestrator.handle_location(&url) {
            runs.push(handle);
        }
        location = source.next_location().await;
    }
    info!("Navigation source ended after starting {} runs", runs.len());
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_location_state_dedupes() {
        let mut state = PageLocationState::default();
        let a = url("https://www.linkedin.com/jobs/view/1/");
        let b = url("https://www.linkedin.com/jobs/view/2/");
        assert!(state.observe(&a));
        assert!(!state.observe(&a));
        assert!(state.observe(&b));
        assert!(state.observe(&a));
        assert_eq!(state.last_observed_url(), Some(&a));
    }

    #[tokio::test]
    async fn test_page_source_yields_each_url_once() {
        let start = url("https://www.linkedin.com/feed/");
        let page = LivePage::new(start.clone(), "<body></body>");
        let mut source = PageNavigationSource::new(page.clone());
        assert_eq!(source.initial_location(), Some(start));
        assert_eq!(page.live_observers(), 1);

        let job = url("https://www.linkedin.com/jobs/view/5/");
        page.navigate(job.clone(), "<body><h1>a</h1></body>");
        assert_eq!(source.next_location().await, Some(job.clone()));

        // Re-renders on the same URL must not be reported again.
        page.set_content("<body><h1>b</h1></body>");
        page.set_content("<body><h1>c</h1></body>");
        let other = url("https://www.linkedin.com/jobs/view/6/");
        page.navigate(other.clone(), "<body></body>");
        assert_eq!(source.next_location().await, Some(other));

        drop(source);
        assert_eq!(page.live_observers(), 0);
    }

    #[tokio::test]
    async fn test_page_source_ends_when_page_closes() {
        let page = LivePage::new(url("https://www.linkedin.com/feed/"), "<body></body>");
        let mut source = PageNavigationSource::new(page.clone());
        page.close();
        assert_eq!(source.next_location().await, None);
    }

    #[tokio::test]
    async fn test_push_state_is_noticed_on_next_mutation() {
        let page = LivePage::new(url("https://www.linkedin.com/feed/"), "<body></body>");
        let mut source = PageNavigationSource::new(page.clone());

        let job = url("https://www.linkedin.com/jobs/view/9/");
        page.push_state(job.clone());
        page.set_content("<body><p>rendered</p></body>");
        assert_eq!(source.next_location().await, Some(job));
    }

    #[tokio::test]
    async fn test_channel_source_dedupes_and_ends() {
        let (tx, mut source) = ChannelNavigationSource::channel(8);
        let a = url("https://www.linkedin.com/jobs/view/1/");
        let b = url("https://www.linkedin.com/jobs/view/2/");
        for u in [&a, &a, &b, &b, &a] {
            tx.send(u.clone()).await.unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(u) = source.next_location().await {
            seen.push(u);
        }
        assert_eq!(seen, vec![a.clone(), b, a]);
    }
}
