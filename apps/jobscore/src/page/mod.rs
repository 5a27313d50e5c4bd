//! Live page: the in-process stand-in for the job site's document.
//!
//! A `LivePage` carries the current URL, the rendered HTML, a single slot for
//! the injected match card, and a mutation broadcast that plays the role of a
//! document-wide mutation observer. Observers and timers handed out by the page
//! are counted so callers can verify they were released.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use scraper::{Html, Selector};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;
use url::Url;

pub mod loader;
pub mod wait;

const MUTATION_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Parses a CSS selector (selector groups such as `a, b` are allowed).
pub fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|_| PageError::InvalidSelector(selector.to_string()))
}

/// A single change delivered to page observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The document subtree was re-rendered.
    ContentReplaced,
    CardInserted,
    CardRemoved,
}

/// Where an injected card ended up in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPlacement {
    /// Inserted right before the job description container.
    Embedded,
    /// Appended to the end of `<body>` because no anchor was found.
    Floating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjectedCard {
    pub html: String,
    pub text: String,
    pub placement: CardPlacement,
}

struct PageState {
    url: Url,
    html: String,
    card: Option<InjectedCard>,
}

struct PageInner {
    state: Mutex<PageState>,
    mutations: Mutex<Option<broadcast::Sender<Mutation>>>,
    live_observers: Arc<AtomicUsize>,
    live_timers: Arc<AtomicUsize>,
}

/// Shared handle to the page. Clones refer to the same document.
#[derive(Clone)]
pub struct LivePage {
    inner: Arc<PageInner>,
}

impl LivePage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_BUFFER);
        Self {
            inner: Arc::new(PageInner {
                state: Mutex::new(PageState {
                    url,
                    html: html.into(),
                    card: None,
                }),
                mutations: Mutex::new(Some(mutations)),
                live_observers: Arc::new(AtomicUsize::new(0)),
                live_timers: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn mutations(&self) -> MutexGuard<'_, Option<broadcast::Sender<Mutation>>> {
        self.inner
            .mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, mutation: Mutation) {
        if let Some(tx) = self.mutations().as_ref() {
            // No receivers simply means nobody is observing right now.
            let _ = tx.send(mutation);
        }
    }

    /// Disconnects every observer, current and future. The document and the
    /// card slot stay readable.
    pub fn close(&self) {
        if self.mutations().take().is_some() {
            debug!("Page {} closed", self.url());
        }
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.mutations().is_none()
    }

    pub fn url(&self) -> Url {
        self.state().url.clone()
    }

    /// Changes the URL without touching the document, like `history.pushState`.
    /// Observers are not notified.
    pub fn push_state(&self, url: Url) {
        self.state().url = url;
    }

    /// Replaces the rendered document and notifies observers.
    pub fn set_content(&self, html: impl Into<String>) {
        self.state().html = html.into();
        self.emit(Mutation::ContentReplaced);
    }

    /// An in-app transition: new URL and re-rendered content in one step.
    pub fn navigate(&self, url: Url, html: impl Into<String>) {
        {
            let mut state = self.state();
            state.url = url;
            state.html = html.into();
        }
        self.emit(Mutation::ContentReplaced);
    }

    /// `textContent` of the first element matching `selector`, untrimmed.
    pub fn query_text(&self, selector: &Selector) -> Option<String> {
        let html = self.state().html.clone();
        let document = Html::parse_document(&html);
        let text = document
            .select(selector)
            .next()
            .map(|element| element.text().collect::<String>());
        text
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        let html = self.state().html.clone();
        let document = Html::parse_document(&html);
        let found = document.select(selector).next().is_some();
        found
    }

    /// Puts `card` into the card slot, returning whatever occupied it.
    pub fn insert_card(&self, card: InjectedCard) -> Option<InjectedCard> {
        let previous = self.state().card.replace(card);
        self.emit(Mutation::CardInserted);
        previous
    }

    pub fn remove_card(&self) -> Option<InjectedCard> {
        let removed = self.state().card.take();
        if removed.is_some() {
            self.emit(Mutation::CardRemoved);
        }
        removed
    }

    pub fn card(&self) -> Option<InjectedCard> {
        self.state().card.clone()
    }

    /// Registers a page-wide observer. It stays live until dropped.
    pub fn observe(&self) -> MutationObserver {
        let rx = match self.mutations().as_ref() {
            Some(tx) => tx.subscribe(),
            // Sender dropped right away: the observer sees a closed page.
            None => broadcast::channel(1).1,
        };
        self.inner.live_observers.fetch_add(1, Ordering::SeqCst);
        MutationObserver {
            rx,
            live: Arc::clone(&self.inner.live_observers),
        }
    }

    /// Starts a one-shot timer owned by the page. It is cleared when dropped.
    pub fn set_timeout(&self, duration: Duration) -> PageTimer {
        self.inner.live_timers.fetch_add(1, Ordering::SeqCst);
        PageTimer {
            sleep: Box::pin(tokio::time::sleep(duration)),
            live: Arc::clone(&self.inner.live_timers),
        }
    }

    pub fn live_observers(&self) -> usize {
        self.inner.live_observers.load(Ordering::SeqCst)
    }

    pub fn live_timers(&self) -> usize {
        self.inner.live_timers.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl LivePage {
    /// Replaces the document without notifying observers.
    pub(crate) fn replace_content_unobserved(&self, html: impl Into<String>) {
        self.state().html = html.into();
    }
}

/// Receives mutation batches until dropped (which disconnects it).
pub struct MutationObserver {
    rx: broadcast::Receiver<Mutation>,
    live: Arc<AtomicUsize>,
}

impl MutationObserver {
    /// Waits for the next batch of mutations. Returns `None` once the page is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<Mutation>> {
        let first = match self.rx.recv().await {
            Ok(mutation) => mutation,
            Err(RecvError::Lagged(skipped)) => {
                debug!("Observer lagged behind by {skipped} mutations");
                Mutation::ContentReplaced
            }
            Err(RecvError::Closed) => return None,
        };

        let mut batch = vec![first];
        loop {
            match self.rx.try_recv() {
                Ok(mutation) => batch.push(mutation),
                Err(TryRecvError::Lagged(_)) => batch.push(Mutation::ContentReplaced),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Some(batch)
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One-shot timer future handed out by [`LivePage::set_timeout`].
pub struct PageTimer {
    sleep: Pin<Box<tokio::time::Sleep>>,
    live: Arc<AtomicUsize>,
}

impl Future for PageTimer {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.sleep.as_mut().poll(cx)
    }
}

impl Drop for PageTimer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
