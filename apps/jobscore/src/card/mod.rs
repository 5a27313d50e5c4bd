//! Card Renderer: the single owner of the injected match card.

use tracing::debug;

use crate::page::{parse_selector, CardPlacement, InjectedCard, LivePage};
use crate::scoring::MatchResult;

pub mod render;

pub use render::{render_html, render_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCardState {
    Loading,
    Error(String),
    Result(MatchResult),
}

/// Shows and removes the match card. Showing always replaces the previous card.
pub trait CardRenderer: Send + Sync {
    fn show(&self, state: &MatchCardState);
    fn remove(&self);
}

/// Injects the card into a live page, in front of the job description when
/// the anchor exists and at the end of the body otherwise.
pub struct PageCardRenderer {
    page: LivePage,
    anchor: String,
}

impl PageCardRenderer {
    pub fn new(page: LivePage, anchor: impl Into<String>) -> Self {
        Self {
            page,
            anchor: anchor.into(),
        }
    }

    fn placement(&self) -> CardPlacement {
        match parse_selector(&self.anchor) {
            Ok(selector) if self.page.contains(&selector) => CardPlacement::Embedded,
            _ => CardPlacement::Floating,
        }
    }
}

impl CardRenderer for PageCardRenderer {
    fn show(&self, state: &MatchCardState) {
        self.page.remove_card();
        let placement = self.placement();
        debug!("Showing {:?} card ({placement:?})", discriminant_name(state));
        self.page.insert_card(InjectedCard {
            html: render_html(state),
            text: render_text(state),
            placement,
        });
    }

    fn remove(&self) {
        if self.page.remove_card().is_some() {
            debug!("Removed match card");
        }
    }
}

fn discriminant_name(state: &MatchCardState) -> &'static str {
    match state {
        MatchCardState::Loading => "loading",
        MatchCardState::Error(_) => "error",
        MatchCardState::Result(_) => "result",
    }
}
