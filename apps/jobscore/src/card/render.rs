//! Markup and plain-text forms of the match card.

use crate::card::MatchCardState;
use crate::scoring::MatchResult;

pub const BRAND: &str = "JobScore Pro";
pub const MAX_FEEDBACK_LINES: usize = 3;
const LOGO_SRC: &str = "icon.png";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn header(title: &str) -> String {
    format!(
        "<header class=\"job-match-header\">\
         <div class=\"job-match-title-container\">\
         <img src=\"{LOGO_SRC}\" alt=\"{BRAND}\" class=\"job-match-header-logo\">\
         <h1 class=\"job-match-title\">{title}</h1>\
         </div></header>"
    )
}

fn feedback_lines(result: &MatchResult) -> impl Iterator<Item = &String> {
    result.feedback.iter().take(MAX_FEEDBACK_LINES)
}

fn confidence(result: &MatchResult) -> &str {
    result.confidence.as_deref().unwrap_or("N/A")
}

pub fn render_html(state: &MatchCardState) -> String {
    match state {
        MatchCardState::Loading => format!(
            "<div class=\"job-match-card loading\">\
             <div class=\"job-match-loading\">\
             <div class=\"job-match-spinner\"><img src=\"{LOGO_SRC}\" alt=\"{BRAND}\" class=\"job-match-logo\"></div>\
             <span>{BRAND} is calculating your match score...</span>\
             </div></div>"
        ),
        MatchCardState::Error(message) => format!(
            "<div class=\"job-match-card\">{}<div class=\"job-match-error\">{}</div></div>",
            header("Job Match Score"),
            escape_html(message)
        ),
        MatchCardState::Result(result) => {
            let band = result.band();
            let items: String = feedback_lines(result)
                .map(|line| {
                    format!(
                        "<li class=\"job-match-summary-item\"><div class=\"summary-bullet\"></div>\
                         <p class=\"summary-text\">{}</p></li>",
                        escape_html(line)
                    )
                })
                .collect();
            format!(
                "<div class=\"job-match-card\">{}\
                 <div class=\"job-match-score-container\">\
                 <div class=\"job-match-score-circle {}\"><span>{}</span></div>\
                 <div class=\"job-match-score-label\">\
                 <p class=\"job-match-score-text\">Match Score</p>\
                 <p class=\"job-match-score-level\">{} Match - Confidence: {}</p>\
                 </div></div>\
                 <ul class=\"job-match-summary\">{}</ul></div>",
                header(BRAND),
                band.css_class(),
                result.score,
                band.label(),
                escape_html(confidence(result)),
                items
            )
        }
    }
}

pub fn render_text(state: &MatchCardState) -> String {
    match state {
        MatchCardState::Loading => format!("{BRAND} is calculating your match score..."),
        MatchCardState::Error(message) => format!("Job Match Score\n{message}"),
        MatchCardState::Result(result) => {
            let mut text = format!(
                "{BRAND}\nMatch Score: {}\n{} Match - Confidence: {}",
                result.score,
                result.band().label(),
                confidence(result)
            );
            for line in feedback_lines(result) {
                text.push_str("\n  - ");
                text.push_str(line);
            }
            text
        }
    }
}
