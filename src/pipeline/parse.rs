//! Content parsing: Markdown → [`ParsedContent`] for a single card.
//!
//! A card has at most one title and one subtitle, taken from the first
//! level-1 and level-2 heading lines. Everything else becomes the HTML body.
//! `***phrase***` marks a highlight: the phrase is recorded in
//! [`ParsedContent::highlights`] and wrapped in `<mark>` in the body so the
//! layout can colour it.
//!
//! Parsing never fails. Empty input yields an empty body.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The structured content of one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// HTML markup. Typography post-processors may rewrite it before layout.
    pub body: String,
    /// Highlighted phrases, in order of appearance, duplicates kept.
    pub highlights: Vec<String>,
}

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static RE_SUBTITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##\s+(.+)$").unwrap());
pub(crate) static RE_HIGHLIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*\*(.*?)\*\*\*").unwrap());

/// Parse a card's Markdown.
pub fn parse_markdown(markdown: &str) -> ParsedContent {
    let title = first_capture(&RE_TITLE, markdown);
    let subtitle = first_capture(&RE_SUBTITLE, markdown);
    let highlights = extract_highlights(markdown);

    let stripped = RE_TITLE.replace(markdown, "");
    let stripped = RE_SUBTITLE.replace(&stripped, "");
    let marked = RE_HIGHLIGHT.replace_all(&stripped, "<mark>${1}</mark>");

    ParsedContent {
        title,
        subtitle,
        body: markdown_to_html(marked.trim()),
        highlights,
    }
}

/// Every `***phrase***` in `text`, non-greedy, in order.
pub fn extract_highlights(text: &str) -> Vec<String> {
    RE_HIGHLIGHT
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// GFM extensions shared by the card renderer and the slide segmenter.
pub(crate) fn gfm_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Render Markdown to HTML with tables and strikethrough enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, gfm_options()));
    out
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|caps| caps[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_subtitle() {
        let p = parse_markdown("# Big Idea\n## Why it matters\nBody text.");
        assert_eq!(p.title.as_deref(), Some("Big Idea"));
        assert_eq!(p.subtitle.as_deref(), Some("Why it matters"));
        assert_eq!(p.body, "<p>Body text.</p>\n");
    }

    #[test]
    fn test_first_heading_wins() {
        let p = parse_markdown("# One\n\ntext\n\n# Two");
        assert_eq!(p.title.as_deref(), Some("One"));
        // Only the first level-1 line is removed.
        assert!(p.body.contains("<h1>Two</h1>"), "got: {}", p.body);
        assert!(!p.body.contains("One"));
    }

    #[test]
    fn test_no_title() {
        let p = parse_markdown("just a paragraph");
        assert_eq!(p.title, None);
        assert_eq!(p.subtitle, None);
    }

    #[test]
    fn test_level_three_is_not_a_subtitle() {
        let p = parse_markdown("### Deep");
        assert_eq!(p.subtitle, None);
        assert!(p.body.contains("<h3>Deep</h3>"));
    }

    #[test]
    fn test_highlights_in_order() {
        let p = parse_markdown("***bold one*** and ***bold two***");
        assert_eq!(p.highlights, vec!["bold one", "bold two"]);
        assert_eq!(
            p.body,
            "<p><mark>bold one</mark> and <mark>bold two</mark></p>\n"
        );
    }

    #[test]
    fn test_highlight_duplicates_kept() {
        assert_eq!(extract_highlights("***a*** ***a***"), vec!["a", "a"]);
    }

    #[test]
    fn test_empty_input() {
        let p = parse_markdown("");
        assert_eq!(p, ParsedContent::default());
    }

    #[test]
    fn test_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "got: {html}");
    }
}
