//! Slide segmentation: Markdown → ordered [`SlideData`] for a carousel.
//!
//! ## Rules
//!
//! | Block | Effect |
//! |-------|--------|
//! | `# Heading` | intro slide; an immediately following paragraph becomes its text |
//! | `## Heading` | opens a text slide that collects later paragraphs and lists |
//! | `> quote` | quote slide (small type above 100 characters) |
//! | paragraph / list | appended to the open text slide, dropped otherwise |
//! | anything else | ignored |
//!
//! A level-1 heading or a quote does **not** close the open text slide, so
//! paragraphs after them still land in the last `##` slide.
//!
//! ## Two phases
//!
//! Text slides are collected in a mutable [`SlideAccumulator`] and turned into
//! an immutable [`SlideData`] once the whole document has been scanned. The
//! accumulator keeps its position in the output so slide order matches
//! document order.

use crate::config::{CarouselSettings, FinalSlideKind};
use crate::pipeline::parse::gfm_options;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Quotes longer than this many characters are rendered small.
pub const SMALL_QUOTE_THRESHOLD: usize = 100;

// ── Slide model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Intro,
    Text,
    Quote,
}

/// Colour scheme of a slide: `Accent` slides use the brand colour as
/// background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideColor {
    #[default]
    Default,
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideSize {
    Small,
    Medium,
    Large,
}

/// One slide of a carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideData {
    #[serde(rename = "type")]
    pub kind: SlideKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub color: SlideColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SlideSize>,
}

impl SlideData {
    pub fn intro(title: impl Into<String>, text: Option<String>) -> Self {
        Self {
            kind: SlideKind::Intro,
            title: Some(title.into()),
            subtitle: None,
            text,
            color: SlideColor::Accent,
            size: None,
        }
    }

    pub fn text(title: Option<String>, text: Option<String>, color: SlideColor) -> Self {
        Self {
            kind: SlideKind::Text,
            title,
            subtitle: None,
            text,
            color,
            size: None,
        }
    }

    pub fn quote(text: impl Into<String>) -> Self {
        let text = text.into();
        let size = if text.chars().count() > SMALL_QUOTE_THRESHOLD {
            SlideSize::Small
        } else {
            SlideSize::Large
        };
        Self {
            kind: SlideKind::Quote,
            title: None,
            subtitle: None,
            text: Some(text),
            color: SlideColor::Accent,
            size: Some(size),
        }
    }
}

/// A text slide under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideAccumulator {
    title: String,
    paragraphs: Vec<String>,
    list_items: Vec<String>,
}

impl SlideAccumulator {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn push_paragraph(&mut self, text: impl Into<String>) {
        self.paragraphs.push(text.into());
    }

    pub fn push_list(&mut self, items: impl IntoIterator<Item = String>) {
        self.list_items.extend(items);
    }

    /// Paragraphs joined by blank lines, then every list item as a bullet
    /// line. An accumulator with neither yields a slide without text.
    pub fn finish(self) -> SlideData {
        let mut text = self.paragraphs.join("\n\n");
        if !self.list_items.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            let bullets: Vec<String> = self.list_items.iter().map(|i| format!("• {i}")).collect();
            text.push_str(&bullets.join("\n"));
        }
        SlideData::text(
            Some(self.title),
            (!text.is_empty()).then_some(text),
            SlideColor::Default,
        )
    }
}

// ── Block tokens ─────────────────────────────────────────────────────────────

/// Top-level Markdown blocks, reduced to the raw source the segmenter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockToken {
    Heading { level: u8, text: String },
    Paragraph(String),
    /// Raw source of every item, markers stripped.
    List(Vec<String>),
    /// Raw source of the first inner block, `>` markers stripped.
    Quote(String),
    Other,
}

/// Split Markdown into top-level [`BlockToken`]s.
pub fn block_tokens(markdown: &str) -> Vec<BlockToken> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut block: Vec<(Event<'_>, Range<usize>)> = Vec::new();

    for (event, range) in Parser::new_ext(markdown, gfm_options()).into_offset_iter() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        block.push((event, range));
        if depth == 0 {
            tokens.push(classify_block(markdown, &block));
            block.clear();
        }
    }
    tokens
}

fn classify_block(src: &str, events: &[(Event<'_>, Range<usize>)]) -> BlockToken {
    let inner = || -> Vec<Range<usize>> {
        events
            .get(1..events.len().saturating_sub(1))
            .unwrap_or_default()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    };
    match events.first() {
        Some((Event::Start(Tag::Heading { level, .. }), _)) => BlockToken::Heading {
            level: heading_level(*level),
            text: span_source(src, &inner()),
        },
        Some((Event::Start(Tag::Paragraph), _)) => BlockToken::Paragraph(span_source(src, &inner())),
        Some((Event::Start(Tag::List(_)), _)) => BlockToken::List(list_items(src, events)),
        Some((Event::Start(Tag::BlockQuote(_)), _)) => BlockToken::Quote(quote_text(src, events)),
        _ => BlockToken::Other,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Source text covered by `ranges`, trimmed.
fn span_source(src: &str, ranges: &[Range<usize>]) -> String {
    let start = ranges.iter().map(|r| r.start).min();
    let end = ranges.iter().map(|r| r.end).max();
    match (start, end) {
        (Some(s), Some(e)) => src.get(s..e).unwrap_or_default().trim().to_string(),
        _ => String::new(),
    }
}

/// Children of the direct child blocks of a container, one entry per child.
fn direct_children<'a, 'e>(
    events: &'a [(Event<'e>, Range<usize>)],
) -> Vec<(Option<&'a Tag<'e>>, Vec<Range<usize>>)> {
    let mut children = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<(Option<&'a Tag<'e>>, Vec<Range<usize>>)> = None;

    for (event, range) in events {
        match event {
            Event::Start(tag) => {
                depth += 1;
                if depth == 2 {
                    current = Some((Some(tag), Vec::new()));
                    continue;
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    children.extend(current.take());
                }
                depth = depth.saturating_sub(1);
                if depth < 2 {
                    continue;
                }
            }
            _ if depth == 1 => {
                // A leaf directly inside the container (e.g. a rule in a quote).
                children.push((None, vec![range.clone()]));
                continue;
            }
            _ => {}
        }
        if let Some((_, inner)) = current.as_mut() {
            inner.push(range.clone());
        }
    }
    children
}

fn list_items(src: &str, events: &[(Event<'_>, Range<usize>)]) -> Vec<String> {
    direct_children(events)
        .into_iter()
        .filter(|(tag, _)| matches!(tag, Some(Tag::Item)))
        .map(|(_, inner)| span_source(src, &inner))
        .collect()
}

fn quote_text(src: &str, events: &[(Event<'_>, Range<usize>)]) -> String {
    let Some((_, inner)) = direct_children(events).into_iter().next() else {
        return String::new();
    };
    span_source(src, &inner)
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('>').map_or(line, str::trim_start)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Segmentation ─────────────────────────────────────────────────────────────

enum Draft {
    Ready(SlideData),
    Text(SlideAccumulator),
}

enum ScanState {
    NoActiveSlide,
    /// Index into the drafts of the open text slide.
    AccumulatingText(usize),
}

/// Segment Markdown into slides, in document order.
pub fn parse_markdown_to_slides(markdown: &str) -> Vec<SlideData> {
    let tokens = block_tokens(markdown);
    let mut drafts: Vec<Draft> = Vec::new();
    let mut state = ScanState::NoActiveSlide;

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            BlockToken::Heading { level: 1, text } => {
                let intro_text = match tokens.get(i + 1) {
                    Some(BlockToken::Paragraph(p)) if !p.is_empty() => {
                        i += 1;
                        Some(p.clone())
                    }
                    _ => None,
                };
                drafts.push(Draft::Ready(SlideData::intro(text.clone(), intro_text)));
            }
            BlockToken::Heading { level: 2, text } => {
                drafts.push(Draft::Text(SlideAccumulator::new(text.clone())));
                state = ScanState::AccumulatingText(drafts.len() - 1);
            }
            BlockToken::Quote(text) => {
                drafts.push(Draft::Ready(SlideData::quote(text.clone())));
            }
            BlockToken::Paragraph(text) => {
                if let Some(acc) = open_accumulator(&mut drafts, &state) {
                    acc.push_paragraph(text.clone());
                }
            }
            BlockToken::List(items) => {
                if let Some(acc) = open_accumulator(&mut drafts, &state) {
                    acc.push_list(items.iter().cloned());
                }
            }
            BlockToken::Heading { .. } | BlockToken::Other => {}
        }
        i += 1;
    }

    drafts
        .into_iter()
        .map(|d| match d {
            Draft::Ready(slide) => slide,
            Draft::Text(acc) => acc.finish(),
        })
        .collect()
}

fn open_accumulator<'a>(drafts: &'a mut [Draft], state: &ScanState) -> Option<&'a mut SlideAccumulator> {
    match state {
        ScanState::AccumulatingText(idx) => match drafts.get_mut(*idx) {
            Some(Draft::Text(acc)) => Some(acc),
            _ => None,
        },
        ScanState::NoActiveSlide => None,
    }
}

/// Append the configured closing slide, if enabled.
pub fn add_final_slide(mut slides: Vec<SlideData>, settings: &CarouselSettings) -> Vec<SlideData> {
    let Some(fs) = settings.final_slide.as_ref().filter(|fs| fs.enabled) else {
        return slides;
    };

    let (title, text, color) = match fs.kind {
        FinalSlideKind::Cta => ("Подписывайтесь!", "Больше контента в профиле", SlideColor::Accent),
        FinalSlideKind::Contact => (
            "Связаться:",
            "email@example.com\n\nTelegram: @username",
            SlideColor::Default,
        ),
        FinalSlideKind::Brand => ("Спасибо за внимание!", "Помогаю бизнесу расти", SlideColor::Accent),
    };
    let non_empty = |v: &Option<String>, fallback: &str| {
        v.as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    slides.push(SlideData::text(
        Some(non_empty(&fs.title, title)),
        Some(non_empty(&fs.text, text)),
        fs.color.unwrap_or(color),
    ));
    slides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FinalSlideSettings;

    #[test]
    fn test_block_tokens() {
        let tokens = block_tokens("# Title\n\npara *x*\n\n- a\n- b\n\n> q\n\n---\n");
        assert_eq!(
            tokens,
            vec![
                BlockToken::Heading { level: 1, text: "Title".into() },
                BlockToken::Paragraph("para *x*".into()),
                BlockToken::List(vec!["a".into(), "b".into()]),
                BlockToken::Quote("q".into()),
                BlockToken::Other,
            ]
        );
    }

    #[test]
    fn test_multiline_quote_strips_markers() {
        let tokens = block_tokens("> line one\n> line two\n");
        assert_eq!(tokens, vec![BlockToken::Quote("line one\nline two".into())]);
    }

    #[test]
    fn test_scenario_segmentation() {
        let md = "# Hello\nWorld intro\n## Point One\nSome text\n- item A\n- item B\n> A short quote";
        let slides = parse_markdown_to_slides(md);
        assert_eq!(slides.len(), 3);

        assert_eq!(slides[0], SlideData::intro("Hello", Some("World intro".into())));
        assert_eq!(slides[0].color, SlideColor::Accent);

        assert_eq!(slides[1].kind, SlideKind::Text);
        assert_eq!(slides[1].title.as_deref(), Some("Point One"));
        assert_eq!(slides[1].text.as_deref(), Some("Some text\n\n• item A\n• item B"));
        assert_eq!(slides[1].color, SlideColor::Default);

        assert_eq!(slides[2].kind, SlideKind::Quote);
        assert_eq!(slides[2].text.as_deref(), Some("A short quote"));
        assert_eq!(slides[2].size, Some(SlideSize::Large));
    }

    #[test]
    fn test_tables_are_skipped() {
        let slides = parse_markdown_to_slides("## Data\nIntro line\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title.as_deref(), Some("Data"));
        assert_eq!(slides[0].text.as_deref(), Some("Intro line"));
    }

    #[test]
    fn test_intro_without_paragraph() {
        let slides = parse_markdown_to_slides("# Only\n## Next\nbody");
        assert_eq!(slides[0].text, None);
        assert_eq!(slides[1].text.as_deref(), Some("body"));
    }

    #[test]
    fn test_long_quote_is_small() {
        let long = "x".repeat(101);
        let slides = parse_markdown_to_slides(&format!("> {long}"));
        assert_eq!(slides[0].size, Some(SlideSize::Small));
        let exact = "y".repeat(100);
        let slides = parse_markdown_to_slides(&format!("> {exact}"));
        assert_eq!(slides[0].size, Some(SlideSize::Large));
    }

    #[test]
    fn test_paragraph_without_open_slide_is_dropped() {
        assert!(parse_markdown_to_slides("just words").is_empty());
    }

    #[test]
    fn test_intro_does_not_close_text_slide() {
        let md = "## A\none\n# B\nintro\n\nstray";
        let slides = parse_markdown_to_slides(md);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].text.as_deref(), Some("one\n\nstray"));
        assert_eq!(slides[1].text.as_deref(), Some("intro"));
    }

    #[test]
    fn test_items_of_several_lists_join_with_newline() {
        let md = "## L\n- a\n- b\n\npara\n\n1. c\n";
        let slides = parse_markdown_to_slides(md);
        assert_eq!(slides[0].text.as_deref(), Some("para\n\n• a\n• b\n• c"));
    }

    #[test]
    fn test_text_slide_without_content() {
        let slides = parse_markdown_to_slides("## Empty");
        assert_eq!(slides[0].text, None);
    }

    #[test]
    fn test_final_slide_cta() {
        let settings = CarouselSettings {
            final_slide: Some(FinalSlideSettings::new(FinalSlideKind::Cta)),
            ..Default::default()
        };
        let slides = add_final_slide(Vec::new(), &settings);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].kind, SlideKind::Text);
        assert_eq!(slides[0].title.as_deref(), Some("Подписывайтесь!"));
        assert_eq!(slides[0].color, SlideColor::Accent);
    }

    #[test]
    fn test_final_slide_overrides() {
        let mut fs = FinalSlideSettings::new(FinalSlideKind::Contact);
        fs.title = Some(String::new());
        fs.text = Some("hi@acme.io".into());
        fs.color = Some(SlideColor::Accent);
        let settings = CarouselSettings {
            final_slide: Some(fs),
            ..Default::default()
        };
        let slides = add_final_slide(Vec::new(), &settings);
        assert_eq!(slides[0].title.as_deref(), Some("Связаться:"));
        assert_eq!(slides[0].text.as_deref(), Some("hi@acme.io"));
        assert_eq!(slides[0].color, SlideColor::Accent);
    }

    #[test]
    fn test_final_slide_disabled() {
        let mut fs = FinalSlideSettings::new(FinalSlideKind::Brand);
        fs.enabled = false;
        let settings = CarouselSettings {
            final_slide: Some(fs),
            ..Default::default()
        };
        assert!(add_final_slide(Vec::new(), &settings).is_empty());
    }

    #[test]
    fn test_slide_json_shape() {
        let json = serde_json::to_value(SlideData::quote("q")).unwrap();
        assert_eq!(json["type"], "quote");
        assert_eq!(json["color"], "accent");
        assert_eq!(json["size"], "large");
        assert!(json.get("title").is_none());
    }
}
