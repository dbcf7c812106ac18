//! Body markup → styled inline runs.
//!
//! The body of a card is the HTML the Markdown renderer produced, possibly
//! decorated by the typography transforms. The vector writer does not render
//! HTML; this module flattens the handful of constructs that matter into
//! [`Inline`]s and drops every other tag:
//!
//! - `p`, `h1`–`h6`, `ul`, `ol`, `blockquote`, `table`, `pre` → paragraph break
//! - `li` → line break plus bullet, `br` and `</tr>` → line break
//! - `strong`, `b`, headings → bold
//! - `mark`, `span.highlight`, raw `***phrase***` → highlight colour
//! - `span` with a negative `margin-left` → hanging run
//! - newlines inside text → line breaks (pre-line), whitespace-only text
//!   between tags is ignored
//!
//! Tokenising is done by html5ever, which also decodes character references
//! (including legacy names without the trailing `;` that hanging punctuation
//! leaves behind). Markup corrupted by that transform degrades into literal
//! text instead of failing.

use crate::layout::tree::{Inline, TextRun};
use crate::pipeline::parse::RE_HIGHLIGHT;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Hanging,
    Highlight,
    Plain,
}

struct Flattener<'a> {
    out: Vec<Inline>,
    highlight: Option<&'a str>,
    /// Character data since the last tag; the tokenizer may split it.
    pending: String,
    bold: usize,
    marked: usize,
    hanging: usize,
    spans: Vec<SpanKind>,
}

/// html5ever token sink driving a [`Flattener`].
struct FlattenSink<'a> {
    state: RefCell<Flattener<'a>>,
}

impl TokenSink for FlattenSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut f = self.state.borrow_mut();
        match token {
            Token::CharacterTokens(text) => f.pending.push_str(&text),
            Token::TagToken(tag) => {
                f.flush_text();
                f.tag(&tag);
            }
            Token::EOFToken => f.flush_text(),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Flatten `markup` into inline runs. `highlight` is the colour of marked
/// text; `None` renders highlights in the surrounding colour.
pub fn flatten_markup(markup: &str, highlight: Option<&str>) -> Vec<Inline> {
    let sink = FlattenSink {
        state: RefCell::new(Flattener {
            out: Vec::new(),
            highlight,
            pending: String::new(),
            bold: 0,
            marked: 0,
            hanging: 0,
            spans: Vec::new(),
        }),
    };

    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let mut f = tokenizer.sink.state.borrow_mut();
    f.flush_text();
    while matches!(f.out.last(), Some(Inline::Break { .. })) {
        f.out.pop();
    }
    std::mem::take(&mut f.out)
}

impl Flattener<'_> {
    fn tag(&mut self, tag: &Tag) {
        let closing = tag.kind == TagKind::EndTag;
        // The tokenizer lowercases tag names.
        let name: &str = &tag.name;

        match (closing, name) {
            (false, "strong" | "b") => self.bold += 1,
            (true, "strong" | "b") => self.bold = self.bold.saturating_sub(1),
            (false, "mark") => self.marked += 1,
            (true, "mark") => self.marked = self.marked.saturating_sub(1),
            (false, "span") => {
                let kind = span_kind(tag);
                match kind {
                    SpanKind::Hanging => self.hanging += 1,
                    SpanKind::Highlight => self.marked += 1,
                    SpanKind::Plain => {}
                }
                self.spans.push(kind);
            }
            (true, "span") => match self.spans.pop() {
                Some(SpanKind::Hanging) => self.hanging = self.hanging.saturating_sub(1),
                Some(SpanKind::Highlight) => self.marked = self.marked.saturating_sub(1),
                _ => {}
            },
            (false, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                self.push_break(true);
                self.bold += 1;
            }
            (true, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                self.bold = self.bold.saturating_sub(1);
                self.push_break(true);
            }
            (_, "p" | "ul" | "ol" | "blockquote" | "table" | "pre") => self.push_break(true),
            (_, "br") | (true, "tr") | (true, "li") => self.push_break(false),
            (false, "li") => {
                self.push_break(false);
                self.push_run("• ");
            }
            (true, "td" | "th") => self.push_run(" "),
            _ => {}
        }
    }

    fn flush_text(&mut self) {
        let raw = std::mem::take(&mut self.pending);
        if raw.is_empty() || (raw.trim().is_empty() && raw.contains('\n')) {
            return;
        }
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                self.push_break(false);
                if line.trim().is_empty() {
                    self.upgrade_break();
                }
            }
            self.highlighted_text(line.trim_end_matches('\r'));
        }
    }

    /// Plain text that may still contain `***phrase***` markers.
    fn highlighted_text(&mut self, text: &str) {
        let mut last = 0;
        for caps in RE_HIGHLIGHT.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            self.push_run(&text[last..whole.start()]);
            self.marked += 1;
            self.push_run(inner.as_str());
            self.marked -= 1;
            last = whole.end();
        }
        self.push_run(&text[last..]);
    }

    fn push_run(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let run = TextRun {
            text: text.to_string(),
            bold: self.bold > 0,
            color: if self.marked > 0 {
                self.highlight.map(str::to_string)
            } else {
                None
            },
            underline: false,
            hanging: self.hanging > 0,
        };
        if let Some(Inline::Run(prev)) = self.out.last_mut() {
            if prev.bold == run.bold
                && prev.color == run.color
                && prev.hanging == run.hanging
                && !run.hanging
            {
                prev.text.push_str(&run.text);
                return;
            }
        }
        self.out.push(Inline::Run(run));
    }

    fn push_break(&mut self, gap: bool) {
        match self.out.last_mut() {
            None => {}
            Some(Inline::Break { gap: g }) => *g |= gap,
            Some(Inline::Run(_)) => self.out.push(Inline::Break { gap }),
        }
    }

    fn upgrade_break(&mut self) {
        if let Some(Inline::Break { gap }) = self.out.last_mut() {
            *gap = true;
        }
    }
}

/// Hanging spans carry a negative `margin-left`; highlight spans mention
/// `highlight` in their class or style.
fn span_kind(tag: &Tag) -> SpanKind {
    let attr = |key: &str| {
        tag.attrs
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| str::to_ascii_lowercase(&a.value))
            .unwrap_or_default()
    };
    let style = attr("style");
    if style.contains("margin-left: -") || style.contains("margin-left:-") {
        SpanKind::Hanging
    } else if style.contains("highlight") || attr("class").contains("highlight") {
        SpanKind::Highlight
    } else {
        SpanKind::Plain
    }
}
