//! Layout-to-vector: lay out a visual tree and write it as an SVG document.
//!
//! ## Layout model
//!
//! A reduced flexbox, enough for the card templates:
//!
//! - columns stack children vertically and stretch them horizontally, rows
//!   place children at their intrinsic width;
//! - free main-axis space goes to children with `grow > 0`, otherwise it is
//!   distributed by `justify` (start, centre, space-between);
//! - `Align::Center` centres children on the cross axis;
//! - absolutely positioned children are placed against the parent's border
//!   box and do not take part in flow.
//!
//! Text is wrapped greedily using [`measure_text_width`] (0.6 em per
//! character). Breaks happen only at ASCII whitespace, so U+00A0 keeps words
//! together. Glyph placement inside a line is left to the SVG renderer's
//! shaper, which is why lines are emitted as one `<text>` each with styled
//! `<tspan>` runs.
//!
//! ## Errors
//!
//! Colours are parsed and normalised here; an unparseable colour is the only
//! failure and surfaces as [`CardError::RenderFailed`].

use crate::error::CardError;
use crate::layout::pattern::pattern_def;
use crate::layout::tree::{
    Align, Block, Direction, Graphic, Inline, Justify, Node, Paint, Position, TextAlign, TextBlock,
    TextStyle,
};
use crate::pipeline::color::{parse_color, Rgba};
use crate::pipeline::typography::measure_text_width;
use std::fmt::Write as _;

/// Width factor applied to bold runs when measuring.
const BOLD_WIDTH_FACTOR: f32 = 1.05;
/// Ascent and content height of a line box, in em.
const ASCENT: f32 = 0.95;
const CONTENT_HEIGHT: f32 = 1.2;
/// Extra space before a paragraph, in lines.
const PARAGRAPH_GAP: f32 = 0.5;
/// Left pull of a hanging run, in em.
const HANGING_PULL: f32 = 0.3;

/// Lay out `root` in a `width`×`height` canvas and return the SVG document.
pub fn to_svg(root: &Node, width: u32, height: u32) -> Result<String, CardError> {
    let mut w = SvgWriter::default();
    let canvas = Rect {
        x: 0.0,
        y: 0.0,
        w: width as f32,
        h: height as f32,
    };
    w.node(root, canvas)?;

    let mut svg = String::with_capacity(w.body.len() + w.defs.len() + 256);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    if !w.defs.is_empty() {
        let _ = write!(svg, "<defs>{}</defs>", w.defs);
    }
    svg.push_str(&w.body);
    svg.push_str("</svg>");
    Ok(svg)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

// ── Measurement ──────────────────────────────────────────────────────────────

fn in_flow(node: &&Node) -> bool {
    matches!(node.frame().position, Position::Flow)
}

/// Fixed border-box width, if the node has one.
fn fixed_width(node: &Node) -> Option<f32> {
    match node {
        Node::Block(b) => b.width,
        Node::Graphic(g) => Some(g.width),
        Node::Text(_) => None,
    }
}

/// Border-box height of `node` laid out at border-box width `width`.
fn outer_height(node: &Node, width: f32) -> f32 {
    match node {
        Node::Text(t) => text_height(t, width),
        Node::Graphic(g) => g.height,
        Node::Block(b) => b.height.unwrap_or_else(|| {
            content_height(b, (width - b.padding.horizontal()).max(0.0)) + b.padding.vertical()
        }),
    }
}

fn content_height(b: &Block, content_width: f32) -> f32 {
    let flow = b.children.iter().filter(in_flow);
    match b.direction {
        Direction::Column => flow
            .map(|c| {
                let m = c.frame().margin;
                let w = column_child_width(c, content_width);
                outer_height(c, w) + m.vertical()
            })
            .sum(),
        Direction::Row => flow
            .map(|c| {
                let m = c.frame().margin;
                let w = intrinsic_width(c, (content_width - m.horizontal()).max(0.0));
                outer_height(c, w) + m.vertical()
            })
            .fold(0.0, f32::max),
    }
}

fn column_child_width(node: &Node, content_width: f32) -> f32 {
    fixed_width(node)
        .unwrap_or_else(|| (content_width - node.frame().margin.horizontal()).max(0.0))
}

/// Width a node takes in a row: fixed width, or its widest wrapped line.
fn intrinsic_width(node: &Node, available: f32) -> f32 {
    match node {
        Node::Text(t) => wrap_text(t, available)
            .iter()
            .map(|l| l.width)
            .fold(0.0, f32::max)
            .min(available),
        Node::Block(b) => b.width.unwrap_or(available),
        Node::Graphic(g) => g.width,
    }
}

fn line_px(style: &TextStyle) -> f32 {
    style.font_size * style.line_height
}

fn text_height(t: &TextBlock, width: f32) -> f32 {
    if t.is_empty() {
        return 0.0;
    }
    let lp = line_px(&t.style);
    wrap_text(t, width)
        .iter()
        .map(|l| if l.gap_before { lp * (1.0 + PARAGRAPH_GAP) } else { lp })
        .sum()
}

// ── Text wrapping ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
struct RunStyle {
    bold: bool,
    color: Option<String>,
    underline: bool,
    hanging: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    text: String,
    style: RunStyle,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Line {
    segments: Vec<Segment>,
    width: f32,
    gap_before: bool,
}

impl Line {
    fn push(&mut self, text: &str, style: &RunStyle) {
        match self.segments.last_mut() {
            Some(last) if last.style == *style && !style.hanging => last.text.push_str(text),
            _ => self.segments.push(Segment {
                text: text.to_string(),
                style: style.clone(),
            }),
        }
    }
}

struct Wrapper<'a> {
    style: &'a TextStyle,
    max_width: f32,
    lines: Vec<Line>,
    line: Line,
    word: Vec<Segment>,
    space_pending: bool,
}

impl Wrapper<'_> {
    fn width_of(&self, text: &str, bold: bool) -> f32 {
        let size = self.style.font_size;
        let chars = text.chars().count() as f32;
        let em = measure_text_width(text) * if bold { BOLD_WIDTH_FACTOR } else { 1.0 };
        em * size + self.style.letter_spacing * size * chars
    }

    fn push_char(&mut self, ch: char, style: &RunStyle) {
        match self.word.last_mut() {
            Some(seg) if seg.style == *style => seg.text.push(ch),
            _ => self.word.push(Segment {
                text: ch.to_string(),
                style: style.clone(),
            }),
        }
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        let word_width: f32 = word.iter().map(|s| self.width_of(&s.text, s.style.bold)).sum();
        let space = self.width_of(" ", false);

        if !self.line.segments.is_empty() && self.line.width + space + word_width > self.max_width {
            self.lines.push(std::mem::take(&mut self.line));
        }
        if !self.line.segments.is_empty() && self.space_pending {
            if let Some(last) = self.line.segments.last_mut() {
                last.text.push(' ');
            }
            self.line.width += space;
        }
        for seg in &word {
            self.line.push(&seg.text, &seg.style);
        }
        self.line.width += word_width;
        self.space_pending = false;
    }

    fn hard_break(&mut self, gap: bool) {
        self.flush_word();
        self.lines.push(std::mem::take(&mut self.line));
        self.line.gap_before = gap;
        self.space_pending = false;
    }
}

/// Wrap a text block into lines no wider than `max_width` px (single words
/// wider than that overflow on a line of their own).
fn wrap_text(t: &TextBlock, max_width: f32) -> Vec<Line> {
    let mut w = Wrapper {
        style: &t.style,
        max_width,
        lines: Vec::new(),
        line: Line::default(),
        word: Vec::new(),
        space_pending: false,
    };
    for inline in &t.inlines {
        match inline {
            Inline::Break { gap } => w.hard_break(*gap),
            Inline::Run(run) => {
                let style = RunStyle {
                    bold: run.bold,
                    color: run.color.clone(),
                    underline: run.underline,
                    hanging: run.hanging,
                };
                for ch in run.text.chars() {
                    if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                        w.flush_word();
                        w.space_pending = true;
                    } else {
                        w.push_char(ch, &style);
                    }
                }
            }
        }
    }
    w.flush_word();
    if !w.line.segments.is_empty() || w.lines.is_empty() {
        w.lines.push(w.line);
    }
    w.lines
}

// ── SVG writer ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct SvgWriter {
    defs: String,
    body: String,
    next_id: usize,
}

impl SvgWriter {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn node(&mut self, node: &Node, r: Rect) -> Result<(), CardError> {
        let opacity = node.frame().opacity;
        let grouped = opacity < 1.0;
        if grouped {
            let _ = write!(self.body, r#"<g opacity="{}">"#, num(opacity.max(0.0)));
        }
        match node {
            Node::Block(b) => self.block(b, r)?,
            Node::Text(t) => self.text(t, r)?,
            Node::Graphic(g) => self.graphic(g, r)?,
        }
        if grouped {
            self.body.push_str("</g>");
        }
        Ok(())
    }

    fn block(&mut self, b: &Block, r: Rect) -> Result<(), CardError> {
        if let Some(bg) = &b.background {
            let fill = self.paint(bg)?;
            let _ = write!(
                self.body,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
                num(r.x),
                num(r.y),
                num(r.w),
                num(r.h),
                radius_attrs(b.radius),
                fill
            );
        }
        if let Some(border) = &b.border {
            self.border(border, b.radius, r)?;
        }

        let clip = b.clip && b.radius > 0.0;
        if clip {
            let id = self.id("clip");
            let _ = write!(
                self.defs,
                r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"{}/></clipPath>"#,
                num(r.x),
                num(r.y),
                num(r.w),
                num(r.h),
                radius_attrs(b.radius)
            );
            let _ = write!(self.body, r#"<g clip-path="url(#{id})">"#);
        }

        let content = Rect {
            x: r.x + b.padding.left,
            y: r.y + b.padding.top,
            w: (r.w - b.padding.horizontal()).max(0.0),
            h: (r.h - b.padding.vertical()).max(0.0),
        };
        match b.direction {
            Direction::Column => self.column(b, content)?,
            Direction::Row => self.row(b, content)?,
        }
        for child in b.children.iter().filter(|c| !in_flow(c)) {
            let placed = absolute_rect(child, r);
            self.node(child, placed)?;
        }

        if clip {
            self.body.push_str("</g>");
        }
        Ok(())
    }

    fn column(&mut self, b: &Block, c: Rect) -> Result<(), CardError> {
        let children: Vec<&Node> = b.children.iter().filter(in_flow).collect();
        let sizes: Vec<(f32, f32)> = children
            .iter()
            .map(|n| {
                let w = column_child_width(n, c.w);
                (w, outer_height(n, w))
            })
            .collect();
        let used: f32 = children
            .iter()
            .zip(&sizes)
            .map(|(n, (_, h))| h + n.frame().margin.vertical())
            .sum();
        let free = (c.h - used).max(0.0);
        let grow_total: f32 = children.iter().map(|n| n.frame().grow.max(0.0)).sum();
        let (mut cursor, gap) = main_axis_start(b.justify, free, grow_total, children.len());
        cursor += c.y;

        for (node, (w, h)) in children.iter().zip(sizes) {
            let m = node.frame().margin;
            let extra = if grow_total > 0.0 {
                free * node.frame().grow.max(0.0) / grow_total
            } else {
                0.0
            };
            let x = match b.align {
                Align::Center => c.x + m.left + (c.w - w - m.horizontal()).max(0.0) / 2.0,
                Align::Start => c.x + m.left,
            };
            let rect = Rect {
                x,
                y: cursor + m.top,
                w,
                h: h + extra,
            };
            self.node(node, rect)?;
            cursor += m.vertical() + h + extra + gap;
        }
        Ok(())
    }

    fn row(&mut self, b: &Block, c: Rect) -> Result<(), CardError> {
        let children: Vec<&Node> = b.children.iter().filter(in_flow).collect();
        let sizes: Vec<(f32, f32)> = children
            .iter()
            .map(|n| {
                let m = n.frame().margin;
                let w = intrinsic_width(n, (c.w - m.horizontal()).max(0.0));
                (w, outer_height(n, w))
            })
            .collect();
        let used: f32 = children
            .iter()
            .zip(&sizes)
            .map(|(n, (w, _))| w + n.frame().margin.horizontal())
            .sum();
        let free = (c.w - used).max(0.0);
        let grow_total: f32 = children.iter().map(|n| n.frame().grow.max(0.0)).sum();
        let (mut cursor, gap) = main_axis_start(b.justify, free, grow_total, children.len());
        cursor += c.x;

        for (node, (w, h)) in children.iter().zip(sizes) {
            let m = node.frame().margin;
            let extra = if grow_total > 0.0 {
                free * node.frame().grow.max(0.0) / grow_total
            } else {
                0.0
            };
            let y = match b.align {
                Align::Center => c.y + m.top + (c.h - h - m.vertical()).max(0.0) / 2.0,
                Align::Start => c.y + m.top,
            };
            let rect = Rect {
                x: cursor + m.left,
                y,
                w: w + extra,
                h,
            };
            self.node(node, rect)?;
            cursor += m.horizontal() + w + extra + gap;
        }
        Ok(())
    }

    fn border(&mut self, border: &crate::layout::tree::Border, radius: f32, r: Rect) -> Result<(), CardError> {
        let stroke = color_attrs("stroke", &border.color)?;
        let bw = border.width;
        let half = bw / 2.0;
        if border.sides.is_all() {
            let _ = write!(
                self.body,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{} fill="none"{} stroke-width="{}"/>"#,
                num(r.x + half),
                num(r.y + half),
                num((r.w - bw).max(0.0)),
                num((r.h - bw).max(0.0)),
                radius_attrs((radius - half).max(0.0)),
                stroke,
                num(bw)
            );
            return Ok(());
        }
        let (x0, y0, x1, y1) = (r.x, r.y, r.x + r.w, r.y + r.h);
        let mut line = |ax: f32, ay: f32, bx: f32, by: f32| {
            let _ = write!(
                self.body,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{} stroke-width="{}"/>"#,
                num(ax),
                num(ay),
                num(bx),
                num(by),
                stroke,
                num(bw)
            );
        };
        if border.sides.top {
            line(x0, y0 + half, x1, y0 + half);
        }
        if border.sides.right {
            line(x1 - half, y0, x1 - half, y1);
        }
        if border.sides.bottom {
            line(x0, y1 - half, x1, y1 - half);
        }
        if border.sides.left {
            line(x0 + half, y0, x0 + half, y1);
        }
        Ok(())
    }

    fn text(&mut self, t: &TextBlock, r: Rect) -> Result<(), CardError> {
        if t.is_empty() {
            return Ok(());
        }
        let style = &t.style;
        let size = style.font_size;
        let lp = line_px(style);
        let fill = color_attrs("fill", &style.color)?;
        let family = escape(&format!("'{}', sans-serif", style.font_family));
        let (x, anchor) = match style.align {
            TextAlign::Left => (r.x, "start"),
            TextAlign::Center => (r.x + r.w / 2.0, "middle"),
        };
        let spacing = if style.letter_spacing != 0.0 {
            format!(r#" letter-spacing="{}""#, num(style.letter_spacing * size))
        } else {
            String::new()
        };

        let mut top = r.y;
        for line in wrap_text(t, r.w) {
            if line.gap_before {
                top += lp * PARAGRAPH_GAP;
            }
            if !line.segments.is_empty() {
                let baseline = top + (lp - CONTENT_HEIGHT * size) / 2.0 + ASCENT * size;
                let _ = write!(
                    self.body,
                    r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}"{}{} text-anchor="{}" xml:space="preserve">"#,
                    num(x),
                    num(baseline),
                    family,
                    num(size),
                    style.weight,
                    fill,
                    spacing,
                    anchor
                );
                for (i, seg) in line.segments.iter().enumerate() {
                    let mut attrs = String::new();
                    if seg.style.bold && style.weight < 700 {
                        attrs.push_str(r#" font-weight="700""#);
                    }
                    if let Some(color) = &seg.style.color {
                        attrs.push_str(&color_attrs("fill", color)?);
                    }
                    if seg.style.underline {
                        attrs.push_str(r#" text-decoration="underline""#);
                    }
                    if i == 0 && seg.style.hanging && style.align == TextAlign::Left {
                        let _ = write!(attrs, r#" dx="{}""#, num(-HANGING_PULL * size));
                    }
                    let _ = write!(self.body, "<tspan{attrs}>{}</tspan>", escape(&seg.text));
                }
                self.body.push_str("</text>");
            }
            top += lp;
        }
        Ok(())
    }

    fn graphic(&mut self, g: &Graphic, r: Rect) -> Result<(), CardError> {
        let color = normalise(&g.color)?;
        let sx = if g.view_box.0 > 0.0 { r.w / g.view_box.0 } else { 1.0 };
        let sy = if g.view_box.1 > 0.0 { r.h / g.view_box.1 } else { 1.0 };
        let _ = write!(
            self.body,
            r#"<g transform="translate({} {}) scale({} {})" color="{}">{}</g>"#,
            num(r.x),
            num(r.y),
            num(sx),
            num(sy),
            color.hex,
            g.markup
        );
        Ok(())
    }

    /// Fill attributes for a paint, registering gradient/pattern defs.
    fn paint(&mut self, paint: &Paint) -> Result<String, CardError> {
        match paint {
            Paint::Solid(c) => color_attrs("fill", c),
            Paint::LinearGradient { from, to } => {
                let (from, to) = (normalise(from)?, normalise(to)?);
                let id = self.id("grad");
                let _ = write!(
                    self.defs,
                    r#"<linearGradient id="{id}" x1="0" y1="0" x2="1" y2="0"><stop offset="0" stop-color="{}" stop-opacity="{}"/><stop offset="1" stop-color="{}" stop-opacity="{}"/></linearGradient>"#,
                    from.hex,
                    num(from.alpha),
                    to.hex,
                    num(to.alpha)
                );
                Ok(format!(r#" fill="url(#{id})""#))
            }
            Paint::Pattern { pattern, color } => {
                let color = normalise(color)?;
                let id = self.id("pattern");
                self.defs.push_str(&pattern_def(*pattern, &id, &color.hex));
                Ok(format!(r#" fill="url(#{id})""#))
            }
        }
    }
}

/// Border box of an absolutely positioned child inside `parent`.
fn absolute_rect(node: &Node, parent: Rect) -> Rect {
    let Position::Absolute {
        top,
        right,
        bottom,
        left,
    } = node.frame().position
    else {
        return parent;
    };
    let w = fixed_width(node).unwrap_or_else(|| match (left, right) {
        (Some(l), Some(r)) => (parent.w - l - r).max(0.0),
        _ => intrinsic_width(node, parent.w),
    });
    let fixed_h = match node {
        Node::Block(b) => b.height,
        Node::Graphic(g) => Some(g.height),
        Node::Text(_) => None,
    };
    let h = fixed_h.unwrap_or_else(|| match (top, bottom) {
        (Some(t), Some(b)) => (parent.h - t - b).max(0.0),
        _ => outer_height(node, w),
    });
    let x = match (left, right) {
        (Some(l), _) => parent.x + l,
        (None, Some(r)) => parent.x + parent.w - r - w,
        (None, None) => parent.x,
    };
    let y = match (top, bottom) {
        (Some(t), _) => parent.y + t,
        (None, Some(b)) => parent.y + parent.h - b - h,
        (None, None) => parent.y,
    };
    Rect { x, y, w, h }
}

/// Initial main-axis offset and inter-child gap for a container.
fn main_axis_start(justify: Justify, free: f32, grow_total: f32, n: usize) -> (f32, f32) {
    if grow_total > 0.0 {
        return (0.0, 0.0);
    }
    match justify {
        Justify::Start => (0.0, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::SpaceBetween if n > 1 => (0.0, free / (n - 1) as f32),
        Justify::SpaceBetween => (0.0, 0.0),
    }
}

// ── Attribute helpers ────────────────────────────────────────────────────────

struct SvgColor {
    hex: String,
    alpha: f64,
}

fn normalise(value: &str) -> Result<SvgColor, CardError> {
    let c: Rgba = parse_color(value).map_err(|e| CardError::RenderFailed {
        detail: e.to_string(),
    })?;
    Ok(SvgColor {
        hex: Rgba { a: 1.0, ..c }.to_hex(),
        alpha: c.a,
    })
}

/// ` fill="#rrggbb"` (plus ` fill-opacity` when translucent).
fn color_attrs(attr: &str, value: &str) -> Result<String, CardError> {
    let c = normalise(value)?;
    if c.alpha < 1.0 {
        Ok(format!(r#" {attr}="{}" {attr}-opacity="{}""#, c.hex, num(c.alpha as f32)))
    } else {
        Ok(format!(r#" {attr}="{}""#, c.hex))
    }
}

fn radius_attrs(radius: f32) -> String {
    if radius > 0.0 {
        format!(r#" rx="{0}" ry="{0}""#, num(radius))
    } else {
        String::new()
    }
}

/// Compact number formatting: at most two decimals, no trailing zeros.
fn num<T: Into<f64>>(v: T) -> String {
    let v = (v.into() * 100.0).round() / 100.0;
    if v == v.trunc() {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
