//! The visual tree: a small flexbox-flavoured box model.
//!
//! Templates build it, [`crate::pipeline::vector`] lays it out and writes SVG.
//! Only the features the three templates use exist: column/row flow,
//! padding, margins, `grow`, space-between, centring, fixed sizes, absolute
//! overlays, solid/gradient/pattern fills, borders, corner radius, opacity.

use crate::config::DecorativePattern;

/// A node of the visual tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Block),
    Text(TextBlock),
    Graphic(Graphic),
}

impl Node {
    pub fn frame(&self) -> &Frame {
        match self {
            Node::Block(b) => &b.frame,
            Node::Text(t) => &t.frame,
            Node::Graphic(g) => &g.frame,
        }
    }
}

/// Placement properties shared by every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub margin: Edges,
    /// Share of the parent's free main-axis space this node absorbs.
    pub grow: f32,
    pub position: Position,
    pub opacity: f32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            margin: Edges::ZERO,
            grow: 0.0,
            position: Position::Flow,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub const fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// CSS two-value shorthand: vertical, horizontal.
    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub const fn bottom(v: f32) -> Self {
        Self {
            bottom: v,
            ..Self::ZERO
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flow,
    /// Taken out of flow and placed against the parent's border box.
    Absolute {
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
        left: Option<f32>,
    },
}

// ── Blocks ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Column,
    Row,
}

/// Main-axis distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    SpaceBetween,
}

/// Cross-axis placement (rows only; column children always stretch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(String),
    /// Left-to-right gradient.
    LinearGradient { from: String, to: String },
    /// Tiled decorative pattern in the given colour.
    Pattern { pattern: DecorativePattern, color: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: String,
    pub sides: Sides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sides {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Sides {
    pub const ALL: Sides = Sides {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }
}

/// A container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub frame: Frame,
    pub direction: Direction,
    pub justify: Justify,
    pub align: Align,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub padding: Edges,
    pub background: Option<Paint>,
    pub border: Option<Border>,
    pub radius: f32,
    /// Clip children to the rounded border box.
    pub clip: bool,
    pub children: Vec<Node>,
}

impl Block {
    pub fn column() -> Self {
        Self::default()
    }

    pub fn row() -> Self {
        Self {
            direction: Direction::Row,
            ..Self::default()
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }
}

impl From<Block> for Node {
    fn from(b: Block) -> Self {
        Node::Block(b)
    }
}

// ── Text ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub weight: u16,
    /// Multiplier of `font_size`.
    pub line_height: f32,
    pub color: String,
    /// In em.
    pub letter_spacing: f32,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_size: 16.0,
            weight: 400,
            line_height: 1.4,
            color: "#000000".into(),
            letter_spacing: 0.0,
            align: TextAlign::Left,
        }
    }
}

/// A styled piece of text inside a paragraph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Overrides the block colour.
    pub color: Option<String>,
    pub underline: bool,
    /// Pulled 0.3 em left when it starts a line.
    pub hanging: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(TextRun),
    /// Hard line break; `gap` adds half a line of extra space (paragraphs).
    Break { gap: bool },
}

/// A paragraph-like text node. Wrapped at the width its parent gives it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub frame: Frame,
    pub style: TextStyle,
    pub inlines: Vec<Inline>,
}

impl TextBlock {
    pub fn new(style: TextStyle, inlines: Vec<Inline>) -> Self {
        Self {
            frame: Frame::default(),
            style,
            inlines,
        }
    }

    pub fn plain(style: TextStyle, text: impl Into<String>) -> Self {
        Self::new(style, vec![Inline::Run(TextRun::plain(text))])
    }

    pub fn is_empty(&self) -> bool {
        self.inlines.iter().all(|i| match i {
            Inline::Run(r) => r.text.trim().is_empty(),
            Inline::Break { .. } => true,
        })
    }
}

impl From<TextBlock> for Node {
    fn from(t: TextBlock) -> Self {
        Node::Text(t)
    }
}

// ── Graphics ─────────────────────────────────────────────────────────────────

/// Fixed-size vector artwork. `markup` holds SVG elements in the coordinate
/// system of `view_box` and paints with `currentColor`, which resolves to
/// `color`.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub frame: Frame,
    pub width: f32,
    pub height: f32,
    pub view_box: (f32, f32),
    pub color: String,
    pub markup: String,
}

impl From<Graphic> for Node {
    fn from(g: Graphic) -> Self {
        Node::Graphic(g)
    }
}
