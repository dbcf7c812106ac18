//! The three card templates.
//!
//! Each builder maps `(CardConfig, ParsedContent)` to a visual tree sized to
//! the configured dimensions. Builders never fail: colours are validated when
//! the tree is written out.

use crate::config::{CardConfig, DecorativePattern};
use crate::layout::markup::flatten_markup;
use crate::layout::pattern::corner_curve;
use crate::layout::tree::{
    Align, Block, Border, Edges, Frame, Graphic, Inline, Justify, Node, Paint, Position, Sides,
    TextAlign, TextBlock, TextRun, TextStyle,
};
use crate::pipeline::parse::ParsedContent;

/// Placeholders shown when the instagram labels are not configured.
pub const DEFAULT_USERNAME: &str = "username";
pub const DEFAULT_SLIDE_LABEL: &str = "1/10";
pub const DEFAULT_AUTHOR: &str = "Твоё имя или подпись";

const ARROW_ICON: &str = concat!(
    r#"<g fill="none" stroke="currentColor" stroke-width="2">"#,
    r#"<line x1="5" y1="12" x2="19" y2="12"/>"#,
    r#"<polyline points="12,5 19,12 12,19"/>"#,
    "</g>"
);

// ── Instagram ────────────────────────────────────────────────────────────────

pub fn instagram(config: &CardConfig, content: &ParsedContent) -> Node {
    let theme = &config.color_theme;
    let typo = &config.typography;
    let base = base_style(config);
    let label = TextStyle {
        font_size: 16.0,
        line_height: 1.2,
        ..base.clone()
    };

    let header = Block {
        frame: Frame {
            margin: Edges::bottom(60.0),
            opacity: 0.7,
            ..Frame::default()
        },
        justify: Justify::SpaceBetween,
        align: Align::Center,
        ..Block::row()
    }
    .child(TextBlock::plain(
        label.clone(),
        format!("@{}", config.username.as_deref().unwrap_or(DEFAULT_USERNAME)),
    ))
    .child(TextBlock::plain(
        label.clone(),
        config.slide_number.as_deref().unwrap_or(DEFAULT_SLIDE_LABEL),
    ));

    let mut root = root_block(config, Edges { top: 48.0, right: 40.0, bottom: 40.0, left: 40.0 })
        .child(header);
    root.radius = 24.0;
    root.clip = true;

    if let Some(title) = non_empty(&content.title) {
        let style = TextStyle {
            font_family: typo.heading_font.clone(),
            font_size: 48.0,
            weight: 700,
            line_height: 1.1,
            letter_spacing: -0.02,
            ..base.clone()
        };
        let accent = config.features.colored_text.then_some(theme.accent.as_str());
        root = root.child(TextBlock {
            frame: margin_bottom(40.0),
            style,
            inlines: title_runs(title, &content.highlights, accent),
        });
    }
    if let Some(subtitle) = non_empty(&content.subtitle) {
        root = root.child(subtitle_block(config, subtitle, 24.0, TextAlign::Left));
    }

    let body = TextBlock {
        frame: Frame {
            grow: 1.0,
            ..margin_bottom(40.0)
        },
        style: TextStyle {
            font_size: 20.0,
            line_height: 1.4,
            ..base.clone()
        },
        inlines: body_inlines(config, content),
    };

    let footer = Block {
        frame: Frame {
            opacity: 0.6,
            ..Frame::default()
        },
        justify: Justify::SpaceBetween,
        align: Align::Center,
        ..Block::row()
    }
    .child(TextBlock::plain(
        label,
        config.author_name.as_deref().unwrap_or(DEFAULT_AUTHOR),
    ))
    .child(Graphic {
        frame: Frame::default(),
        width: 24.0,
        height: 24.0,
        view_box: (24.0, 24.0),
        color: theme.text.clone(),
        markup: ARROW_ICON.to_string(),
    });

    let mut root = root.child(body).child(footer);
    if let Some(pattern) = config.features.svg_pattern {
        // Any pattern brings the corner curve; tile patterns add their overlay.
        root = root.child(corner_curve(&theme.accent));
        if pattern != DecorativePattern::Curves {
            root = root.child(pattern_overlay(pattern, &theme.primary));
        }
    }
    root.into()
}

// ── Modern ───────────────────────────────────────────────────────────────────

pub fn modern(config: &CardConfig, content: &ParsedContent) -> Node {
    let theme = &config.color_theme;
    let typo = &config.typography;
    let base = base_style(config);

    let mut root = root_block(config, Edges::symmetric(64.0, 48.0));
    root.radius = 16.0;
    root.clip = true;

    if let Some(title) = non_empty(&content.title) {
        root = root.child(TextBlock {
            frame: margin_bottom(32.0),
            style: TextStyle {
                font_family: typo.heading_font.clone(),
                font_size: 36.0,
                weight: 600,
                line_height: 1.2,
                color: theme.primary.clone(),
                letter_spacing: -0.025,
                ..base.clone()
            },
            inlines: vec![Inline::Run(TextRun::plain(title))],
        });
    }
    if let Some(subtitle) = non_empty(&content.subtitle) {
        root = root.child(subtitle_block(config, subtitle, 22.0, TextAlign::Left));
    }

    let body = TextBlock {
        frame: Frame {
            grow: 1.0,
            ..Frame::default()
        },
        style: TextStyle {
            font_size: 18.0,
            line_height: 1.6,
            ..base
        },
        inlines: body_inlines(config, content),
    };

    let accent_bar = Block {
        frame: absolute(None, Some(0.0), Some(0.0), Some(0.0)),
        height: Some(4.0),
        background: Some(Paint::LinearGradient {
            from: theme.primary.clone(),
            to: theme.accent.clone(),
        }),
        ..Block::column()
    };

    root.child(body)
        .children(decorations(config))
        .child(accent_bar)
        .into()
}

// ── Classic ──────────────────────────────────────────────────────────────────

pub fn classic(config: &CardConfig, content: &ParsedContent) -> Node {
    let theme = &config.color_theme;
    let typo = &config.typography;
    let base = TextStyle {
        font_size: typo.font_size,
        line_height: typo.line_height,
        ..base_style(config)
    };

    let mut root = root_block(config, Edges::symmetric(100.0, 80.0));
    root.border = Some(Border {
        width: 3.0,
        color: theme.primary.clone(),
        sides: Sides::ALL,
    });

    let corner = |frame: Frame, sides: Sides| -> Node {
        Block {
            frame,
            width: Some(60.0),
            height: Some(60.0),
            border: Some(Border {
                width: 2.0,
                color: theme.primary.clone(),
                sides,
            }),
            ..Block::column()
        }
        .into()
    };
    root = root
        .child(corner(
            absolute(Some(20.0), None, None, Some(20.0)),
            Sides { top: true, right: false, bottom: false, left: true },
        ))
        .child(corner(
            absolute(None, Some(20.0), Some(20.0), None),
            Sides { top: false, right: true, bottom: true, left: false },
        ));

    if let Some(title) = non_empty(&content.title) {
        root = root.child(TextBlock {
            frame: margin_bottom(30.0),
            style: TextStyle {
                font_family: typo.heading_font.clone(),
                font_size: typo.font_size * 2.2,
                weight: 600,
                line_height: 1.3,
                color: theme.primary.clone(),
                letter_spacing: 0.02,
                align: TextAlign::Center,
                ..base.clone()
            },
            inlines: vec![Inline::Run(TextRun::plain(title))],
        });
    }
    if let Some(subtitle) = non_empty(&content.subtitle) {
        root = root.child(subtitle_block(config, subtitle, typo.font_size * 1.3, TextAlign::Center));
    }

    let divider = Block {
        frame: margin_bottom(40.0),
        justify: Justify::Center,
        ..Block::row()
    }
    .child(Block {
        frame: Frame {
            opacity: 0.7,
            ..Frame::default()
        },
        width: Some(200.0),
        height: Some(2.0),
        background: Some(Paint::Solid(theme.accent.clone())),
        ..Block::column()
    });

    let body = TextBlock {
        frame: Frame {
            grow: 1.0,
            ..Frame::default()
        },
        style: base,
        inlines: body_inlines(config, content),
    };

    root.child(divider)
        .child(body)
        .children(decorations(config))
        .into()
}

// ── Shared pieces ────────────────────────────────────────────────────────────

fn base_style(config: &CardConfig) -> TextStyle {
    TextStyle {
        font_family: config.typography.body_font.clone(),
        font_size: config.typography.font_size,
        line_height: config.typography.line_height,
        color: config.color_theme.text.clone(),
        ..TextStyle::default()
    }
}

fn root_block(config: &CardConfig, padding: Edges) -> Block {
    Block {
        width: Some(config.dimensions.width as f32),
        height: Some(config.dimensions.height as f32),
        padding,
        background: Some(Paint::Solid(config.color_theme.background.clone())),
        ..Block::column()
    }
}

fn subtitle_block(config: &CardConfig, subtitle: &str, size: f32, align: TextAlign) -> TextBlock {
    TextBlock {
        frame: margin_bottom(24.0),
        style: TextStyle {
            font_family: config.typography.heading_font.clone(),
            font_size: size,
            weight: 600,
            line_height: 1.25,
            color: config.color_theme.secondary.clone(),
            align,
            ..base_style(config)
        },
        inlines: vec![Inline::Run(TextRun::plain(subtitle))],
    }
}

fn body_inlines(config: &CardConfig, content: &ParsedContent) -> Vec<Inline> {
    let highlight = config
        .features
        .colored_text
        .then_some(config.color_theme.accent.as_str());
    flatten_markup(&content.body, highlight)
}

/// Title words that appear in `highlights` are underlined and, when a colour
/// is given, drawn in it.
fn title_runs(title: &str, highlights: &[String], accent: Option<&str>) -> Vec<Inline> {
    let words: Vec<&str> = title.split(' ').collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let highlighted = highlights.iter().any(|h| h == word);
            let text = if i < last {
                format!("{word} ")
            } else {
                word.to_string()
            };
            Inline::Run(TextRun {
                text,
                bold: false,
                color: if highlighted { accent.map(str::to_string) } else { None },
                underline: highlighted,
                hanging: false,
            })
        })
        .collect()
}

fn decorations(config: &CardConfig) -> Vec<Node> {
    match config.features.svg_pattern {
        None => Vec::new(),
        Some(DecorativePattern::Curves) => vec![corner_curve(&config.color_theme.accent).into()],
        Some(pattern) => vec![pattern_overlay(pattern, &config.color_theme.primary)],
    }
}

fn pattern_overlay(pattern: DecorativePattern, color: &str) -> Node {
    Block {
        frame: absolute(Some(0.0), Some(0.0), Some(0.0), Some(0.0)),
        background: Some(Paint::Pattern {
            pattern,
            color: color.to_string(),
        }),
        ..Block::column()
    }
    .into()
}

fn absolute(top: Option<f32>, right: Option<f32>, bottom: Option<f32>, left: Option<f32>) -> Frame {
    Frame {
        position: Position::Absolute {
            top,
            right,
            bottom,
            left,
        },
        ..Frame::default()
    }
}

fn margin_bottom(v: f32) -> Frame {
    Frame {
        margin: Edges::bottom(v),
        ..Frame::default()
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
