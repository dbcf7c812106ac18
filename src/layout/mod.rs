//! Layout selection: `(CardConfig, ParsedContent)` → visual tree.
//!
//! ```text
//! CardStyle ──▶ templates::{instagram, modern, classic} ──▶ tree::Node
//!                    │
//!                    ├── markup   (body HTML → inline runs)
//!                    └── pattern  (decorative overlays)
//! ```
//!
//! The tree is laid out and written as SVG by [`crate::pipeline::vector`].

pub mod markup;
pub mod pattern;
pub mod templates;
pub mod tree;

use crate::config::{CardConfig, CardStyle};
use crate::pipeline::parse::ParsedContent;
use tree::Node;

/// Build the visual tree for one card.
pub fn build_layout(config: &CardConfig, content: &ParsedContent) -> Node {
    match config.style {
        CardStyle::Instagram => templates::instagram(config, content),
        CardStyle::Modern => templates::modern(config, content),
        CardStyle::Classic => templates::classic(config, content),
    }
}
