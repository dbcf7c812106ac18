//! Pipeline stages for Markdown-to-card rendering.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets the
//! card and carousel flows share everything below the layout.
//!
//! ## Data Flow
//!
//! ```text
//!                card:   parse ──▶ typography ──┐
//! input ──▶                                      ├──▶ layout ──▶ vector ──▶ render ──▶ encode
//!                carousel: segment ─────────────┘                 (SVG)     (resvg)    (PNG/base64)
//! ```
//!
//! 1. [`input`]      — CLI only: read a file, URL or stdin into Markdown text
//! 2. [`parse`]      — title, subtitle, highlights and HTML body of one card
//! 3. [`segment`]    — split a long text into carousel slides
//! 4. [`typography`] — hanging punctuation, widow control, colour contrast
//! 5. [`vector`]     — lay out the visual tree and write SVG
//! 6. [`render`]     — rasterise SVG; runs in `spawn_blocking`
//! 7. [`encode`]     — PNG bytes and base64
//!
//! [`color`] is shared by the typography and vector stages.

pub mod color;
pub mod encode;
pub mod input;
pub mod parse;
pub mod render;
pub mod segment;
pub mod typography;
pub mod vector;
