//! # md2card
//!
//! Render Markdown into styled PNG cards and multi-slide carousels for
//! social-media posts.
//!
//! ## Why this crate?
//!
//! Headless-browser screenshot services are heavy, slow to start and render
//! slightly differently on every host. This crate lays cards out itself,
//! writes an SVG document and rasterises it with `resvg` using exactly two
//! bundled font files, so the same input produces the same pixels anywhere,
//! in tens of milliseconds and without a browser.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Parse       title / subtitle / highlights / HTML body  (card)
//!  │                 or segment into intro / text / quote slides (carousel)
//!  ├─ 2. Typography  hanging punctuation, widow control, contrast fix
//!  ├─ 3. Layout      instagram / modern / classic template → visual tree
//!  ├─ 4. Vector      box layout + text wrapping → SVG
//!  ├─ 5. Raster      resvg + tiny-skia (CPU-bound, spawn_blocking)
//!  └─ 6. Encode      PNG bytes, base64 for JSON transport
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2card::{generate_card, CardConfig, CardStyle, FontSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CardConfig::builder()
//!         .style(CardStyle::Modern)
//!         .username("acme")
//!         .build()?;
//!     let png = generate_card("# Ship it\nSmall ***daily*** releases.", &config, &FontSource::default()).await?;
//!     std::fs::write("card.png", png)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2card` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library or the router:
//! ```toml
//! md2card = { version = "0.3", default-features = false }
//! ```
//!
//! ## Fonts
//!
//! Every render reads `Inter-Regular.ttf` and `Inter-Bold.ttf` from
//! [`FontSource`] (default `./assets/fonts`). System fonts are never used; a
//! missing file fails the request with [`CardError::FontUnavailable`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod card;
pub mod carousel;
pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use card::{generate_card, generate_card_to_file, prepare_card, render_card};
pub use carousel::generate_carousel;
pub use config::{
    CardConfig, CardConfigBuilder, CardStyle, CarouselSettings, ColorTheme, DecorativePattern,
    Dimensions, Features, FinalSlideKind, FinalSlideSettings, FontSource, Typography,
};
pub use error::{CardError, ColorParseError, InputError};
pub use output::{CarouselMetadata, CarouselOutput};
pub use pipeline::parse::{parse_markdown, ParsedContent};
pub use pipeline::segment::{add_final_slide, parse_markdown_to_slides, SlideColor, SlideData, SlideKind, SlideSize};
pub use progress::{CarouselProgressCallback, NoopProgressCallback};
pub use server::{router, serve, AppState, ServerConfig};
