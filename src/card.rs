//! Single-card entry points.
//!
//! ## Flow
//!
//! ```text
//! markdown ──▶ parse ──▶ hanging punctuation ──▶ widow control ──▶ contrast fix
//!                                                                      │
//!                      PNG ◀── encode ◀── rasterize ◀── SVG ◀── layout ┘
//! ```
//!
//! [`prepare_card`] is the pure front half: it validates the request and
//! returns the effective config and content. [`render_card`] is the back
//! half shared with the carousel. [`generate_card`] chains both.

use crate::config::{CardConfig, CardConfigBuilder, Dimensions, FontSource};
use crate::error::CardError;
use crate::layout;
use crate::pipeline::parse::{parse_markdown, ParsedContent};
use crate::pipeline::render::{self, FontData};
use crate::pipeline::typography::{
    apply_hanging_punctuation, control_widows_orphans, ensure_contrast, DEFAULT_MIN_CONTRAST,
};
use crate::pipeline::{encode, vector};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Render one Markdown string to PNG bytes.
///
/// # Errors
/// - [`CardError::Validation`] for blank content or an unparseable theme colour
/// - [`CardError::FontUnavailable`] when a font file cannot be read
/// - [`CardError::RenderFailed`] for layout, rasterisation or encoding failures
pub async fn generate_card(
    markdown: &str,
    config: &CardConfig,
    fonts: &FontSource,
) -> Result<Vec<u8>, CardError> {
    let (config, content) = prepare_card(markdown, config)?;
    render_card(&config, &content, fonts).await
}

/// Render a card and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_card_to_file(
    markdown: &str,
    output_path: impl AsRef<Path>,
    config: &CardConfig,
    fonts: &FontSource,
) -> Result<usize, CardError> {
    let png = generate_card(markdown, config, fonts).await?;
    write_atomic(output_path.as_ref(), &png).await?;
    Ok(png.len())
}

/// Validate the request and apply the typography post-processing.
///
/// Returns the effective config (clamped, text colour contrast-fixed) and the
/// parsed content with its body rewritten by the enabled transforms.
pub fn prepare_card(markdown: &str, config: &CardConfig) -> Result<(CardConfig, ParsedContent), CardError> {
    if markdown.trim().is_empty() {
        return Err(CardError::Validation("Content is required".into()));
    }
    let mut config = CardConfigBuilder::from(config.clone()).build()?;

    let mut content = parse_markdown(markdown);
    if config.features.hanging_punctuation {
        content.body = apply_hanging_punctuation(&content.body);
    }
    if config.features.widow_orphan_control {
        content.body = control_widows_orphans(&content.body);
    }

    let theme = &mut config.color_theme;
    theme.text = ensure_contrast(&theme.text, &theme.background, DEFAULT_MIN_CONTRAST)
        .map_err(|e| CardError::Validation(format!("colorTheme: {e}")))?;

    debug!(
        title = content.title.as_deref().unwrap_or(""),
        highlights = content.highlights.len(),
        body_len = content.body.len(),
        "Card content prepared"
    );
    Ok((config, content))
}

/// Load the fonts and render `content` with `config`.
pub async fn render_card(
    config: &CardConfig,
    content: &ParsedContent,
    fonts: &FontSource,
) -> Result<Vec<u8>, CardError> {
    let fonts = Arc::new(render::load_fonts(fonts).await?);
    render_card_with_fonts(config, content, fonts).await
}

/// Render with already-loaded fonts. The carousel loads fonts once and calls
/// this for every slide.
pub async fn render_card_with_fonts(
    config: &CardConfig,
    content: &ParsedContent,
    fonts: Arc<FontData>,
) -> Result<Vec<u8>, CardError> {
    let start = Instant::now();
    let Dimensions { width, height } = config.dimensions;

    let tree = layout::build_layout(config, content);
    let svg = vector::to_svg(&tree, width, height)?;
    let layout_ms = start.elapsed().as_millis() as u64;
    debug!("Laid out {} card → {} bytes SVG in {}ms", config.style, svg.len(), layout_ms);

    let png = tokio::task::spawn_blocking(move || {
        let img = render::rasterize(&svg, &fonts, width, height)?;
        encode::encode_png(&img)
    })
    .await
    .map_err(|e| CardError::Internal(format!("Render task panicked: {}", e)))??;

    info!(
        "Rendered {}x{} {} card: {} bytes in {}ms",
        width,
        height,
        config.style,
        png.len(),
        start.elapsed().as_millis()
    );
    Ok(png)
}

/// Atomic write: write to `<path>.tmp`, then rename over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CardError> {
    let fail = |source| CardError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp);

    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}
