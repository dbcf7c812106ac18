//! Carousel entry points: one long Markdown text → a sequence of slide PNGs.
//!
//! ## Flow
//!
//! 1. segment the text into [`SlideData`] (`pipeline::segment`);
//! 2. no slides found → a single untitled slide with the first 200 characters;
//! 3. append the closing slide, if enabled;
//! 4. render every slide sequentially with a per-slide [`CardConfig`]
//!    (slide label `i/n`, accent slides on the brand colour);
//! 5. base64 every PNG and assemble [`CarouselOutput`].
//!
//! Fonts are loaded once per carousel. The first failing slide aborts the
//! whole carousel with [`CardError::SlideFailed`].
//!
//! Slide bodies are plain text (paragraphs, `•` bullets) and skip the
//! typography transforms of the single-card flow.

use crate::card::{render_card_with_fonts, write_atomic};
use crate::config::{
    CardConfig, CardStyle, CarouselSettings, ColorTheme, DecorativePattern, FontSource,
    DEFAULT_ACCENT, DEFAULT_BACKGROUND, DEFAULT_PRIMARY, DEFAULT_SECONDARY, DEFAULT_TEXT,
};
use crate::error::CardError;
use crate::output::{CarouselMetadata, CarouselOutput, ENGINE};
use crate::pipeline::encode::{decode_base64, encode_base64};
use crate::pipeline::parse::{extract_highlights, ParsedContent};
use crate::pipeline::render::{self, FontData};
use crate::pipeline::segment::{add_final_slide, parse_markdown_to_slides, SlideColor, SlideData};
use crate::progress::CarouselProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Characters of raw input kept on the fallback slide.
pub const FALLBACK_TEXT_CHARS: usize = 200;

const CAROUSEL_FONT_SIZE: f32 = 18.0;
const CAROUSEL_LINE_HEIGHT: f32 = 1.5;
const CAROUSEL_WIDTH: u32 = 1080;
const CAROUSEL_HEIGHT: u32 = 1350;
const ACCENT_TEXT: &str = "#ffffff";

/// Render a carousel.
///
/// # Errors
/// - [`CardError::Validation`] when `settings.brand_color` does not parse
/// - [`CardError::FontUnavailable`] when a font file cannot be read
/// - [`CardError::SlideFailed`] wrapping the first slide failure
pub async fn generate_carousel(
    text: &str,
    settings: &CarouselSettings,
    fonts: &FontSource,
    progress: &dyn CarouselProgressCallback,
) -> Result<CarouselOutput, CardError> {
    settings.validate()?;
    let fonts = Arc::new(render::load_fonts(fonts).await?);
    generate_carousel_with_fonts(text, settings, fonts, progress).await
}

/// Render a carousel with already-loaded fonts. `settings` must already be
/// validated.
pub async fn generate_carousel_with_fonts(
    text: &str,
    settings: &CarouselSettings,
    fonts: Arc<FontData>,
    progress: &dyn CarouselProgressCallback,
) -> Result<CarouselOutput, CardError> {
    let start = Instant::now();
    info!("Generating carousel ({} chars)", text.chars().count());

    let slides = build_slides(text, settings);
    let total = slides.len();
    progress.on_carousel_start(total);

    let mut images = Vec::with_capacity(total);
    for (i, slide) in slides.iter().enumerate() {
        let number = i + 1;
        progress.on_slide_start(number, total);

        let rendered = match slide_card_config(slide, settings, number, total) {
            Ok(config) => render_card_with_fonts(&config, &slide_content(slide), Arc::clone(&fonts)).await,
            Err(e) => Err(e),
        };
        match rendered {
            Ok(png) => {
                debug!("Slide {}/{} → {} bytes PNG", number, total, png.len());
                progress.on_slide_complete(number, total, png.len());
                images.push(encode_base64(&png));
            }
            Err(e) => {
                error!("Slide {}/{} failed: {}", number, total, e);
                progress.on_slide_error(number, total, &e.to_string());
                return Err(CardError::SlideFailed {
                    slide: number,
                    total,
                    source: Box::new(e),
                });
            }
        }
    }

    let processing_time = start.elapsed().as_millis() as u64;
    progress.on_carousel_complete(total);
    info!("Carousel complete: {} slides in {}ms", total, processing_time);

    Ok(CarouselOutput {
        slides,
        images,
        metadata: CarouselMetadata {
            total_slides: total,
            generated_at: chrono::Utc::now().to_rfc3339(),
            processing_time,
            settings: settings.clone(),
            engine: ENGINE.to_string(),
        },
    })
}

/// Write every slide image into `dir` as `slide-01.png`, `slide-02.png`, …
///
/// Each file is written atomically. Returns the paths in slide order.
pub async fn write_slides(output: &CarouselOutput, dir: &Path) -> Result<Vec<PathBuf>, CardError> {
    let digits = output.images.len().to_string().len().max(2);
    let mut paths = Vec::with_capacity(output.images.len());
    for (i, b64) in output.images.iter().enumerate() {
        let png = decode_base64(b64)?;
        let path = dir.join(format!("slide-{:0digits$}.png", i + 1));
        write_atomic(&path, &png).await?;
        debug!("Wrote {} ({} bytes)", path.display(), png.len());
        paths.push(path);
    }
    Ok(paths)
}

/// Segment `text`, fall back to a single slide, append the closing slide.
pub fn build_slides(text: &str, settings: &CarouselSettings) -> Vec<SlideData> {
    let mut slides = parse_markdown_to_slides(text);
    if slides.is_empty() {
        let excerpt: String = text.chars().take(FALLBACK_TEXT_CHARS).collect();
        slides.push(SlideData::text(None, Some(excerpt), SlideColor::Default));
    }
    add_final_slide(slides, settings)
}

/// The card configuration of slide `number` of `total`.
pub fn slide_card_config(
    slide: &SlideData,
    settings: &CarouselSettings,
    number: usize,
    total: usize,
) -> Result<CardConfig, CardError> {
    let brand = settings.brand_color.as_deref();
    let (background, text) = match slide.color {
        SlideColor::Accent => (brand.unwrap_or(DEFAULT_PRIMARY), ACCENT_TEXT),
        SlideColor::Default => (DEFAULT_BACKGROUND, DEFAULT_TEXT),
    };

    let mut builder = CardConfig::builder()
        .style(settings.style.unwrap_or(CardStyle::Instagram))
        .slide_number(format!("{number}/{total}"))
        .color_theme(ColorTheme {
            primary: brand.unwrap_or(DEFAULT_PRIMARY).to_string(),
            secondary: DEFAULT_SECONDARY.to_string(),
            accent: brand.unwrap_or(DEFAULT_ACCENT).to_string(),
            background: background.to_string(),
            text: text.to_string(),
        })
        .fonts("Inter", "Inter")
        .font_size(CAROUSEL_FONT_SIZE)
        .line_height(CAROUSEL_LINE_HEIGHT)
        .dimensions(CAROUSEL_WIDTH, CAROUSEL_HEIGHT)
        .hanging_punctuation(true)
        .widow_orphan_control(true)
        .colored_text(true)
        .pattern(Some(DecorativePattern::Curves));
    if let Some(username) = &settings.username {
        builder = builder.username(username.clone());
    }
    if let Some(author) = &settings.author_name {
        builder = builder.author_name(author.clone());
    }
    builder.build()
}

/// The parsed content of a slide: its text is the body verbatim.
pub fn slide_content(slide: &SlideData) -> ParsedContent {
    let body = slide.text.clone().unwrap_or_default();
    ParsedContent {
        title: slide.title.clone(),
        subtitle: slide.subtitle.clone(),
        highlights: extract_highlights(&body),
        body,
    }
}
