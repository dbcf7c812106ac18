//! End-to-end integration tests for md2card.
//!
//! Rendering tests use the real font files in `./assets/fonts/`
//! (`Inter-Regular.ttf`, `Inter-Bold.ttf`) and skip when they are absent, so
//! a fresh checkout without the binary assets still passes.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use md2card::pipeline::typography::{ensure_contrast, generate_color_variations};
use md2card::pipeline::{color::parse_color, parse::extract_highlights};
use md2card::{
    add_final_slide, generate_card, generate_card_to_file, generate_carousel, parse_markdown,
    parse_markdown_to_slides, router, AppState, CardConfig, CardStyle, CarouselProgressCallback,
    CarouselSettings, DecorativePattern, FinalSlideKind, FinalSlideSettings, FontSource,
    NoopProgressCallback, ServerConfig, SlideColor, SlideKind, SlideSize,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn fonts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// Skip this test if the bundled font files are missing.
macro_rules! skip_unless_fonts {
    () => {{
        let fonts = FontSource::from_dir(fonts_dir());
        if !fonts.is_available() {
            println!("SKIP — font files not found in {}", fonts_dir().display());
            println!("       Place Inter-Regular.ttf and Inter-Bold.ttf there to run render tests");
            return;
        }
        fonts
    }};
}

/// Number of distinct RGBA values in a PNG. Anti-aliased text produces many.
fn distinct_colours(png: &[u8]) -> usize {
    let img = image::load_from_memory(png).expect("valid PNG").to_rgba8();
    let mut seen: Vec<[u8; 4]> = img.pixels().map(|p| p.0).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

const SAMPLE_CARD: &str = "# Professional Card\n## Subtitle\nThis is ***highlighted text*** with professional typography.\n\n- Clean design\n- Modern approach\n- High quality";

const SAMPLE_CAROUSEL: &str =
    "# Hello\nWorld intro\n## Point One\nSome text\n- item A\n- item B\n> A short quote";

// ── Pure pipeline properties (no fonts needed) ───────────────────────────────

#[test]
fn test_title_extraction() {
    assert_eq!(parse_markdown("# First\n# Second").title.as_deref(), Some("First"));
    assert_eq!(parse_markdown("no heading here").title, None);
}

#[test]
fn test_highlights_in_order() {
    assert_eq!(
        extract_highlights("***bold one*** and ***bold two***"),
        vec!["bold one", "bold two"]
    );
}

#[test]
fn test_carousel_segmentation_scenario() {
    let slides = parse_markdown_to_slides(SAMPLE_CAROUSEL);
    assert_eq!(slides.len(), 3);

    assert_eq!(slides[0].kind, SlideKind::Intro);
    assert_eq!(slides[0].title.as_deref(), Some("Hello"));
    assert_eq!(slides[0].text.as_deref(), Some("World intro"));

    assert_eq!(slides[1].kind, SlideKind::Text);
    assert_eq!(slides[1].title.as_deref(), Some("Point One"));
    assert_eq!(slides[1].text.as_deref(), Some("Some text\n\n• item A\n• item B"));

    assert_eq!(slides[2].kind, SlideKind::Quote);
    assert_eq!(slides[2].text.as_deref(), Some("A short quote"));
    assert_eq!(slides[2].size, Some(SlideSize::Large));
}

#[test]
fn test_cta_final_slide() {
    let settings = CarouselSettings {
        final_slide: Some(FinalSlideSettings::new(FinalSlideKind::Cta)),
        ..CarouselSettings::default()
    };
    let slides = add_final_slide(Vec::new(), &settings);
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title.as_deref(), Some("Подписывайтесь!"));
    assert_eq!(slides[0].color, SlideColor::Accent);
}

#[test]
fn test_sufficient_contrast_is_unchanged() {
    assert_eq!(ensure_contrast("#1f2937", "#ffffff", 4.5).unwrap(), "#1f2937");
}

#[test]
fn test_color_variations_increase_in_lightness() {
    let shades = generate_color_variations("#2563eb", 5).unwrap();
    assert_eq!(shades.len(), 5);
    let lightness: Vec<f64> = shades
        .iter()
        .map(|s| parse_color(s).unwrap().to_oklch().l)
        .collect();
    assert!(lightness.windows(2).all(|w| w[0] < w[1]), "got {lightness:?}");
}

#[test]
fn test_callbacks_are_send_sync() {
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}
    assert_send_sync::<NoopProgressCallback>();
    assert_send_sync::<dyn CarouselProgressCallback>();
}

#[tokio::test]
async fn test_missing_fonts_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate_card("# Hi", &CardConfig::default(), &FontSource::from_dir(dir.path()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Font file unavailable"), "got: {err}");
}

#[tokio::test]
async fn test_unparseable_fonts_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = FontSource::from_dir(dir.path());
    std::fs::write(&fonts.regular, b"").unwrap();
    std::fs::write(&fonts.bold, b"not a font").unwrap();

    let err = generate_card("# Hi", &CardConfig::default(), &fonts).await.unwrap_err();
    assert!(err.to_string().contains("not a TrueType/OpenType font"), "got: {err}");
}

#[test]
fn test_tables_do_not_leak_into_slides() {
    let slides = parse_markdown_to_slides("## Data\nIntro line\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
    assert_eq!(slides[0].text.as_deref(), Some("Intro line"));
}

// ── Rendering with real fonts ────────────────────────────────────────────────

#[tokio::test]
async fn test_render_card_every_style() {
    let fonts = skip_unless_fonts!();
    for style in [CardStyle::Instagram, CardStyle::Modern, CardStyle::Classic] {
        let config = CardConfig::builder()
            .style(style)
            .username("acme")
            .pattern(Some(DecorativePattern::Dots))
            .build()
            .unwrap();
        let png = generate_card(SAMPLE_CARD, &config, &fonts).await.unwrap();

        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (1080, 1350), "style {style}");
        assert!(distinct_colours(&png) > 20, "style {style}: no text drawn?");
    }
}

#[tokio::test]
async fn test_text_is_actually_drawn() {
    let fonts = skip_unless_fonts!();
    let config = CardConfig::builder()
        .style(CardStyle::Modern)
        .dimensions(400, 300)
        .build()
        .unwrap();
    let short = generate_card("x", &config, &fonts).await.unwrap();
    let long = generate_card(&"words ".repeat(60), &config, &fonts).await.unwrap();
    assert!(distinct_colours(&long) > distinct_colours(&short));
}

#[tokio::test]
async fn test_card_to_file() {
    let fonts = skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");

    let bytes = generate_card_to_file(SAMPLE_CARD, &path, &CardConfig::default(), &fonts)
        .await
        .unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, bytes);
}

#[tokio::test]
async fn test_carousel_end_to_end() {
    let fonts = skip_unless_fonts!();
    let settings = CarouselSettings {
        username: Some("acme".into()),
        brand_color: Some("#10b981".into()),
        final_slide: Some(FinalSlideSettings::new(FinalSlideKind::Brand)),
        ..CarouselSettings::default()
    };
    let output = generate_carousel(SAMPLE_CAROUSEL, &settings, &fonts, &NoopProgressCallback)
        .await
        .unwrap();
    assert_eq!(output.slides.len(), 4);
    assert_eq!(output.images.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let paths = md2card::carousel::write_slides(&output, dir.path()).await.unwrap();
    for path in &paths {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (1080, 1350));
    }
    assert!(paths[3].ends_with("slide-04.png"));
}

#[tokio::test]
async fn test_http_card_route_with_real_fonts() {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    let fonts = skip_unless_fonts!();
    let app = router(AppState::new(ServerConfig {
        fonts,
        ..ServerConfig::default()
    }));
    let body = serde_json::json!({ "content": SAMPLE_CARD, "style": "classic" }).to_string();
    let resp = app
        .oneshot(
            Request::post("/api/card/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let png = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(distinct_colours(&png) > 20);
}
