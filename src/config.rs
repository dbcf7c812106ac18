//! Configuration types for card and carousel rendering.
//!
//! Every visual decision for a single card lives in [`CardConfig`], built via
//! its [`CardConfigBuilder`]. The HTTP surface deserialises partial JSON
//! straight into a `CardConfig` (every field has a serde default) and then
//! round-trips it through the builder so the same clamping and validation
//! applies to library, CLI and HTTP callers alike.
//!
//! Carousel requests carry the much smaller [`CarouselSettings`]; the
//! per-slide `CardConfig` is derived from it in [`crate::carousel`].

use crate::error::CardError;
use crate::pipeline::color::parse_color;
use crate::pipeline::segment::SlideColor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default theme colours shared by the card route and the carousel.
pub const DEFAULT_PRIMARY: &str = "#2563eb";
pub const DEFAULT_SECONDARY: &str = "#64748b";
pub const DEFAULT_ACCENT: &str = "#f59e0b";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_TEXT: &str = "#1f2937";

/// Configuration for rendering one card.
///
/// Built via [`CardConfig::builder()`] or using [`CardConfig::default()`].
///
/// # Example
/// ```rust
/// use md2card::{CardConfig, CardStyle};
///
/// let config = CardConfig::builder()
///     .style(CardStyle::Modern)
///     .username("acme")
///     .dimensions(1080, 1080)
///     .build()
///     .unwrap();
/// assert_eq!(config.dimensions.height, 1080);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardConfig {
    /// Layout template. Default: [`CardStyle::Instagram`].
    pub style: CardStyle,

    /// Handle shown in the instagram header (without the `@`).
    pub username: Option<String>,

    /// Signature shown in the instagram footer.
    pub author_name: Option<String>,

    /// Slide label such as `"3/7"`.
    pub slide_number: Option<String>,

    pub color_theme: ColorTheme,
    pub typography: Typography,
    pub dimensions: Dimensions,
    pub features: Features,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            style: CardStyle::default(),
            username: None,
            author_name: None,
            slide_number: None,
            color_theme: ColorTheme::default(),
            typography: Typography::default(),
            dimensions: Dimensions::default(),
            features: Features::default(),
        }
    }
}

impl CardConfig {
    /// Create a new builder for `CardConfig`.
    pub fn builder() -> CardConfigBuilder {
        CardConfigBuilder {
            config: Self::default(),
        }
    }
}

/// The five theme colours. Any syntax accepted by
/// [`crate::pipeline::color::parse_color`] is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorTheme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.into(),
            secondary: DEFAULT_SECONDARY.into(),
            accent: DEFAULT_ACCENT.into(),
            background: DEFAULT_BACKGROUND.into(),
            text: DEFAULT_TEXT.into(),
        }
    }
}

impl ColorTheme {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("text", &self.text),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    /// Base font size in px. Range: 6–200. Default: 16.
    pub font_size: f32,
    /// Line height multiplier. Range: 0.8–4.0. Default: 1.6.
    pub line_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading_font: "Inter".into(),
            body_font: "Inter".into(),
            font_size: 16.0,
            line_height: 1.6,
        }
    }
}

/// Output size in pixels. Range: 100–4096 per side. Default: 1080×1350.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1350,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    pub hanging_punctuation: bool,
    pub widow_orphan_control: bool,
    /// Draw `***highlighted***` phrases in the accent colour.
    pub colored_text: bool,
    /// Optional decorative overlay.
    pub svg_pattern: Option<DecorativePattern>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            hanging_punctuation: true,
            widow_orphan_control: true,
            colored_text: true,
            svg_pattern: None,
        }
    }
}

/// Builder for [`CardConfig`].
#[derive(Debug)]
pub struct CardConfigBuilder {
    config: CardConfig,
}

/// Re-applies every clamp of the builder to an existing config, e.g. one
/// deserialised from a request body.
impl From<CardConfig> for CardConfigBuilder {
    fn from(config: CardConfig) -> Self {
        let Dimensions { width, height } = config.dimensions;
        let Typography {
            font_size,
            line_height,
            ..
        } = config.typography;
        CardConfigBuilder { config }
            .dimensions(width, height)
            .font_size(font_size)
            .line_height(line_height)
    }
}

impl CardConfigBuilder {
    pub fn style(mut self, style: CardStyle) -> Self {
        self.config.style = style;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn author_name(mut self, name: impl Into<String>) -> Self {
        self.config.author_name = Some(name.into());
        self
    }

    pub fn slide_number(mut self, label: impl Into<String>) -> Self {
        self.config.slide_number = Some(label.into());
        self
    }

    pub fn color_theme(mut self, theme: ColorTheme) -> Self {
        self.config.color_theme = theme;
        self
    }

    pub fn fonts(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.config.typography.heading_font = heading.into();
        self.config.typography.body_font = body.into();
        self
    }

    pub fn font_size(mut self, px: f32) -> Self {
        self.config.typography.font_size = if px.is_finite() {
            px.clamp(6.0, 200.0)
        } else {
            Typography::default().font_size
        };
        self
    }

    pub fn line_height(mut self, multiplier: f32) -> Self {
        self.config.typography.line_height = if multiplier.is_finite() {
            multiplier.clamp(0.8, 4.0)
        } else {
            Typography::default().line_height
        };
        self
    }

    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.config.dimensions = Dimensions {
            width: width.clamp(100, 4096),
            height: height.clamp(100, 4096),
        };
        self
    }

    pub fn hanging_punctuation(mut self, v: bool) -> Self {
        self.config.features.hanging_punctuation = v;
        self
    }

    pub fn widow_orphan_control(mut self, v: bool) -> Self {
        self.config.features.widow_orphan_control = v;
        self
    }

    pub fn colored_text(mut self, v: bool) -> Self {
        self.config.features.colored_text = v;
        self
    }

    pub fn pattern(mut self, pattern: Option<DecorativePattern>) -> Self {
        self.config.features.svg_pattern = pattern;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Every theme colour must parse; a bad colour is reported as
    /// [`CardError::Validation`] naming the offending field.
    pub fn build(self) -> Result<CardConfig, CardError> {
        let c = &self.config;
        let Dimensions { width, height } = c.dimensions;
        if !(100..=4096).contains(&width) || !(100..=4096).contains(&height) {
            return Err(CardError::Validation(format!(
                "Dimensions must be 100–4096 px, got {width}×{height}"
            )));
        }
        if !(6.0..=200.0).contains(&c.typography.font_size) {
            return Err(CardError::Validation(format!(
                "Font size must be 6–200 px, got {}",
                c.typography.font_size
            )));
        }
        for (field, value) in c.color_theme.entries() {
            parse_color(value).map_err(|e| {
                CardError::Validation(format!("colorTheme.{field}: {e}"))
            })?;
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Layout template. A closed set: every style has exactly one builder in
/// [`crate::layout::templates`].
///
/// On the wire the style is a lowercase string. Unknown names select
/// [`CardStyle::Classic`], the catch-all template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardStyle {
    /// Social-feed card: header, bold title, footer with signature. (default)
    #[default]
    Instagram,
    /// Minimal card with a gradient accent bar.
    Modern,
    /// Bordered, centred, bookish layout.
    Classic,
}

impl CardStyle {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "instagram" => CardStyle::Instagram,
            "modern" => CardStyle::Modern,
            _ => CardStyle::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStyle::Instagram => "instagram",
            CardStyle::Modern => "modern",
            CardStyle::Classic => "classic",
        }
    }
}

impl std::fmt::Display for CardStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CardStyle {
    fn from(s: String) -> Self {
        CardStyle::from_name(&s)
    }
}

impl From<CardStyle> for String {
    fn from(style: CardStyle) -> Self {
        style.as_str().to_string()
    }
}

/// Decorative background overlay. Unknown names fall back to
/// [`DecorativePattern::Dots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecorativePattern {
    Dots,
    Lines,
    Grid,
    Diagonal,
    /// The large corner curve of the instagram template.
    Curves,
}

impl DecorativePattern {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "lines" => DecorativePattern::Lines,
            "grid" => DecorativePattern::Grid,
            "diagonal" => DecorativePattern::Diagonal,
            "curves" => DecorativePattern::Curves,
            _ => DecorativePattern::Dots,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecorativePattern::Dots => "dots",
            DecorativePattern::Lines => "lines",
            DecorativePattern::Grid => "grid",
            DecorativePattern::Diagonal => "diagonal",
            DecorativePattern::Curves => "curves",
        }
    }
}

impl From<String> for DecorativePattern {
    fn from(s: String) -> Self {
        DecorativePattern::from_name(&s)
    }
}

impl From<DecorativePattern> for String {
    fn from(p: DecorativePattern) -> Self {
        p.as_str().to_string()
    }
}

// ── Carousel ─────────────────────────────────────────────────────────────

/// Settings of a carousel request. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarouselSettings {
    pub username: Option<String>,
    pub author_name: Option<String>,
    /// Replaces the primary colour, the accent colour and the background of
    /// accent slides.
    pub brand_color: Option<String>,
    pub style: Option<CardStyle>,
    pub final_slide: Option<FinalSlideSettings>,
}

impl CarouselSettings {
    /// Reject a `brandColor` that would only fail later, mid-carousel.
    pub fn validate(&self) -> Result<(), CardError> {
        if let Some(brand) = &self.brand_color {
            parse_color(brand)
                .map_err(|e| CardError::Validation(format!("brandColor: {e}")))?;
        }
        Ok(())
    }
}

/// Optional closing slide appended to a carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSlideSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "type", default)]
    pub kind: FinalSlideKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SlideColor>,
}

impl FinalSlideSettings {
    pub fn new(kind: FinalSlideKind) -> Self {
        Self {
            enabled: true,
            kind,
            title: None,
            text: None,
            color: None,
        }
    }
}

/// Built-in closing slide templates. A missing or unknown `type` selects
/// [`FinalSlideKind::Cta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinalSlideKind {
    /// Call to action: follow the profile.
    #[default]
    Cta,
    /// Contact details.
    Contact,
    /// Brand sign-off.
    Brand,
}

impl FinalSlideKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "contact" => FinalSlideKind::Contact,
            "brand" => FinalSlideKind::Brand,
            _ => FinalSlideKind::Cta,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinalSlideKind::Cta => "cta",
            FinalSlideKind::Contact => "contact",
            FinalSlideKind::Brand => "brand",
        }
    }
}

impl From<String> for FinalSlideKind {
    fn from(s: String) -> Self {
        FinalSlideKind::from_name(&s)
    }
}

impl From<FinalSlideKind> for String {
    fn from(kind: FinalSlideKind) -> Self {
        kind.as_str().to_string()
    }
}

// ── Fonts ────────────────────────────────────────────────────────────────

/// Locations of the two font faces every render needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSource {
    /// Weight 400 face.
    pub regular: PathBuf,
    /// Weight 700 face.
    pub bold: PathBuf,
}

impl Default for FontSource {
    fn default() -> Self {
        Self::from_dir("./assets/fonts")
    }
}

impl FontSource {
    /// `Inter-Regular.ttf` and `Inter-Bold.ttf` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            regular: dir.join("Inter-Regular.ttf"),
            bold: dir.join("Inter-Bold.ttf"),
        }
    }

    /// `true` when both files exist on disk.
    pub fn is_available(&self) -> bool {
        self.regular.is_file() && self.bold.is_file()
    }
}
