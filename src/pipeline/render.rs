//! Rasterisation: SVG document → `DynamicImage` via resvg.
//!
//! ## Why spawn_blocking?
//!
//! Parsing the SVG, shaping text and filling a 1080×1350 pixmap are pure CPU
//! work measured in tens of milliseconds. [`rasterize`] is synchronous and
//! callers run it through `tokio::task::spawn_blocking` so the Tokio worker
//! threads keep serving requests while a card renders.
//!
//! ## Fonts
//!
//! Only the two configured faces are loaded; system fonts are never scanned.
//! Rendering is therefore identical on every host, and a missing font file is
//! an error ([`CardError::FontUnavailable`]) instead of a silent substitution.
//! The font database is built once per [`FontData`] and shared by `Arc`.

use crate::config::FontSource;
use crate::error::CardError;
use image::{DynamicImage, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Family used when the font files carry no readable name.
const FALLBACK_FAMILY: &str = "Inter";

/// Loaded font faces, ready for rendering.
#[derive(Clone)]
pub struct FontData {
    db: Arc<fontdb::Database>,
    family: String,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("family", &self.family)
            .field("faces", &self.db.len())
            .finish()
    }
}

impl FontData {
    /// Build the font database from raw TrueType/OpenType bytes.
    ///
    /// Bytes that do not parse as a font are skipped with a warning; text in
    /// that face is then simply not drawn. [`load_fonts`] rejects such files.
    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>) -> Self {
        Self::build(regular, bold).0
    }

    /// The database plus the number of faces each input contributed.
    fn build(regular: Vec<u8>, bold: Vec<u8>) -> (Self, [usize; 2]) {
        let mut db = fontdb::Database::new();
        db.load_font_data(regular);
        let regular_faces = db.len();
        db.load_font_data(bold);
        let bold_faces = db.len() - regular_faces;
        if db.is_empty() {
            warn!("No usable font faces loaded; text will not be drawn");
        }

        let family = db
            .faces()
            .next()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| FALLBACK_FAMILY.to_string());
        db.set_sans_serif_family(family.clone());
        debug!(family = %family, faces = db.len(), "Font database ready");

        let fonts = Self {
            db: Arc::new(db),
            family,
        };
        (fonts, [regular_faces, bold_faces])
    }

    /// Family name of the loaded faces.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Number of usable faces.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }
}

/// Read both font files concurrently.
///
/// A file that holds no parseable face is reported as
/// [`CardError::FontUnavailable`], like a missing one.
pub async fn load_fonts(source: &FontSource) -> Result<FontData, CardError> {
    let (regular, bold) = tokio::try_join!(read_font(&source.regular), read_font(&source.bold))?;
    // Zero-byte files stand in for real faces in unit tests.
    let placeholder = cfg!(test) && regular.is_empty() && bold.is_empty();

    let (fonts, faces) = FontData::build(regular, bold);
    if !placeholder {
        for (path, count) in [(&source.regular, faces[0]), (&source.bold, faces[1])] {
            if count == 0 {
                return Err(CardError::FontUnavailable {
                    path: path.clone(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "not a TrueType/OpenType font"),
                });
            }
        }
    }
    Ok(fonts)
}

async fn read_font(path: &Path) -> Result<Vec<u8>, CardError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| CardError::FontUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Rasterise `svg` into a `width`×`height` RGBA image.
///
/// Blocking; run it inside `spawn_blocking`.
pub fn rasterize(svg: &str, fonts: &FontData, width: u32, height: u32) -> Result<DynamicImage, CardError> {
    let mut opt = usvg::Options::default();
    opt.fontdb = Arc::clone(&fonts.db);
    opt.font_family = fonts.family.clone();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| CardError::RenderFailed {
        detail: format!("invalid SVG: {e}"),
    })?;

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| CardError::RenderFailed {
        detail: format!("cannot allocate a {width}x{height} pixmap"),
    })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    let mut raw = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let img = RgbaImage::from_raw(width, height, raw).ok_or_else(|| CardError::RenderFailed {
        detail: "pixel buffer size mismatch".into(),
    })?;

    debug!("Rasterised {}x{} px", width, height);
    Ok(DynamicImage::ImageRgba8(img))
}
