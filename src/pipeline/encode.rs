//! Image encoding: `DynamicImage` → PNG bytes, and PNG ↔ base64.
//!
//! The card route returns raw PNG bytes; the carousel route embeds each slide
//! in JSON, so it needs the standard (padded, non-URL-safe) base64 alphabet
//! that `data:image/png;base64,…` URIs expect.

use crate::error::CardError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use tracing::debug;

/// Encode an image as PNG.
///
/// Adaptive filtering with best compression; card backgrounds are large flat
/// areas.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CardError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| CardError::RenderFailed {
            detail: format!("PNG encoding failed: {e}"),
        })?;
    debug!("Encoded {}x{} image → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Standard base64 of PNG bytes.
pub fn encode_base64(png: &[u8]) -> String {
    STANDARD.encode(png)
}

/// Decode standard base64 back into PNG bytes.
pub fn decode_base64(b64: &str) -> Result<Vec<u8>, CardError> {
    STANDARD
        .decode(b64)
        .map_err(|e| CardError::Internal(format!("invalid base64 image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_base64("%%%"), Err(CardError::Internal(_))));
    }

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let b64 = encode_base64(&png);
        assert_eq!(decode_base64(&b64).expect("valid base64"), png);
    }

    #[test]
    fn encoded_png_decodes_to_same_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(7, 3, Rgba([0, 0, 0, 255])));
        let png = encode_png(&img).unwrap();
        let back = image::load_from_memory(&png).unwrap();
        assert_eq!((back.width(), back.height()), (7, 3));
    }
}
