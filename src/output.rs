//! Output types returned by the carousel flow.
//!
//! Serialised as the JSON body of `POST /api/generate-carousel`, so field
//! names are camelCase.

use crate::config::CarouselSettings;
use crate::pipeline::segment::SlideData;
use serde::{Deserialize, Serialize};

/// Engine name reported in carousel metadata and the health endpoint.
pub const ENGINE: &str = "resvg-carousel";

/// A rendered carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselOutput {
    /// Slides in render order, including the closing slide.
    pub slides: Vec<SlideData>,
    /// Standard base64 PNG per slide, same order as `slides`.
    pub images: Vec<String>,
    pub metadata: CarouselMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselMetadata {
    pub total_slides: usize,
    /// RFC 3339 timestamp.
    pub generated_at: String,
    /// Wall-clock time of the whole carousel in milliseconds.
    pub processing_time: u64,
    /// The settings as received.
    pub settings: CarouselSettings,
    pub engine: String,
}
