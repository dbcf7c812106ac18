//! Error types for the md2card library.
//!
//! Three error types reflect three distinct failure domains:
//!
//! * [`CardError`] — **Request-level**: a card or carousel cannot be
//!   produced. Returned from [`crate::card`] and [`crate::carousel`] and
//!   mapped to an HTTP status by [`crate::server`]: [`CardError::Validation`]
//!   is the caller's fault (400), everything else is ours (500).
//!
//! * [`ColorParseError`] — a colour string could not be parsed. Returned by
//!   the pure helpers in [`crate::pipeline::color`] and
//!   [`crate::pipeline::typography`]; the caller decides whether it is a
//!   validation problem (bad request field) or a render failure.
//!
//! * [`InputError`] — the CLI could not obtain the Markdown source (missing
//!   file, failed download). Never produced by the HTTP surface.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that abort a card or carousel request.
#[derive(Debug, Error)]
pub enum CardError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request is unusable as given (blank content, bad colour, …).
    #[error("{0}")]
    Validation(String),

    // ── Render errors ─────────────────────────────────────────────────────
    /// Layout, SVG parsing, rasterisation or PNG encoding failed.
    #[error("Failed to render card: {detail}")]
    RenderFailed { detail: String },

    /// A font file could not be read. Rendering never falls back to system
    /// fonts, so this is fatal for the request.
    #[error("Font file unavailable: '{path}': {source}")]
    FontUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One slide of a carousel failed; the whole carousel is aborted.
    #[error("Slide {slide}/{total} failed: {source}")]
    SlideFailed {
        slide: usize,
        total: usize,
        #[source]
        source: Box<CardError>,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing a PNG to disk failed (library file helpers and the CLI).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a panicked blocking task).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CardError {
    /// `true` when the failure is attributable to the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CardError::Validation(_))
    }
}

/// A colour string that is not one of the accepted syntaxes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{input}': {reason}")]
pub struct ColorParseError {
    pub input: String,
    pub reason: String,
}

impl ColorParseError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures while resolving CLI input into Markdown text.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is not UTF-8 text.
    #[error("File '{path}' is not valid UTF-8 text")]
    NotText { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Reading standard input failed.
    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),
}
