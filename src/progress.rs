//! Progress-callback trait for per-slide carousel events.
//!
//! Pass a `&dyn CarouselProgressCallback` to
//! [`crate::carousel::generate_carousel`] to receive events as each slide is
//! rendered. The CLI drives an `indicatif` progress bar with it; the HTTP
//! surface passes [`NoopProgressCallback`].
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket or a terminal progress bar
//! without the library knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use md2card::CarouselProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     bytes: AtomicUsize,
//! }
//!
//! impl CarouselProgressCallback for CountingCallback {
//!     fn on_slide_complete(&self, slide: usize, total: usize, png_bytes: usize) {
//!         self.bytes.fetch_add(png_bytes, Ordering::SeqCst);
//!         eprintln!("Slide {}/{} done", slide, total);
//!     }
//! }
//! ```

/// Called by the carousel orchestrator as it renders each slide.
///
/// Slides are rendered sequentially, so events arrive in order. All methods
/// have default no-op implementations so callers only override what they
/// care about.
pub trait CarouselProgressCallback: Send + Sync {
    /// Called once after segmentation, before any slide is rendered.
    ///
    /// # Arguments
    /// * `total_slides` — number of slides that will be rendered
    fn on_carousel_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called just before a slide is rendered.
    ///
    /// # Arguments
    /// * `slide` — 1-indexed slide number
    /// * `total` — total slides
    fn on_slide_start(&self, slide: usize, total: usize) {
        let _ = (slide, total);
    }

    /// Called when a slide rendered successfully.
    ///
    /// # Arguments
    /// * `slide`     — 1-indexed slide number
    /// * `total`     — total slides
    /// * `png_bytes` — size of the encoded PNG
    fn on_slide_complete(&self, slide: usize, total: usize, png_bytes: usize) {
        let _ = (slide, total, png_bytes);
    }

    /// Called when a slide fails. The carousel is aborted right after.
    fn on_slide_error(&self, slide: usize, total: usize, error: &str) {
        let _ = (slide, total, error);
    }

    /// Called once after every slide rendered.
    fn on_carousel_complete(&self, total_slides: usize) {
        let _ = total_slides;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CarouselProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        bytes: AtomicUsize,
        finished: AtomicUsize,
    }

    impl CarouselProgressCallback for TrackingCallback {
        fn on_slide_start(&self, _slide: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_complete(&self, _slide: usize, _total: usize, png_bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.bytes.fetch_add(png_bytes, Ordering::SeqCst);
        }

        fn on_slide_error(&self, _slide: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_carousel_complete(&self, total_slides: usize) {
            self.finished.store(total_slides, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_carousel_start(3);
        cb.on_slide_start(1, 3);
        cb.on_slide_complete(1, 3, 1024);
        cb.on_slide_error(2, 3, "boom");
        cb.on_carousel_complete(3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_slide_start(1, 2);
        tracker.on_slide_complete(1, 2, 100);
        tracker.on_slide_start(2, 2);
        tracker.on_slide_error(2, 2, "render failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.bytes.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn CarouselProgressCallback> = Arc::new(TrackingCallback::default());
        cb.on_carousel_complete(4);
    }
}
