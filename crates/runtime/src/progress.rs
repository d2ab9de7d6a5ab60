use foundation::math::clamp;

use crate::signal::{ReadSignal, Signal, Subscription};

/// Absolute scroll metrics read from the page at one instant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScrollSample {
    pub raw_offset_px: f64,
    pub document_height_px: f64,
    pub viewport_height_px: f64,
}

impl ScrollSample {
    pub fn new(raw_offset_px: f64, document_height_px: f64, viewport_height_px: f64) -> Self {
        Self {
            raw_offset_px,
            document_height_px,
            viewport_height_px,
        }
    }

    /// Sample relative to a tall section that pins its content while it
    /// scrolls past (progress 0 when its top meets the viewport top, 1 when
    /// its bottom meets the viewport bottom).
    pub fn within_section(
        scroll_y_px: f64,
        section_top_px: f64,
        section_height_px: f64,
        viewport_height_px: f64,
    ) -> Self {
        Self::new(
            scroll_y_px - section_top_px,
            section_height_px,
            viewport_height_px,
        )
    }

    /// Normalized progress in `[0, 1]`.
    ///
    /// A page that cannot scroll (document no taller than the viewport)
    /// reports 0.
    pub fn progress(&self) -> f64 {
        let scrollable = self.document_height_px - self.viewport_height_px;
        if !(scrollable > 0.0) {
            return 0.0;
        }
        clamp(self.raw_offset_px / scrollable, 0.0, 1.0)
    }
}

/// Publishes normalized scroll progress to any number of read-only consumers.
///
/// Each update is recomputed from absolute metrics, so skipped scroll events
/// never accumulate error.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    progress: Signal<f64>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            progress: Signal::new(0.0),
        }
    }

    /// Handles a scroll or resize event and returns the resulting progress.
    pub fn on_scroll(&self, sample: ScrollSample) -> f64 {
        let p = sample.progress();
        self.progress.set(p);
        p
    }

    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    pub fn subscribe(&self, callback: impl Fn(&f64) + 'static) -> Subscription {
        self.progress.subscribe(callback)
    }

    pub fn reader(&self) -> ReadSignal<f64> {
        self.progress.reader()
    }
}
