use crate::progress::{ProgressTracker, ScrollSample};

/// Coalesces scroll events to at most one progress publication per
/// animation frame.
///
/// Only the newest sample is kept. A frame is requested whenever a sample
/// arrives with none outstanding, so the sample from the final scroll event is
/// always published and consumers settle on the true progress.
#[derive(Debug, Default)]
pub struct FrameSampler {
    pending: Option<ScrollSample>,
    frame_requested: bool,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample.
    ///
    /// Returns `true` when the caller must schedule a frame callback that
    /// ends in `flush`.
    pub fn push(&mut self, sample: ScrollSample) -> bool {
        self.pending = Some(sample);
        if self.frame_requested {
            return false;
        }
        self.frame_requested = true;
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Publishes the newest pending sample, if any.
    pub fn flush(&mut self, tracker: &ProgressTracker) -> Option<f64> {
        self.frame_requested = false;
        self.pending.take().map(|sample| tracker.on_scroll(sample))
    }
}
