//! Frames as they flow from a source to the detector.
//!
//! A `Frame` owns its pixel buffer only for the duration of one loop
//! iteration. Nothing downstream of the detector keeps pixels; the summarizer
//! and tracker see only dimensions and detections.

use std::time::Instant;

/// One captured frame.
pub struct Frame {
    /// Packed pixel data as delivered by the source (layout is source-defined).
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Zero-based position in the stream.
    pub index: u64,

    /// Monotonic capture instant. Drives the presence policy, never trend math.
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        Self {
            data,
            width,
            height,
            index,
            captured_at: Instant::now(),
        }
    }

    /// A frame with no pixel payload, for synthetic sources and tests.
    pub fn blank(index: u64, width: u32, height: u32) -> Self {
        Self::new(Vec::new(), width, height, index)
    }

    /// Override the capture instant (replayed or simulated timelines).
    pub fn with_captured_at(mut self, captured_at: Instant) -> Self {
        self.captured_at = captured_at;
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Shape only; pixel bytes never reach logs.
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn frame_keeps_pixels_and_overridden_instant() {
        let at = Instant::now() + Duration::from_secs(2);
        let frame = Frame::new(vec![1, 2, 3], 1, 1, 9).with_captured_at(at);
        assert_eq!(frame.pixels(), &[1, 2, 3]);
        assert_eq!(frame.captured_at, at);
        assert_eq!(
            format!("{:?}", frame),
            "Frame { index: 9, width: 1, height: 1, bytes: 3 }"
        );
        assert!(Frame::blank(0, 640, 480).pixels().is_empty());
    }
}
