use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::record::{BoundingBox, DetectionRecord};
use crate::frame::Frame;

/// Frames per approach/hold/retreat cycle of the scripted scene.
pub const STUB_CYCLE_FRAMES: u64 = 60;

/// Stub backend for testing and demos.
///
/// Produces a deterministic scene keyed on the frame index: a cat centred in
/// the frame whose box grows for 20 frames, holds for 20, then shrinks for 20;
/// a person on every third frame; and a low-confidence dog that a default
/// threshold filters out.
pub struct StubBackend {
    frames_seen: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { frames_seen: 0 }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    fn cat_side(index: u64) -> f32 {
        let phase = index % STUB_CYCLE_FRAMES;
        match phase {
            0..=19 => 100.0 + 10.0 * phase as f32,
            20..=39 => 300.0,
            _ => 300.0 - 10.0 * (phase - 40) as f32,
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionRecord>> {
        self.frames_seen += 1;
        log::trace!(
            "stub: frame {} ({} bytes)",
            frame.index,
            frame.pixels().len()
        );

        let cx = frame.width as f32 / 2.0;
        let cy = frame.height as f32 / 2.0;
        let side = Self::cat_side(frame.index);

        let mut records = Vec::with_capacity(3);
        if frame.index % 3 == 0 {
            records.push(DetectionRecord::new(
                "person",
                0.8,
                BoundingBox::new(20.0, 40.0, 120.0, 400.0),
            ));
        }
        records.push(DetectionRecord::new(
            "cat",
            0.9,
            BoundingBox::from_center(cx, cy, side, side),
        ));
        records.push(DetectionRecord::new(
            "dog",
            0.3,
            BoundingBox::new(500.0, 300.0, 600.0, 420.0),
        ));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_cat_approaches_then_retreats() {
        let mut backend = StubBackend::default();

        let first = backend.detect(&Frame::blank(0, 640, 480)).unwrap();
        let labels: Vec<&str> = first.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["person", "cat", "dog"]);
        let cat = &first[1];
        assert_eq!(cat.bbox, BoundingBox::new(270.0, 190.0, 370.0, 290.0));

        let held = backend.detect(&Frame::blank(25, 640, 480)).unwrap();
        assert_eq!(held[0].label, "cat");
        assert_eq!(held[0].bbox.width(), 300.0);

        let leaving = backend.detect(&Frame::blank(50, 640, 480)).unwrap();
        assert_eq!(leaving[0].bbox.width(), 200.0);

        assert_eq!(backend.frames_seen(), 3);
    }
}
