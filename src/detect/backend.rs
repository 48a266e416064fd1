use anyhow::Result;

use crate::detect::record::DetectionRecord;
use crate::frame::Frame;

/// Detector backend trait.
///
/// This is the seam to the object-detection model. Implementations receive a
/// frame and return every instance they found, in any order, unfiltered; the
/// confidence threshold is applied downstream by the summarizer.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionRecord>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
