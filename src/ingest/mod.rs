//! Frame ingestion sources.
//!
//! A source hands the stream loop one `Frame` at a time. Only the synthetic
//! `stub://` source ships with the crate; camera and file decoders plug in
//! by implementing `FrameSource`.
//!
//! Sources are responsible for:
//! - Assigning monotonically increasing frame indices
//! - Stamping each frame with its capture instant
//! - Signalling end of stream with `Ok(None)`

use anyhow::{anyhow, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;

pub mod synthetic;

pub use synthetic::SyntheticSource;

/// Frame counters for a source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

pub trait FrameSource {
    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Build the source named by `settings.url`.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.trim().is_empty() {
        return Err(anyhow!("source url must not be empty"));
    }
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(settings.clone())));
    }
    Err(anyhow!(
        "unsupported source '{}': only stub:// sources are built in",
        settings.url
    ))
}
