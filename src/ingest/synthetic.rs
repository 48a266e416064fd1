use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

/// Synthetic source for `stub://` URLs.
///
/// Emits blank frames of the configured size, optionally stopping after
/// `frame_limit` frames. Pair it with the stub or replay detector.
pub struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            connected: false,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "SyntheticSource: connected to {} ({}x{} @ {} fps)",
            self.settings.url,
            self.settings.width,
            self.settings.height,
            self.settings.target_fps
        );
        self.connected = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.connected {
            return Err(anyhow!("SyntheticSource: next_frame before connect"));
        }
        if self
            .settings
            .frame_limit
            .is_some_and(|limit| self.frame_count >= limit)
        {
            return Ok(None);
        }
        let frame = Frame::blank(self.frame_count, self.settings.width, self.settings.height);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.settings.url.clone(),
        }
    }
}
