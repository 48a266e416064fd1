//! Replay of recorded detections.
//!
//! The replay file is JSON lines, one object per frame:
//!
//! ```text
//! {"frame": 0, "detections": [{"label": "cat", "confidence": 0.9, "bbox": [100, 100, 300, 300]}]}
//! ```
//!
//! Frames with no line produce no detections. Blank lines are ignored.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::record::DetectionRecord;
use crate::frame::Frame;

#[derive(Debug, Deserialize)]
struct ReplayLine {
    frame: u64,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

/// Detector backend that serves detections recorded from an earlier run.
pub struct ReplayBackend {
    frames: HashMap<u64, Vec<DetectionRecord>>,
    last_frame: Option<u64>,
}

impl ReplayBackend {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening replay file {}", path.display()))?;
        let backend = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("reading replay file {}", path.display()))?;
        log::info!(
            "ReplayBackend: loaded {} frames from {}",
            backend.frames.len(),
            path.display()
        );
        Ok(backend)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames: HashMap<u64, Vec<DetectionRecord>> = HashMap::new();
        let mut last_frame = None;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: ReplayLine = serde_json::from_str(&line)
                .map_err(|e| anyhow!("line {}: invalid replay entry: {}", lineno + 1, e))?;
            last_frame = last_frame.max(Some(parsed.frame));
            frames
                .entry(parsed.frame)
                .or_default()
                .extend(parsed.detections);
        }
        Ok(Self { frames, last_frame })
    }

    /// Highest frame index present in the recording.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionRecord>> {
        Ok(self.frames.get(&frame.index).cloned().unwrap_or_default())
    }
}
