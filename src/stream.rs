//! The per-frame processing loop.
//!
//! Each iteration is one complete transaction: acquire, detect, summarize,
//! estimate, append, classify, report. The stop flag is checked only between
//! frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::config::{ProximityConfig, ScorePooling};
use crate::detect::{nms, DetectionRecord, SharedBackend};
use crate::distance;
use crate::error::ProximityError;
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::summary::{FrameSummarizer, FrameSummary};
use crate::trend::{TrendReading, TrendTracker};

/// What the UI should show for the tracked class this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Seen in this frame.
    Tracking,
    /// Not seen now, but seen within the search grace period.
    Searching,
    /// Not seen recently (or never), or tracking is disabled.
    Idle,
}

/// Pooled measurement of the tracked class in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedObject {
    pub label: String,
    /// Qualifying instances that produced a score.
    pub instances: usize,
    pub score: f64,
    pub trend: TrendReading,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub width: u32,
    pub height: u32,
    /// Class the tracker follows, reported even when it was not seen.
    pub tracked_class: String,
    pub summary: FrameSummary,
    pub tracked: Option<TrackedObject>,
    pub presence: Presence,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_processed: u64,
    pub frames_with_tracked: u64,
    /// Frames whose tracked detections were all rejected by the estimator.
    pub frames_skipped: u64,
}

pub struct StreamLoop {
    source: Box<dyn FrameSource>,
    detector: SharedBackend,
    summarizer: FrameSummarizer,
    tracker: TrendTracker,
    tracking_enabled: bool,
    tracked_class: String,
    pooling: ScorePooling,
    search_grace: Duration,
    nms_iou_threshold: Option<f32>,
    frame_limit: Option<u64>,
    pace: Option<Duration>,
    stats: RunStats,
}

impl StreamLoop {
    pub fn new(
        config: &ProximityConfig,
        source: Box<dyn FrameSource>,
        detector: SharedBackend,
    ) -> Result<Self> {
        let tracker = TrendTracker::with_window(
            config.tracking.history_capacity,
            config.tracking.trend_window,
        )?;
        Ok(Self {
            source,
            detector,
            summarizer: FrameSummarizer::new(config.detection.confidence_threshold),
            tracker,
            tracking_enabled: config.tracking.enabled,
            tracked_class: config.tracking.tracked_class.clone(),
            pooling: config.tracking.pooling,
            search_grace: config.tracking.search_grace,
            nms_iou_threshold: config.detection.nms_iou_threshold,
            frame_limit: config.source.frame_limit,
            pace: Some(config.source.frame_interval()),
            stats: RunStats::default(),
        })
    }

    /// Disable sleeping between frames (replays, tests).
    pub fn without_pacing(mut self) -> Self {
        self.pace = None;
        self
    }

    pub fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run detection on `frame` and fold the result into the tracker.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        let detections = {
            let mut detector = self
                .detector
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            detector.detect(frame)?
        };
        Ok(self.ingest_detections(frame, detections))
    }

    /// Fold already-computed detections for `frame` into the tracker.
    pub fn ingest_detections(
        &mut self,
        frame: &Frame,
        detections: Vec<DetectionRecord>,
    ) -> FrameReport {
        let detections = match self.nms_iou_threshold {
            Some(iou) => nms::suppress(detections, iou),
            None => detections,
        };

        let summary = self
            .summarizer
            .summarize(&detections, frame.width, frame.height);
        if !summary.is_empty() {
            log::debug!("frame {}: {}", frame.index, summary.text);
        }

        let tracked = if self.tracking_enabled {
            self.track(frame, &detections)
        } else {
            None
        };

        let presence = if tracked.is_some() {
            Presence::Tracking
        } else if !self.tracking_enabled {
            Presence::Idle
        } else {
            match self.tracker.time_since_last_detection(frame.captured_at) {
                Some(since) if since < self.search_grace => Presence::Searching,
                _ => Presence::Idle,
            }
        };

        self.stats.frames_processed += 1;
        if tracked.is_some() {
            self.stats.frames_with_tracked += 1;
        }

        FrameReport {
            frame_index: frame.index,
            width: frame.width,
            height: frame.height,
            tracked_class: self.tracked_class.clone(),
            summary,
            tracked,
            presence,
        }
    }

    fn track(&mut self, frame: &Frame, detections: &[DetectionRecord]) -> Option<TrackedObject> {
        let mut scores = Vec::new();
        let mut rejected = 0usize;
        for record in self.summarizer.qualifying(detections, &self.tracked_class) {
            match distance::estimate_with_area(&record.bbox, frame.width, frame.height) {
                Ok(estimate) => {
                    log::trace!(
                        "frame {}: {} box area {:.0}px -> score {:.2}",
                        frame.index,
                        record.label,
                        estimate.box_area,
                        estimate.score
                    );
                    scores.push(estimate.score);
                }
                Err(err @ ProximityError::InvalidFrameDimensions { .. }) => {
                    log::warn!("frame {}: skipping proximity tracking: {}", frame.index, err);
                    self.stats.frames_skipped += 1;
                    return None;
                }
                Err(err) => {
                    log::warn!(
                        "frame {}: ignoring {} detection: {}",
                        frame.index,
                        record.label,
                        err
                    );
                    rejected += 1;
                }
            }
        }

        if scores.is_empty() {
            if rejected > 0 {
                self.stats.frames_skipped += 1;
            }
            return None;
        }

        let score = pool(&scores, self.pooling);
        if let Err(err) = self.tracker.append(score, frame.captured_at) {
            log::warn!("frame {}: {}", frame.index, err);
            self.stats.frames_skipped += 1;
            return None;
        }

        let trend = self.tracker.classify();
        log::debug!(
            "frame {}: {} score {:.2} ({} instances) -> {}",
            frame.index,
            self.tracked_class,
            score,
            scores.len(),
            trend.status
        );
        Some(TrackedObject {
            label: self.tracked_class.clone(),
            instances: scores.len(),
            score,
            trend,
        })
    }

    /// Pull frames until the source ends, the frame limit is reached, or
    /// `stop` is set. `on_report` sees every frame's report in order.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut on_report: F) -> Result<RunStats>
    where
        F: FnMut(&FrameReport) -> Result<()>,
    {
        self.source.connect()?;
        {
            let mut detector = self
                .detector
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            detector.warm_up()?;
        }

        loop {
            if stop.load(Ordering::SeqCst) {
                log::info!("stop requested; ending stream");
                break;
            }
            if self
                .frame_limit
                .is_some_and(|limit| self.stats.frames_processed >= limit)
            {
                log::info!("frame limit reached");
                break;
            }

            let started = Instant::now();
            let Some(frame) = self.source.next_frame()? else {
                log::info!("end of stream");
                break;
            };
            let report = self.process_frame(&frame)?;
            on_report(&report)?;

            if let Some(interval) = self.pace {
                if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                    std::thread::sleep(remaining);
                }
            }
        }

        let source_stats = self.source.stats();
        log::info!(
            "processed {} frames from {} ({} with {}, {} skipped)",
            self.stats.frames_processed,
            source_stats.url,
            self.stats.frames_with_tracked,
            self.tracked_class,
            self.stats.frames_skipped
        );
        Ok(self.stats.clone())
    }
}

fn pool(scores: &[f64], pooling: ScorePooling) -> f64 {
    match pooling {
        ScorePooling::Max => scores.iter().copied().fold(f64::MIN, f64::max),
        ScorePooling::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
        ScorePooling::Last => scores[scores.len() - 1],
    }
}
