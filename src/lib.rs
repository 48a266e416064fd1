//! Proximity Watch
//!
//! Turns per-frame object detections from a video stream into per-frame class
//! summaries and a smoothed "approaching / moving away / stable" signal for
//! one tracked class.
//!
//! # Pipeline
//!
//! frame → detector → `DetectionRecord`s → `FrameSummarizer` (counts + text)
//! and, for the tracked class, `distance::estimate` → `TrendTracker::append`
//! → `TrendTracker::classify`.
//!
//! # Module Structure
//!
//! - `detect`: detection records, the detector backend seam, stub/replay backends, NMS
//! - `summary`: per-frame class counts and summary text
//! - `distance`: proximity score from bounding-box area
//! - `trend`: bounded proximity history and trend classification
//! - `ingest`: frame sources
//! - `stream`: the frame loop, pooling and presence policy
//! - `config`, `report`, `ui`: configuration, JSON-lines reports, console output

pub mod config;
pub mod detect;
pub mod distance;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod report;
pub mod stream;
pub mod summary;
pub mod trend;
pub mod ui;

pub use config::{ProximityConfig, ScorePooling};
pub use detect::{
    BackendRegistry, BoundingBox, DetectionRecord, DetectorBackend, ReplayBackend, SharedBackend,
    StubBackend,
};
pub use distance::{estimate, estimate_with_area, ProximityEstimate};
pub use error::ProximityError;
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticSource};
pub use report::ReportWriter;
pub use stream::{FrameReport, Presence, RunStats, StreamLoop, TrackedObject};
pub use summary::{summarize, FrameSummarizer, FrameSummary};
pub use trend::{ProximitySample, TrendReading, TrendStatus, TrendTracker};
