use thiserror::Error;

/// Failures raised by the per-frame core (estimator and tracker).
///
/// Each variant is resolvable per call: the stream loop skips the offending
/// frame or detection and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProximityError {
    #[error("invalid frame dimensions {width}x{height}: both must be non-zero")]
    InvalidFrameDimensions { width: u32, height: u32 },

    #[error("invalid bounding box ({x1}, {y1}, {x2}, {y2}): expected x1 < x2 and y1 < y2")]
    InvalidBoundingBox { x1: f32, y1: f32, x2: f32, y2: f32 },

    #[error("invalid proximity score {0}: must be finite and non-negative")]
    InvalidScore(f64),

    #[error("invalid trend window {trend_window} for history capacity {capacity}: expected 2 <= window <= capacity <= {max}")]
    InvalidWindow {
        capacity: usize,
        trend_window: usize,
        max: usize,
    },
}
