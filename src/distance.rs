//! Proximity score from bounding-box area.
//!
//! The score is `box_area / frame_area * 1000`: unitless, larger means the
//! object fills more of the frame and is presumably closer. Boxes are not
//! clamped to the frame, so a box hanging off the edge can score above 1000.

use crate::detect::BoundingBox;
use crate::error::ProximityError;

/// Multiplier applied to the relative area.
pub const SCORE_SCALE: f64 = 1000.0;

/// Proximity score for one box, with the raw box area in square pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximityEstimate {
    pub score: f64,
    pub box_area: f64,
}

pub fn estimate(
    bbox: &BoundingBox,
    frame_width: u32,
    frame_height: u32,
) -> Result<f64, ProximityError> {
    estimate_with_area(bbox, frame_width, frame_height).map(|e| e.score)
}

pub fn estimate_with_area(
    bbox: &BoundingBox,
    frame_width: u32,
    frame_height: u32,
) -> Result<ProximityEstimate, ProximityError> {
    if frame_width == 0 || frame_height == 0 {
        return Err(ProximityError::InvalidFrameDimensions {
            width: frame_width,
            height: frame_height,
        });
    }
    if !bbox.is_well_formed() {
        return Err(ProximityError::InvalidBoundingBox {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        });
    }

    let box_area = (bbox.x2 as f64 - bbox.x1 as f64) * (bbox.y2 as f64 - bbox.y1 as f64);
    let frame_area = frame_width as f64 * frame_height as f64;
    Ok(ProximityEstimate {
        score: box_area / frame_area * SCORE_SCALE,
        box_area,
    })
}
