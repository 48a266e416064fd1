use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates.
///
/// Serialized as `[x1, y1, x2, y2]`, matching the detector's xyxy layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from centre/size form (`cx, cy, w, h`).
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Signed area; degenerate boxes yield zero or negative values.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when all coordinates are finite and the box has positive extent.
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    /// Intersection over union. Returns 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area().max(0.0) + other.area().max(0.0) - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object instance found by the detector in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl DetectionRecord {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Strictly above the threshold; a record exactly at it does not qualify.
    pub fn passes(&self, confidence_threshold: f32) -> bool {
        self.confidence > confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_serializes_as_xyxy_array() {
        let record = DetectionRecord::new("cat", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"label":"cat","confidence":0.9,"bbox":[1.0,2.0,3.0,4.0]}"#
        );
        let back: DetectionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn from_center_matches_corner_form() {
        let b = BoundingBox::from_center(200.0, 200.0, 200.0, 100.0);
        assert_eq!(b, BoundingBox::new(100.0, 150.0, 300.0, 250.0));
        assert_eq!(b.area(), 20_000.0);
    }

    #[test]
    fn well_formed_rejects_inverted_and_nan() {
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!BoundingBox::new(5.0, 0.0, 5.0, 1.0).is_well_formed());
        assert!(!BoundingBox::new(0.0, 3.0, 1.0, 2.0).is_well_formed());
        assert!(!BoundingBox::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        let iou = a.iou(&b);
        assert!((iou - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    }
}
