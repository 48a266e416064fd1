//! Per-frame reduction of detections into class counts and a summary line.

use serde::Serialize;

use crate::detect::DetectionRecord;

/// Default confidence threshold when the caller does not set one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Class counts for one frame plus their rendered text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameSummary {
    /// `(label, count)` in first-seen order within the frame.
    pub class_counts: Vec<(String, usize)>,
    /// `"0: {w}x{h} {count} {label}, ..."`, or empty when nothing qualified.
    pub text: String,
}

impl FrameSummary {
    pub fn is_empty(&self) -> bool {
        self.class_counts.is_empty()
    }

    /// Count for an exact label; zero when absent.
    pub fn count_of(&self, label: &str) -> usize {
        self.class_counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// Exact label match, so "cat" does not match "bobcat".
    pub fn contains(&self, label: &str) -> bool {
        self.count_of(label) > 0
    }

    pub fn total(&self) -> usize {
        self.class_counts.iter().map(|(_, c)| c).sum()
    }
}

/// Reduce a frame's detections into counts and text.
///
/// Only records with `confidence > confidence_threshold` count. The threshold
/// is not range-checked.
pub fn summarize(
    detections: &[DetectionRecord],
    confidence_threshold: f32,
    frame_width: u32,
    frame_height: u32,
) -> FrameSummary {
    let mut class_counts: Vec<(String, usize)> = Vec::new();
    for record in detections.iter().filter(|r| r.passes(confidence_threshold)) {
        match class_counts.iter_mut().find(|(label, _)| *label == record.label) {
            Some((_, count)) => *count += 1,
            None => class_counts.push((record.label.clone(), 1)),
        }
    }

    let text = if class_counts.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = class_counts
            .iter()
            .map(|(label, count)| format!("{} {}", count, label))
            .collect();
        format!("0: {}x{} {}", frame_width, frame_height, parts.join(", "))
    };

    FrameSummary { class_counts, text }
}

/// Summarizer bound to a fixed confidence threshold.
#[derive(Clone, Copy, Debug)]
pub struct FrameSummarizer {
    confidence_threshold: f32,
}

impl FrameSummarizer {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn summarize(
        &self,
        detections: &[DetectionRecord],
        frame_width: u32,
        frame_height: u32,
    ) -> FrameSummary {
        summarize(
            detections,
            self.confidence_threshold,
            frame_width,
            frame_height,
        )
    }

    /// Records of `label` that pass the threshold, in detector order.
    pub fn qualifying<'a>(
        &self,
        detections: &'a [DetectionRecord],
        label: &'a str,
    ) -> impl Iterator<Item = &'a DetectionRecord> + 'a {
        let threshold = self.confidence_threshold;
        detections
            .iter()
            .filter(move |r| r.label == label && r.passes(threshold))
    }
}

impl Default for FrameSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn rec(label: &str, confidence: f32) -> DetectionRecord {
        DetectionRecord::new(label, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn single_cat_scenario() {
        let detections = vec![DetectionRecord::new(
            "cat",
            0.9,
            BoundingBox::new(100.0, 100.0, 300.0, 300.0),
        )];
        let summary = summarize(&detections, 0.5, 640, 480);
        assert_eq!(summary.class_counts, vec![("cat".to_string(), 1)]);
        assert_eq!(summary.text, "0: 640x480 1 cat");
    }

    #[test]
    fn counts_keep_first_seen_order() {
        let detections = vec![
            rec("person", 0.9),
            rec("cat", 0.8),
            rec("person", 0.7),
            rec("dog", 0.6),
            rec("cat", 0.95),
        ];
        let summary = summarize(&detections, 0.5, 1280, 720);
        assert_eq!(summary.text, "0: 1280x720 2 person, 2 cat, 1 dog");
        assert_eq!(summary.count_of("cat"), 2);
        assert_eq!(summary.total(), 5);
    }

    #[test]
    fn summarize_is_deterministic() {
        let detections = vec![rec("cup", 0.9), rec("chair", 0.8), rec("cup", 0.7)];
        let a = summarize(&detections, 0.5, 640, 480);
        let b = summarize(&detections, 0.5, 640, 480);
        assert_eq!(a.text.as_bytes(), b.text.as_bytes());
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_is_strict() {
        let at = vec![rec("cat", 0.5)];
        assert!(summarize(&at, 0.5, 640, 480).is_empty());

        let above = vec![rec("cat", 0.5 + f32::EPSILON)];
        assert_eq!(summarize(&above, 0.5, 640, 480).count_of("cat"), 1);
    }

    #[test]
    fn empty_input_renders_empty_text() {
        let summary = summarize(&[], 0.5, 640, 480);
        assert!(summary.class_counts.is_empty());
        assert_eq!(summary.text, "");
    }

    #[test]
    fn out_of_range_threshold_is_accepted() {
        let detections = vec![rec("cat", 0.1), rec("dog", 0.9)];
        assert_eq!(summarize(&detections, -1.0, 10, 10).total(), 2);
        assert!(summarize(&detections, 1.5, 10, 10).is_empty());
    }

    #[test]
    fn contains_is_exact_label_match() {
        let summary = summarize(&[rec("bobcat", 0.9)], 0.5, 640, 480);
        assert!(summary.text.contains("cat"));
        assert!(!summary.contains("cat"));
        assert!(summary.contains("bobcat"));
    }

    #[test]
    fn qualifying_filters_label_and_threshold() {
        let summarizer = FrameSummarizer::default();
        let detections = vec![rec("cat", 0.4), rec("dog", 0.9), rec("cat", 0.6)];
        let cats: Vec<f32> = summarizer
            .qualifying(&detections, "cat")
            .map(|r| r.confidence)
            .collect();
        assert_eq!(cats, vec![0.6]);
    }
}
