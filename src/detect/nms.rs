use crate::detect::record::DetectionRecord;

/// Greedy class-agnostic non-maximum suppression.
///
/// Boxes are visited from highest to lowest confidence; a box is dropped when
/// its IoU with an already kept box exceeds `iou_threshold`. Survivors are
/// returned in their original detector order.
pub fn suppress(records: Vec<DetectionRecord>, iou_threshold: f32) -> Vec<DetectionRecord> {
    if records.len() < 2 {
        return records;
    }

    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| records[b].confidence.total_cmp(&records[a].confidence));

    let mut keep = vec![false; records.len()];
    let mut kept: Vec<usize> = Vec::new();
    for idx in order {
        let overlaps = kept
            .iter()
            .any(|&k| records[k].bbox.iou(&records[idx].bbox) > iou_threshold);
        if !overlaps {
            keep[idx] = true;
            kept.push(idx);
        }
    }

    let before = records.len();
    let survivors: Vec<DetectionRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();
    if survivors.len() < before {
        log::debug!("nms suppressed {} of {} boxes", before - survivors.len(), before);
    }
    survivors
}
