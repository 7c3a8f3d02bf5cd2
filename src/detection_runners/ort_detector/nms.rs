use crate::analytics::jaccard_index;
use crate::common::Detection;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

impl Nms for Detection {
    /// Computes the intersection over union (IoU) between this detection's box and another.
    fn iou(&self, other: &Self) -> f32 {
        jaccard_index(&self.bbox, &other.bbox)
    }

    /// Returns the confidence score of the detection.
    fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Greedy non-maximum suppression. Sorts by descending confidence and drops
/// every box overlapping an already kept one by more than `iou_threshold`.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32) {
    boxes.sort_by(|b1, b2| {
        b2.confidence()
            .partial_cmp(&b1.confidence())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut current_index = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = boxes[prev_index].iou(&boxes[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use crate::common::BoundingBox;
    use super::*;

    fn det(conf: f32, x1: f32) -> Detection {
        Detection::new(0, "person", conf, BoundingBox::new(x1, 0., x1 + 10., 10.))
    }

    #[test]
    fn suppresses_overlapping_lower_scores() {
        let mut boxes = vec![det(0.6, 1.), det(0.9, 0.), det(0.8, 50.)];
        nms(&mut boxes, 0.5);
        let confs: Vec<f32> = boxes.iter().map(|d| d.confidence).collect();
        assert_eq!(confs, vec![0.9, 0.8]);
    }

    #[test]
    fn keeps_everything_below_threshold() {
        let mut boxes = vec![det(0.6, 5.), det(0.9, 0.)];
        // IoU of the two is 50 / 150
        nms(&mut boxes, 0.5);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].confidence, 0.9);
    }
}
