use crate::common::BoundingBox;

/// Jaccard index (intersection over union) of two boxes, in `[0, 1]`.
///
/// Disjoint, touching and degenerate boxes give `0.0` without computing a
/// negative intersection. Areas are taken straight from the corner
/// coordinates, and a zero union also gives `0.0`.
pub fn jaccard_index(box1: &BoundingBox, box2: &BoundingBox) -> f32 {
    let left = box1.x1.max(box2.x1);
    let top = box1.y1.max(box2.y1);
    let right = box1.x2.min(box2.x2);
    let bottom = box1.y2.min(box2.y2);

    if left >= right || top >= bottom {
        return 0.0;
    }

    let intersection = (right - left) * (bottom - top);
    let union = box1.area() + box2.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn identical_boxes_overlap_perfectly() {
        let a = bbox(3., 4., 17.5, 40.);
        assert_eq!(jaccard_index(&a, &a), 1.0);
    }

    #[test]
    fn disjoint_boxes_do_not_overlap() {
        assert_eq!(jaccard_index(&bbox(0., 0., 10., 10.), &bbox(20., 20., 30., 30.)), 0.0);
        // overlapping on x only
        assert_eq!(jaccard_index(&bbox(0., 0., 10., 10.), &bbox(5., 20., 15., 30.)), 0.0);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        assert_eq!(jaccard_index(&bbox(0., 0., 10., 10.), &bbox(10., 0., 20., 10.)), 0.0);
    }

    #[test]
    fn known_partial_overlap() {
        let iou = jaccard_index(&bbox(0., 0., 10., 10.), &bbox(5., 5., 15., 15.));
        assert!((iou - 25. / 175.).abs() < 1e-6);
        assert!((iou - 0.142857).abs() < 1e-5);
    }

    #[test]
    fn contained_box() {
        let iou = jaccard_index(&bbox(0., 0., 10., 10.), &bbox(2., 2., 7., 7.));
        assert!((iou - 0.25).abs() < 1e-6);
    }

    #[test]
    fn degenerate_boxes_give_zero() {
        let point = bbox(5., 5., 5., 5.);
        assert_eq!(jaccard_index(&point, &point), 0.0);
        assert_eq!(jaccard_index(&point, &bbox(0., 0., 10., 10.)), 0.0);
        let line = bbox(0., 5., 10., 5.);
        assert_eq!(jaccard_index(&line, &bbox(0., 0., 10., 10.)), 0.0);
    }

    #[test]
    fn symmetric_and_bounded() {
        let boxes = [
            bbox(0., 0., 10., 10.),
            bbox(5., 5., 15., 15.),
            bbox(-3., 2., 4., 30.),
            bbox(9.5, 9.5, 9.75, 9.75),
            bbox(100., 100., 101., 250.),
            bbox(0., 0., 640., 480.),
        ];
        for a in &boxes {
            for b in &boxes {
                let ab = jaccard_index(a, b);
                assert_eq!(ab, jaccard_index(b, a));
                assert!((0.0..=1.0).contains(&ab), "{ab} out of range for {a:?} / {b:?}");
            }
        }
    }
}
