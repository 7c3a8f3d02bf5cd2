use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixel space.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Default, Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
    }
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from its top-left corner and size.
    pub fn from_x1y1_wh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    /// Builds a box from its center and size.
    pub fn from_cxcy_wh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2., cy - h / 2., cx + w / 2., cy + h / 2.)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns the center x-coordinate of the bounding box.
    pub fn cx(&self) -> f32 {
        self.x1 + self.width() / 2.
    }

    /// Returns the center y-coordinate of the bounding box.
    pub fn cy(&self) -> f32 {
        self.y1 + self.height() / 2.
    }

    /// Area computed directly from the corner coordinates.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when the box has no positive extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Returns the bounding box coordinates as `(x1, y1, x2, y2)`.
    pub fn xy1_xy2(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BoundingBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BoundingBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Clamps the corners into a `width` x `height` image.
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0., width),
            y1: self.y1.clamp(0., height),
            x2: self.x2.clamp(0., width),
            y2: self.y2.clamp(0., height),
        }
    }

    pub fn as_xy_wh_i32(&self) -> (i32, i32, i32, i32) {
        (self.x1.round() as i32,
         self.y1.round() as i32,
         self.width().round() as i32,
         self.height().round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_and_sizes() {
        let bbox = BoundingBox::from_x1y1_wh(10., 20., 30., 40.);
        assert_eq!(bbox.xy1_xy2(), (10., 20., 40., 60.));
        assert_eq!(bbox.area(), 1200.);
        assert_eq!(bbox.cx(), 25.);
        assert_eq!(bbox.cy(), 40.);

        let centered = BoundingBox::from_cxcy_wh(25., 40., 30., 40.);
        assert_eq!(centered, bbox);
    }

    #[test]
    fn intersect_and_union() {
        let a = BoundingBox::new(0., 0., 10., 10.);
        let b = BoundingBox::new(5., 5., 15., 15.);
        assert_eq!(a.intersect(&b), 25.);
        assert_eq!(a.union(&b), 175.);

        let far = BoundingBox::new(20., 20., 30., 30.);
        assert_eq!(a.intersect(&far), 0.);
    }

    #[test]
    fn clamps_into_image() {
        let bbox = BoundingBox::new(-4., 3., 120., 90.).clamp_to(100., 80.);
        assert_eq!(bbox.xy1_xy2(), (0., 3., 100., 80.));
        assert!(BoundingBox::new(5., 5., 5., 9.).is_degenerate());
    }

    #[test]
    fn serializes_as_corner_array() {
        let json = serde_json::to_string(&BoundingBox::new(1., 2., 3.5, 4.)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.5,4.0]");
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BoundingBox::new(1., 2., 3.5, 4.));
    }
}
