use crate::shared::polygon::Point;

/// Axis-aligned detector box in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Geometric center, used as the detection's reference point.
    ///
    /// Averaged in floating point; integer division would pull the point
    /// toward the upper-left and misplace vehicles parked near slot edges.
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

/// One object-detector output for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: u32,
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: u32, confidence: f64) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    pub fn reference_point(&self) -> Point {
        self.bbox.center()
    }
}
