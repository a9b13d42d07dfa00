use crate::shared::polygon::{Point, Polygon, Vertex};

/// Stable identifier of a parking slot.
pub type RegionId = u32;

/// A named polygonal parking slot in image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub polygon: Polygon,
}

impl Region {
    pub fn new(id: RegionId, vertices: Vec<Vertex>) -> Self {
        Self {
            id,
            polygon: Polygon::new(vertices),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.polygon.contains(point)
    }
}
