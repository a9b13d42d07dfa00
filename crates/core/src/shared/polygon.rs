use crate::shared::constants::BOUNDARY_TOLERANCE_PX;

/// Integer pixel coordinate as produced by calibration tooling.
pub type Vertex = (i32, i32);

/// A point in the source camera's pixel space.
///
/// Reference points are `f64` so bounding-box centers keep their
/// half-pixel precision instead of being truncated toward the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Vertex> for Point {
    fn from((x, y): Vertex) -> Self {
        Self::new(x as f64, y as f64)
    }
}

/// Closed polygon over integer vertices. The closing edge from the last
/// vertex back to the first is implicit.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace area; positive for counter-clockwise winding in a y-up
    /// frame (clockwise on screen, where y grows downward).
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (xi, yi) = self.vertices[i];
                let (xj, yj) = self.vertices[(i + 1) % n];
                xi as i64 * yj as i64 - xj as i64 * yi as i64
            })
            .sum();
        twice as f64 / 2.0
    }

    /// Containment with "on boundary counts as inside".
    ///
    /// Even-odd ray casting decides interior points; an explicit edge test
    /// runs first because ray casting is unstable for points on an edge.
    pub fn contains(&self, point: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        if self.on_boundary(point) {
            return true;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = Point::from(self.vertices[i]);
            let b = Point::from(self.vertices[j]);
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn on_boundary(&self, point: Point) -> bool {
        self.edges()
            .any(|(a, b)| point_on_segment(point, a.into(), b.into()))
    }

    /// True when no two non-adjacent edges touch or cross.
    pub fn is_simple(&self) -> bool {
        let edges: Vec<(Vertex, Vertex)> = self.edges().collect();
        let n = edges.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                if segments_intersect(edges[i], edges[j]) {
                    return false;
                }
            }
        }
        true
    }

    fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

fn point_on_segment(p: Point, a: Point, b: Point) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (p.x - a.x).hypot(p.y - a.y) <= BOUNDARY_TOLERANCE_PX;
    }
    let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
    if cross.abs() / length > BOUNDARY_TOLERANCE_PX {
        return false;
    }
    p.x >= a.x.min(b.x) - BOUNDARY_TOLERANCE_PX
        && p.x <= a.x.max(b.x) + BOUNDARY_TOLERANCE_PX
        && p.y >= a.y.min(b.y) - BOUNDARY_TOLERANCE_PX
        && p.y <= a.y.max(b.y) + BOUNDARY_TOLERANCE_PX
}

/// Sign of the cross product (b - a) x (c - a), exact on integer input.
fn orientation(a: Vertex, b: Vertex, c: Vertex) -> i128 {
    let cross = (b.0 as i128 - a.0 as i128) * (c.1 as i128 - a.1 as i128)
        - (b.1 as i128 - a.1 as i128) * (c.0 as i128 - a.0 as i128);
    cross.signum()
}

fn within_bounds(a: Vertex, b: Vertex, p: Vertex) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

fn segments_intersect((p1, p2): (Vertex, Vertex), (q1, q2): (Vertex, Vertex)) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_bounds(p1, p2, q1))
        || (o2 == 0 && within_bounds(p1, p2, q2))
        || (o3 == 0 && within_bounds(q1, q2, p1))
        || (o4 == 0 && within_bounds(q1, q2, p2))
}
