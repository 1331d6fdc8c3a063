// THEORY:
// A `Blob` is the whole output of the perception layer for one marker in one frame:
// where the marker is and how big it looks. It is a "dumb" data container with no
// memory of previous frames. A blob that is too small to trust is never built;
// its absence is expressed as `Option::None` by the detector.

/// A pixel coordinate on the frame. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Displacement `(self - origin)` along each axis.
    pub fn offset_from(&self, origin: Point) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// A detected marker, reduced to its centroid and enclosing radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Area-weighted centroid of the marker's outer contour.
    pub center: Point,
    /// Radius of the minimum circle enclosing the contour, in pixels.
    pub radius: f32,
}

impl Blob {
    pub fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }
}
