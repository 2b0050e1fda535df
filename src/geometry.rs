use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in the global y-down pixel space. Width and height are
/// never negative: constructors clamp them to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Builds a box from its center point, as layered graph layouts report them.
    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    pub fn overlaps_horizontally(&self, other: &Bounds) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// Waypoints to store on an emitted connector. The first and last points
/// of a longer route are node-center anchors; the consuming renderer
/// attaches connectors to shape borders on its own.
pub fn trim_waypoints(points: &[Point]) -> Vec<Point> {
    if points.len() > 2 {
        points[1..points.len() - 1].to_vec()
    } else {
        points.to_vec()
    }
}

/// Extent covering every box, or `None` for an empty input.
pub fn bounding_box<'a>(boxes: impl IntoIterator<Item = &'a Bounds>) -> Option<Bounds> {
    boxes
        .into_iter()
        .copied()
        .reduce(|acc, next| acc.union(&next))
}
