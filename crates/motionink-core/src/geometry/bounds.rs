//! Axis-aligned boxes and transformed quadrilaterals.

use super::{Matrix, Point};

/// Axis-aligned rectangle. A negative width marks the box as empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        left: -1.0,
        top: -1.0,
        width: -1.0,
        height: -1.0,
    };

    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Smallest box containing every point, or [`BoundingBox::EMPTY`].
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut bbox = Self::EMPTY;
        bbox.include_points(points);
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.width < 0.0
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Corners clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right(), self.top),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left, self.bottom()),
        ]
    }

    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.left
            && p.x <= self.right()
            && p.y >= self.top
            && p.y <= self.bottom()
    }

    /// Grow by `margin` on every side. Empty boxes stay empty.
    pub fn expand(&mut self, margin: f64) {
        if self.is_empty() {
            return;
        }
        self.left -= margin;
        self.top -= margin;
        self.width += margin * 2.0;
        self.height += margin * 2.0;
    }

    pub fn expanded(mut self, margin: f64) -> Self {
        self.expand(margin);
        self
    }

    /// Grow to cover `points`, merging with the current extent unless empty.
    pub fn include_points<I: IntoIterator<Item = Point>>(&mut self, points: I) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        if self.width >= 0.0 && self.height >= 0.0 {
            min = Point::new(self.left, self.top);
            max = Point::new(self.right(), self.bottom());
        }
        let mut any = !self.is_empty();
        for p in points {
            any = true;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if any {
            *self = Self::new(min.x, min.y, max.x - min.x, max.y - min.y);
        }
    }

    /// Union with another box or polygon. Empty inputs are skipped.
    pub fn include(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.include_points(other.corners());
    }

    /// Map the corners through `matrix`.
    pub fn transformed(&self, matrix: &Matrix) -> Polygon {
        Polygon::new(self.corners().map(|p| matrix.map(p)))
    }
}

/// A box after a non-axis-aligned transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub corners: [Point; 4],
}

impl Polygon {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    pub fn center(&self) -> Point {
        self.corners
            .iter()
            .fold(Point::ORIGIN, |acc, p| acc + *p)
            / 4.0
    }

    pub fn to_aabb(&self) -> BoundingBox {
        BoundingBox::from_points(self.corners)
    }
}

/// Result of a bounding-box query: a plain box, or a box seen through a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Box(BoundingBox),
    Polygon(Polygon),
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::Box(BoundingBox::EMPTY)
    }
}

impl From<BoundingBox> for Bounds {
    fn from(bbox: BoundingBox) -> Self {
        Bounds::Box(bbox)
    }
}

impl From<Polygon> for Bounds {
    fn from(poly: Polygon) -> Self {
        Bounds::Polygon(poly)
    }
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        match self {
            Bounds::Box(b) => b.is_empty(),
            Bounds::Polygon(_) => false,
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        match self {
            Bounds::Box(b) => b.corners(),
            Bounds::Polygon(p) => p.corners,
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Bounds::Box(b) => b.center(),
            Bounds::Polygon(p) => p.center(),
        }
    }

    pub fn to_aabb(&self) -> BoundingBox {
        match self {
            Bounds::Box(b) => *b,
            Bounds::Polygon(p) => p.to_aabb(),
        }
    }

    /// Margin expansion applies to boxes only; a polygon is returned as is.
    pub fn expand(&mut self, margin: f64) {
        if let Bounds::Box(b) = self {
            b.expand(margin);
        }
    }

    pub fn transformed(&self, matrix: &Matrix) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        Bounds::Polygon(Polygon::new(self.corners().map(|p| matrix.map(p))))
    }
}
