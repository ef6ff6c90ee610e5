//! Geometry kernel: points, transforms, bounds and cubic Bézier math.
//!
//! Everything in here is plain value math with no knowledge of the scene.
//! Comparisons go through [`fuzzy_zero`] / [`fuzzy_eq`] so that the float noise
//! accumulated by transforms and root solving doesn't leak into equality.

mod bezier;
mod bounds;
mod matrix;
mod roots;
mod simplify;

pub use bezier::{Bezier, BezierSegment};
pub use bounds::{BoundingBox, Bounds, Polygon};
pub use matrix::Matrix;
pub use roots::{cubic_roots, filter_roots, quadratic_roots};
pub use simplify::{polyline_bezier, simplify, smooth_bezier};

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Tolerance used by every fuzzy comparison in the kernel.
pub const FUZZY_EPSILON: f64 = 1e-5;

/// Whether `value` is zero within [`FUZZY_EPSILON`].
#[inline]
pub fn fuzzy_zero(value: f64) -> bool {
    value.abs() <= FUZZY_EPSILON
}

/// Whether two scalars are equal, absolutely or relative to their magnitude.
#[inline]
pub fn fuzzy_eq(a: f64, b: f64) -> bool {
    let delta = (a - b).abs();
    delta <= FUZZY_EPSILON || delta / FUZZY_EPSILON <= a.abs().min(b.abs())
}

/// Linear interpolation between two scalars.
#[inline]
pub fn lerp(factor: f64, a: f64, b: f64) -> f64 {
    a + (b - a) * factor
}

/// A 2D coordinate.
///
/// Serialized as a `[x, y]` pair. Equality is fuzzy (see [`fuzzy_eq`]).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `length` along the direction `angle` (radians) from the origin.
    pub fn polar(angle: f64, length: f64) -> Self {
        Self::new(angle.cos() * length, angle.sin() * length)
    }

    /// Offset this point by a polar vector.
    pub fn add_polar(self, angle: f64, length: f64) -> Self {
        self + Self::polar(angle, length)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Angle of the vector from the origin, in radians.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn is_origin(self) -> bool {
        fuzzy_zero(self.x) && fuzzy_zero(self.y)
    }

    /// Interpolate towards `other`; `factor == 0` gives `self`.
    pub fn lerp(self, factor: f64, other: Point) -> Point {
        Point::new(lerp(factor, self.x, other.x), lerp(factor, self.y, other.y))
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        fuzzy_eq(self.x, other.x) && fuzzy_eq(self.y, other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}
