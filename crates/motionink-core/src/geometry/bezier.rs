//! Cubic Bézier segments and multi-segment curves.

use super::roots::{cubic_roots, filter_roots, quadratic_roots};
use super::{BoundingBox, Point, fuzzy_zero};
use crate::paint::RenderTarget;
use serde::{Deserialize, Serialize};

/// One cubic segment: start, two tangent handles, end.
///
/// The polynomial form `a t³ + b t² + c t + d` is precomputed on construction.
#[derive(Debug, Clone, Copy)]
pub struct BezierSegment {
    points: [Point; 4],
    a: Point,
    b: Point,
    c: Point,
    d: Point,
}

impl PartialEq for BezierSegment {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl BezierSegment {
    pub fn new(k0: Point, k1: Point, k2: Point, k3: Point) -> Self {
        Self {
            points: [k0, k1, k2, k3],
            a: -k0 + k1 * 3.0 - k2 * 3.0 + k3,
            b: k0 * 3.0 - k1 * 6.0 + k2 * 3.0,
            c: k0 * -3.0 + k1 * 3.0,
            d: k0,
        }
    }

    /// Straight segment with the handles sitting on the endpoints.
    pub fn line(from: Point, to: Point) -> Self {
        Self::new(from, from, to, to)
    }

    pub fn from_array(points: [Point; 4]) -> Self {
        let [k0, k1, k2, k3] = points;
        Self::new(k0, k1, k2, k3)
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[3]
    }

    /// Polynomial coefficients `[a, b, c, d]`.
    pub fn coefficients(&self) -> [Point; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn point(&self, t: f64) -> Point {
        ((self.a * t + self.b) * t + self.c) * t + self.d
    }

    pub fn derivative(&self, t: f64) -> Point {
        (self.a * (3.0 * t) + self.b * 2.0) * t + self.c
    }

    pub fn tangent_angle(&self, t: f64) -> f64 {
        let p = self.derivative(t);
        p.y.atan2(p.x)
    }

    pub fn normal_angle(&self, t: f64) -> f64 {
        let p = self.derivative(t);
        p.x.atan2(p.y)
    }

    pub fn lerp(&self, factor: f64, other: &BezierSegment) -> BezierSegment {
        let p = &self.points;
        let o = &other.points;
        Self::new(
            p[0].lerp(factor, o[0]),
            p[1].lerp(factor, o[1]),
            p[2].lerp(factor, o[2]),
            p[3].lerp(factor, o[3]),
        )
    }

    /// Parameters in `(0, 1)` where the curvature changes sign.
    pub fn inflection_points(&self) -> Vec<f64> {
        let (a, b, c) = (self.a, self.b, self.c);
        let denom = a.y * b.x - a.x * b.y;
        if fuzzy_zero(denom) {
            return Vec::new();
        }

        let t_cusp = -0.5 * (a.y * c.x - a.x * c.y) / denom;
        let square = t_cusp * t_cusp - (b.y * c.x - b.x * c.y) / (3.0 * denom);
        if square < 0.0 {
            return Vec::new();
        }

        let root = square.sqrt();
        if fuzzy_zero(root) {
            return if t_cusp > 0.0 && t_cusp < 1.0 {
                vec![t_cusp]
            } else {
                Vec::new()
            };
        }

        [t_cusp - root, t_cusp + root]
            .into_iter()
            .filter(|t| *t > 0.0 && *t < 1.0)
            .collect()
    }

    /// De Casteljau subdivision at `t`.
    ///
    /// At `t == 0` (`t == 1`) the first (second) half is a zero-length segment
    /// and the other half is the segment itself.
    pub fn split(&self, t: f64) -> (BezierSegment, BezierSegment) {
        if t == 0.0 {
            let s = self.start();
            return (Self::new(s, s, s, s), *self);
        }
        if t == 1.0 {
            let e = self.end();
            return (*self, Self::new(e, e, e, e));
        }

        let [p0, p1, p2, p3] = self.points;
        let p10 = p0.lerp(t, p1);
        let p11 = p1.lerp(t, p2);
        let p12 = p2.lerp(t, p3);
        let p20 = p10.lerp(t, p11);
        let p21 = p11.lerp(t, p12);
        let mid = p20.lerp(t, p21);

        (
            Self::new(p0, p10, p20, mid),
            Self::new(mid, p21, p12, p3),
        )
    }

    /// Exact extent: endpoints plus interior roots of the derivative.
    pub fn bounding_box(&self) -> BoundingBox {
        let (min_x, max_x) = self.extrema(|p| p.x);
        let (min_y, max_y) = self.extrema(|p| p.y);
        BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    fn extrema(&self, comp: impl Fn(Point) -> f64) -> (f64, f64) {
        let mut min = comp(self.start());
        let mut max = comp(self.end());
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }

        for t in quadratic_roots(3.0 * comp(self.a), 2.0 * comp(self.b), comp(self.c)) {
            if t > 0.0 && t < 1.0 {
                let value = comp(self.point(t));
                min = min.min(value);
                max = max.max(value);
            }
        }
        (min, max)
    }

    /// Curve parameters where the segment crosses the vertical line at `x`.
    pub fn ts_at_x(&self, x: f64) -> Vec<f64> {
        filter_roots(cubic_roots(self.a.x, self.b.x, self.c.x, self.d.x - x))
    }

    pub fn ys_at_x(&self, x: f64) -> Vec<f64> {
        self.ts_at_x(x).into_iter().map(|t| self.point(t).y).collect()
    }

    pub fn translated(&self, offset: Point) -> BezierSegment {
        Self::from_array(self.points.map(|p| p + offset))
    }
}

/// An ordered run of contiguous cubic segments.
///
/// Serialized as the flat control-point list
/// `[p0, c1, c2, p1, c1, c2, p2, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Bezier {
    segments: Vec<BezierSegment>,
}

impl From<Vec<Point>> for Bezier {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(&points)
    }
}

impl From<Bezier> for Vec<Point> {
    fn from(bezier: Bezier) -> Self {
        bezier.to_points()
    }
}

impl Bezier {
    pub fn new(segments: Vec<BezierSegment>) -> Self {
        Self { segments }
    }

    /// Rebuild from a flat control-point list. Needs at least four points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bezier = Self::default();
        if points.len() > 3 {
            let mut last = points[0];
            for chunk in points[1..].chunks_exact(3) {
                bezier
                    .segments
                    .push(BezierSegment::new(last, chunk[0], chunk[1], chunk[2]));
                last = chunk[2];
            }
        }
        bezier
    }

    pub fn to_points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.segments.len() * 3 + 1);
        if let Some(first) = self.segments.first() {
            points.push(first.start());
            for seg in &self.segments {
                points.extend_from_slice(&seg.points()[1..]);
            }
        }
        points
    }

    pub fn segments(&self) -> &[BezierSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&BezierSegment> {
        self.segments.get(index)
    }

    pub fn push_segment(&mut self, segment: BezierSegment) {
        self.segments.push(segment);
    }

    /// Append a segment that starts where the curve currently ends.
    ///
    /// On an empty curve the first handle doubles as the start point.
    pub fn add_segment(&mut self, k1: Point, k2: Point, k3: Point) {
        let start = self.last_segment().map_or(k1, |s| s.end());
        self.segments.push(BezierSegment::new(start, k1, k2, k3));
    }

    pub fn last_segment(&self) -> Option<&BezierSegment> {
        self.segments.last()
    }

    pub fn set_last_segment(&mut self, segment: BezierSegment) {
        match self.segments.last_mut() {
            Some(last) => *last = segment,
            None => self.segments.push(segment),
        }
    }

    pub fn replace_segment(&mut self, index: usize, segment: BezierSegment) {
        if let Some(slot) = self.segments.get_mut(index) {
            *slot = segment;
        }
    }

    /// Closed when the first start fuzzy-equals the last end.
    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.start() == last.end(),
            _ => false,
        }
    }

    /// Append a straight closing segment unless already closed.
    pub fn close(&mut self) {
        if let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) {
            let (start, end) = (first.start(), last.end());
            if start != end {
                self.segments.push(BezierSegment::line(end, start));
            }
        }
    }

    /// Per-control-point interpolation.
    ///
    /// Curves with different segment counts are not interpolated; `self` is
    /// returned unchanged, as it is for `factor <= 0`.
    pub fn lerp(&self, factor: f64, other: &Bezier) -> Bezier {
        if factor <= 0.0 || other.segments.len() != self.segments.len() {
            return self.clone();
        }
        Bezier::new(
            self.segments
                .iter()
                .zip(&other.segments)
                .map(|(a, b)| a.lerp(factor, b))
                .collect(),
        )
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::EMPTY;
        for seg in &self.segments {
            bbox.include_points(seg.bounding_box().corners());
        }
        bbox
    }

    /// Even-odd test with a vertical ray from `pos` towards +y.
    ///
    /// Open curves are treated as if closed by a straight segment from the
    /// last point back to the first; the curve itself is left untouched.
    pub fn contains_point(&self, pos: Point) -> bool {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return false;
        };

        let mut crossings = self
            .segments
            .iter()
            .flat_map(|seg| seg.ys_at_x(pos.x))
            .filter(|y| *y >= pos.y)
            .count();

        if !self.is_closed() {
            let closing = BezierSegment::line(last.end(), first.start());
            crossings += closing
                .ys_at_x(pos.x)
                .into_iter()
                .filter(|y| *y >= pos.y)
                .count();
        }

        crossings % 2 == 1
    }

    /// Emit the curve as path commands on `target`.
    pub fn draw_path(&self, target: &mut dyn RenderTarget) {
        let Some(first) = self.segments.first() else {
            return;
        };
        target.move_to(first.start());
        for seg in &self.segments {
            let [_, c1, c2, end] = *seg.points();
            target.bezier_curve_to(c1, c2, end);
        }
        if self.is_closed() {
            target.close_path();
        }
    }

    /// A copy moved by `offset`.
    pub fn dragged(&self, offset: Point) -> Bezier {
        Bezier::new(self.segments.iter().map(|s| s.translated(offset)).collect())
    }

    pub fn to_kurbo(&self) -> kurbo::BezPath {
        let mut path = kurbo::BezPath::new();
        if let Some(first) = self.segments.first() {
            path.move_to(first.start());
            for seg in &self.segments {
                let [_, c1, c2, end] = *seg.points();
                path.curve_to(c1, c2, end);
            }
            if self.is_closed() {
                path.close_path();
            }
        }
        path
    }
}
