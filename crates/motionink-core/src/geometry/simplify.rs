//! Curve fitting for freehand strokes.
//!
//! Raw pointer samples go through two passes: Visvalingam–Whyatt decimation
//! drops points whose triangle with their neighbours is too small, then the
//! survivors are joined by a smooth cubic spline whose handles come from a
//! tridiagonal system solved with the Thomas algorithm.

use super::{Bezier, BezierSegment, Point};

/// Fit a smooth curve through `points`, discarding detail below `threshold`.
///
/// `threshold` is compared against twice the triangle area. With fewer than
/// three points or a non-positive threshold the points are joined by straight
/// segments instead.
pub fn simplify(points: &[Point], threshold: f64) -> Bezier {
    if points.len() < 3 || threshold <= 0.0 {
        return polyline_bezier(points);
    }
    smooth_bezier(&decimate(points, threshold))
}

/// Twice the area of the triangle around `points[index]`.
fn triangle_area(points: &[Point], index: usize) -> f64 {
    let prev = points[index - 1];
    let here = points[index];
    let next = points[index + 1];
    (prev.x * here.y - here.x * prev.y + here.x * next.y - next.x * here.y + next.x * prev.y
        - prev.x * next.y)
        .abs()
}

fn decimate(points: &[Point], threshold: f64) -> Vec<Point> {
    let mut points = points.to_vec();
    // areas[i] belongs to points[i]; the first entry is a placeholder that
    // never qualifies, the last point has no entry
    let mut areas = Vec::with_capacity(points.len() - 1);
    areas.push(threshold);
    areas.extend((1..points.len() - 1).map(|i| triangle_area(&points, i)));

    loop {
        let mut min = threshold;
        let mut found = None;
        for (i, area) in areas.iter().enumerate() {
            if *area < min {
                min = *area;
                found = Some(i);
            }
        }
        let Some(index) = found else {
            break;
        };

        areas.remove(index);
        points.remove(index);

        if index < areas.len() {
            areas[index] = triangle_area(&points, index);
        }
        if index > 1 {
            areas[index - 1] = triangle_area(&points, index - 1);
        }
    }

    points
}

/// Straight segments between consecutive points.
pub fn polyline_bezier(points: &[Point]) -> Bezier {
    Bezier::new(
        points
            .windows(2)
            .map(|pair| BezierSegment::line(pair[0], pair[1]))
            .collect(),
    )
}

/// Smooth spline through every point, one segment per consecutive pair.
pub fn smooth_bezier(points: &[Point]) -> Bezier {
    let n = points.len();
    if n < 2 {
        return polyline_bezier(points);
    }

    let mut a = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    let mut c = Vec::with_capacity(n);
    let mut r = Vec::with_capacity(n);

    a.push(0.0);
    b.push(2.0);
    c.push(1.0);
    r.push(points[0] + points[1] * 2.0);

    for i in 1..n - 1 {
        a.push(1.0);
        b.push(4.0);
        c.push(1.0);
        r.push(points[i] * 4.0 + points[i + 1] * 2.0);
    }

    a.push(2.0);
    b.push(7.0);
    c.push(0.0);
    r.push(points[n - 2] * 8.0 + points[n - 1]);

    // forward elimination
    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m * c[i - 1];
        let prev = r[i - 1];
        r[i] -= prev * m;
    }

    // back substitution
    let mut tan_in = vec![Point::ORIGIN; n];
    let mut tan_out = vec![Point::ORIGIN; n];
    tan_in[n - 1] = points[n - 1];
    tan_out[n - 1] = points[n - 1];
    let mut last = r[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        last = (r[i] - last * c[i]) / b[i];
        let relative = last - points[i];
        tan_in[i] = points[i] - relative;
        tan_out[i] = points[i] + relative;
    }

    Bezier::new(
        (1..n)
            .map(|i| BezierSegment::new(points[i - 1], tan_out[i - 1], tan_in[i], points[i]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 0.0),
            Point::new(4.0, 0.0),
        ]
    }

    #[test]
    fn test_small_deviations_are_removed() {
        let bezier = simplify(&zigzag(), 1.5);
        assert_eq!(bezier.len(), 2);
        let points = bezier.to_points();
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[3], Point::new(2.0, 1.0));
        assert_eq!(points[6], Point::new(4.0, 0.0));
    }

    #[test]
    fn test_zero_threshold_keeps_every_point() {
        let bezier = simplify(&zigzag(), 0.0);
        assert_eq!(bezier.len(), 4);
        // unsmoothed: handles sit on the endpoints
        let seg = bezier.segments()[1];
        assert_eq!(seg.points()[1], Point::new(1.0, 0.0));
        assert_eq!(seg.points()[2], Point::new(2.0, 1.0));
    }

    #[test]
    fn test_short_input() {
        assert!(simplify(&[], 10.0).is_empty());
        assert!(simplify(&[Point::new(1.0, 1.0)], 10.0).is_empty());
        assert_eq!(simplify(&[Point::ORIGIN, Point::new(3.0, 4.0)], 10.0).len(), 1);
    }

    #[test]
    fn test_large_threshold_keeps_endpoints() {
        let points: Vec<Point> = (0..50)
            .map(|i| {
                let x = f64::from(i);
                Point::new(x * 4.0, (x * 0.3).sin() * 3.0)
            })
            .collect();
        let bezier = simplify(&points, 1e9);
        assert_eq!(bezier.len(), 1);
        assert_eq!(bezier.segments()[0].start(), points[0]);
        assert_eq!(bezier.segments()[0].end(), points[49]);
    }

    #[test]
    fn test_smooth_spline_is_continuous() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
            Point::new(30.0, 25.0),
            Point::new(45.0, 5.0),
        ];
        let bezier = smooth_bezier(&points);
        assert_eq!(bezier.len(), 3);
        for (i, seg) in bezier.segments().iter().enumerate() {
            assert_eq!(seg.start(), points[i]);
            assert_eq!(seg.end(), points[i + 1]);
            assert!(seg.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        }
        // interior handles are mirrored around their point
        let left = bezier.segments()[0].points()[2];
        let right = bezier.segments()[1].points()[1];
        assert_eq!((left + right) / 2.0, points[1]);
    }
}
