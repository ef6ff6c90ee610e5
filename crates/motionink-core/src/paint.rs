//! Immediate-mode drawing surface the scene paints onto.

use crate::geometry::Point;
use peniko::Color;

/// Control-point distance for a quarter ellipse approximated by one cubic.
const KAPPA: f64 = 0.552_284_749_8;

/// A 2D canvas with path construction, even-odd fill, stroke and a
/// save/restore transform stack.
pub trait RenderTarget {
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);

    /// Start a new, empty path.
    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point);
    fn close_path(&mut self);

    /// Fill the current path with the even-odd rule.
    fn fill_even_odd(&mut self);
    fn stroke(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    /// Multiply the current transform by `[a, b, c, d, e, f]`.
    fn transform(&mut self, m: [f64; 6]);

    /// Axis-aligned ellipse as a closed subpath.
    fn ellipse(&mut self, center: Point, rx: f64, ry: f64) {
        let (cx, cy) = (center.x, center.y);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        self.move_to(Point::new(cx + rx, cy));
        self.bezier_curve_to(
            Point::new(cx + rx, cy + ky),
            Point::new(cx + kx, cy + ry),
            Point::new(cx, cy + ry),
        );
        self.bezier_curve_to(
            Point::new(cx - kx, cy + ry),
            Point::new(cx - rx, cy + ky),
            Point::new(cx - rx, cy),
        );
        self.bezier_curve_to(
            Point::new(cx - rx, cy - ky),
            Point::new(cx - kx, cy - ry),
            Point::new(cx, cy - ry),
        );
        self.bezier_curve_to(
            Point::new(cx + kx, cy - ry),
            Point::new(cx + rx, cy - ky),
            Point::new(cx + rx, cy),
        );
        self.close_path();
    }

    /// Rectangle as a closed subpath.
    fn rect(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.move_to(Point::new(left, top));
        self.line_to(Point::new(left + width, top));
        self.line_to(Point::new(left + width, top + height));
        self.line_to(Point::new(left, top + height));
        self.close_path();
    }
}
