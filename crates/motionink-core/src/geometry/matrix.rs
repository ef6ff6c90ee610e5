//! 4x4 transform matrix.

use super::{Point, fuzzy_eq};
use std::ops::Mul;

/// A 4x4 transform stored row-major as 16 coefficients.
///
/// Points are row vectors, so `a * b` applies `a` first and then `b`. The
/// builder methods (`translate`, `scale`, `rotate`, ...) right-multiply, which
/// means a chain reads in application order.
#[derive(Debug, Clone, Copy)]
pub struct Matrix {
    pub elements: [f64; 16],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.elements
            .iter()
            .zip(other.elements.iter())
            .all(|(a, b)| fuzzy_eq(*a, *b))
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        let a = &self.elements;
        let b = &rhs.elements;
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = (0..4).map(|k| a[row * 4 + k] * b[k * 4 + col]).sum();
            }
        }
        Matrix { elements: out }
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_elements(elements: [f64; 16]) -> Self {
        Self { elements }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[12] = dx;
        m.elements[13] = dy;
        m.elements[14] = dz;
        m
    }

    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[0] = sx;
        m.elements[5] = sy;
        m.elements[10] = sz;
        m
    }

    pub fn rotation_x(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.elements[5] = cos;
        m.elements[6] = -sin;
        m.elements[9] = sin;
        m.elements[10] = cos;
        m
    }

    pub fn rotation_y(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.elements[0] = cos;
        m.elements[2] = sin;
        m.elements[8] = -sin;
        m.elements[10] = cos;
        m
    }

    pub fn rotation_z(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.elements[0] = cos;
        m.elements[1] = -sin;
        m.elements[4] = sin;
        m.elements[5] = cos;
        m
    }

    /// Shear along the X axis by `angle` radians.
    pub fn axis_skew(angle: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.elements[4] = angle.tan();
        m
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        self * Self::translation(dx, dy, 0.0)
    }

    pub fn scale(self, sx: f64, sy: f64) -> Self {
        self * Self::scaling(sx, sy, 1.0)
    }

    /// Rotate about the Z axis (the 2D rotation).
    pub fn rotate(self, angle: f64) -> Self {
        self * Self::rotation_z(angle)
    }

    pub fn rotate_x(self, angle: f64) -> Self {
        self * Self::rotation_x(angle)
    }

    pub fn rotate_y(self, angle: f64) -> Self {
        self * Self::rotation_y(angle)
    }

    /// Skew by `amount` along the direction `angle`.
    pub fn skew(self, amount: f64, angle: f64) -> Self {
        self.rotate(-angle) * Self::axis_skew(-amount) * Self::rotation_z(angle)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Transform a 2D point (z = 0, w = 1).
    pub fn map(&self, p: Point) -> Point {
        let e = &self.elements;
        Point::new(
            p.x * e[0] + p.y * e[4] + e[12],
            p.x * e[1] + p.y * e[5] + e[13],
        )
    }

    pub fn determinant(&self) -> f64 {
        let c = Cofactors::new(&self.elements);
        c.determinant()
    }

    /// Closed-form inverse; `None` when the determinant is zero.
    pub fn inverse(&self) -> Option<Matrix> {
        let a = &self.elements;
        let c = Cofactors::new(a);
        let det = c.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let [
            a00, a01, a02, a03, a10, a11, a12, a13, a20, a21, a22, a23, a30, a31, a32, a33,
        ] = *a;
        let Cofactors {
            b00,
            b01,
            b02,
            b03,
            b04,
            b05,
            b06,
            b07,
            b08,
            b09,
            b10,
            b11,
        } = c;
        Some(Matrix {
            elements: [
                (a11 * b11 - a12 * b10 + a13 * b09) * inv,
                (a02 * b10 - a01 * b11 - a03 * b09) * inv,
                (a31 * b05 - a32 * b04 + a33 * b03) * inv,
                (a22 * b04 - a21 * b05 - a23 * b03) * inv,
                (a12 * b08 - a10 * b11 - a13 * b07) * inv,
                (a00 * b11 - a02 * b08 + a03 * b07) * inv,
                (a32 * b02 - a30 * b05 - a33 * b01) * inv,
                (a20 * b05 - a22 * b02 + a23 * b01) * inv,
                (a10 * b10 - a11 * b08 + a13 * b06) * inv,
                (a01 * b08 - a00 * b10 - a03 * b06) * inv,
                (a30 * b04 - a31 * b02 + a33 * b00) * inv,
                (a21 * b02 - a20 * b04 - a23 * b00) * inv,
                (a11 * b07 - a10 * b09 - a12 * b06) * inv,
                (a00 * b09 - a01 * b07 + a02 * b06) * inv,
                (a31 * b01 - a30 * b03 - a32 * b00) * inv,
                (a20 * b03 - a21 * b01 + a22 * b00) * inv,
            ],
        })
    }

    /// Project to the `[a, b, c, d, e, f]` form used by 2D canvases.
    pub fn to_canvas(&self) -> [f64; 6] {
        let e = &self.elements;
        [e[0], e[1], e[4], e[5], e[12], e[13]]
    }

    pub fn to_affine(&self) -> kurbo::Affine {
        kurbo::Affine::new(self.to_canvas())
    }
}

/// 2x2 sub-determinants shared by the determinant and the adjugate.
struct Cofactors {
    b00: f64,
    b01: f64,
    b02: f64,
    b03: f64,
    b04: f64,
    b05: f64,
    b06: f64,
    b07: f64,
    b08: f64,
    b09: f64,
    b10: f64,
    b11: f64,
}

impl Cofactors {
    fn new(a: &[f64; 16]) -> Self {
        Self {
            b00: a[0] * a[5] - a[1] * a[4],
            b01: a[0] * a[6] - a[2] * a[4],
            b02: a[0] * a[7] - a[3] * a[4],
            b03: a[1] * a[6] - a[2] * a[5],
            b04: a[1] * a[7] - a[3] * a[5],
            b05: a[2] * a[7] - a[3] * a[6],
            b06: a[8] * a[13] - a[9] * a[12],
            b07: a[8] * a[14] - a[10] * a[12],
            b08: a[8] * a[15] - a[11] * a[12],
            b09: a[9] * a[14] - a[10] * a[13],
            b10: a[9] * a[15] - a[11] * a[13],
            b11: a[10] * a[15] - a[11] * a[14],
        }
    }

    fn determinant(&self) -> f64 {
        self.b00 * self.b11 - self.b01 * self.b10
            + self.b02 * self.b09
            + self.b03 * self.b08
            - self.b04 * self.b07
            + self.b05 * self.b06
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_maps_point_unchanged() {
        let p = Point::new(3.0, -7.0);
        assert_eq!(Matrix::IDENTITY.map(p), p);
        assert!(Matrix::default().is_identity());
    }

    #[test]
    fn test_chain_applies_in_order() {
        // anchor-centred scale + rotate, then placement
        let m = Matrix::IDENTITY
            .translate(-10.0, 0.0)
            .scale(2.0, 2.0)
            .rotate(-FRAC_PI_2)
            .translate(100.0, 50.0);
        assert_eq!(m.map(Point::new(10.0, 0.0)), Point::new(100.0, 50.0));
        assert_eq!(m.map(Point::new(11.0, 0.0)), Point::new(100.0, 52.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = Matrix::IDENTITY
            .translate(5.0, -3.0)
            .scale(1.5, 0.5)
            .rotate(0.7)
            .translate(20.0, 40.0);
        let inv = m.inverse().unwrap();
        let p = Point::new(12.5, -8.25);
        assert_eq!(inv.map(m.map(p)), p);
        assert!((m * inv).is_identity());
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = Matrix::IDENTITY.scale(0.0, 1.0);
        assert!(m.inverse().is_none());
        assert!(m.determinant().abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_canvas_layout() {
        let m = Matrix::IDENTITY.scale(2.0, 3.0).translate(4.0, 5.0);
        assert_eq!(m.to_canvas(), [2.0, 0.0, 0.0, 3.0, 4.0, 5.0]);
        let affine = m.to_affine();
        let mapped = affine * kurbo::Point::new(1.0, 1.0);
        assert!((mapped.x - 6.0).abs() < 1e-12);
        assert!((mapped.y - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_skew_zero_is_identity() {
        let m = Matrix::IDENTITY.skew(0.0, 0.3);
        assert!(m.is_identity());
        let sheared = Matrix::IDENTITY.skew(std::f64::consts::FRAC_PI_4, 0.0);
        assert_eq!(sheared.map(Point::new(0.0, 1.0)), Point::new(-1.0, 1.0));
    }
}
