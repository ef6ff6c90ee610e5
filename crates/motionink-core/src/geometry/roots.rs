//! Real roots of low-degree polynomials.

use super::{fuzzy_eq, fuzzy_zero};
use std::f64::consts::PI;

/// Real roots of `a x³ + b x² + c x + d = 0` (Cardano).
///
/// Falls back to [`quadratic_roots`] when `a` is fuzzy-zero. Roots are not
/// restricted to any interval; see [`filter_roots`].
pub fn cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if fuzzy_zero(a) {
        return quadratic_roots(b, c, d);
    }

    let b = b / a;
    let c = c / a;
    let d = d / a;

    let p = (3.0 * c - b * b) / 3.0;
    let p3 = p / 3.0;
    let q = (2.0 * b * b * b - 9.0 * b * c + 27.0 * d) / 27.0;
    let q2 = q / 2.0;
    let discriminant = q2 * q2 + p3 * p3 * p3;
    let shift = b / 3.0;

    if discriminant < 0.0 {
        // three real roots
        let mp3 = -p / 3.0;
        let r = (mp3 * mp3 * mp3).sqrt();
        let cos_phi = (-q / (2.0 * r)).clamp(-1.0, 1.0);
        let phi = cos_phi.acos();
        let t1 = 2.0 * r.cbrt();
        return vec![
            t1 * (phi / 3.0).cos() - shift,
            t1 * ((phi + 2.0 * PI) / 3.0).cos() - shift,
            t1 * ((phi + 4.0 * PI) / 3.0).cos() - shift,
        ];
    }

    if fuzzy_zero(discriminant) {
        // one single and one double root
        let u1 = if q2 < 0.0 { (-q2).cbrt() } else { -q2.cbrt() };
        return vec![2.0 * u1 - shift, -u1 - shift];
    }

    // one real root, two complex ones
    let sd = discriminant.sqrt();
    let u1 = (sd - q2).cbrt();
    let v1 = (sd + q2).cbrt();
    vec![u1 - v1 - shift]
}

/// Real roots of `a x² + b x + c = 0`, degrading to linear when `a` is fuzzy-zero.
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if fuzzy_zero(a) {
        if fuzzy_zero(b) {
            return Vec::new();
        }
        return vec![-c / b];
    }

    let s = b * b - 4.0 * a * c;
    if s < 0.0 {
        return Vec::new();
    }

    let single = -b / (2.0 * a);
    if fuzzy_zero(s) {
        return vec![single];
    }

    let delta = s.sqrt() / (2.0 * a);
    vec![single - delta, single + delta]
}

/// Keep roots inside `[0, 1]`, snapping fuzzy endpoints onto 0 and 1.
pub fn filter_roots<I: IntoIterator<Item = f64>>(roots: I) -> Vec<f64> {
    roots
        .into_iter()
        .filter_map(|r| {
            if fuzzy_zero(r) {
                Some(0.0)
            } else if fuzzy_eq(r, 1.0) {
                Some(1.0)
            } else if (0.0..=1.0).contains(&r) {
                Some(r)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut roots: Vec<f64>) -> Vec<f64> {
        roots.sort_by(|a, b| a.total_cmp(b));
        roots
    }

    fn assert_roots(actual: Vec<f64>, expected: &[f64]) {
        let actual = sorted(actual);
        assert_eq!(actual.len(), expected.len(), "roots: {actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "expected {e}, got {a}");
        }
    }

    #[test]
    fn test_cubic_three_real_roots() {
        // (x - 1)(x - 2)(x - 3)
        assert_roots(cubic_roots(1.0, -6.0, 11.0, -6.0), &[1.0, 2.0, 3.0]);
        // scaled leading coefficient
        assert_roots(cubic_roots(2.0, -12.0, 22.0, -12.0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cubic_double_root() {
        // (x - 1)²(x - 2); the double root may be reported once or twice
        let mut roots = sorted(cubic_roots(1.0, -4.0, 5.0, -2.0));
        roots.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
        assert_roots(roots, &[1.0, 2.0]);
    }

    #[test]
    fn test_cubic_single_real_root() {
        // (x - 1)(x² + x + 2)
        assert_roots(cubic_roots(1.0, 0.0, 1.0, -2.0), &[1.0]);
    }

    #[test]
    fn test_cubic_degrades_to_quadratic() {
        assert_roots(cubic_roots(0.0, 1.0, -3.0, 2.0), &[1.0, 2.0]);
    }

    #[test]
    fn test_quadratic_cases() {
        assert_roots(quadratic_roots(1.0, -3.0, 2.0), &[1.0, 2.0]);
        assert_roots(quadratic_roots(1.0, -2.0, 1.0), &[1.0]);
        assert!(quadratic_roots(1.0, 0.0, 1.0).is_empty());
        // linear
        assert_roots(quadratic_roots(0.0, 2.0, -4.0), &[2.0]);
        // constant
        assert!(quadratic_roots(0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_filter_roots() {
        let filtered = filter_roots([-0.000_001, 0.5, 1.000_002, 1.5, -0.3]);
        assert_eq!(filtered, vec![0.0, 0.5, 1.0]);
    }
}
