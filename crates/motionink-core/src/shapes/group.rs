//! Transform properties shared by groups and layers.

use super::PropKind;
use crate::geometry::{Matrix, Point};
use crate::lottie::LottieProperty;
use crate::props::{Props, PropsExt};
use serde_json::{Value, json};

/// Export of the anchor/position/rotation/scale transform.
pub(crate) static TRANSFORM_PROPERTIES: &[LottieProperty] = &[
    LottieProperty {
        name: "a",
        inputs: &["anchor"],
        convert: lottie_anchor,
    },
    LottieProperty {
        name: "p",
        inputs: &["position"],
        convert: lottie_position,
    },
    LottieProperty {
        name: "r",
        inputs: &["rotation"],
        convert: lottie_rotation,
    },
    LottieProperty {
        name: "s",
        inputs: &["scale"],
        convert: lottie_scale,
    },
];

pub(super) fn default_props() -> Props {
    crate::props! {
        "anchor" => Point::new(0.0, 0.0),
        "position" => Point::new(0.0, 0.0),
        "rotation" => 0.0,
        "scale" => Point::new(1.0, 1.0),
    }
}

pub(super) fn prop_kind(key: &str) -> Option<PropKind> {
    match key {
        "anchor" | "position" | "scale" => Some(PropKind::Point),
        "rotation" => Some(PropKind::Number),
        _ => None,
    }
}

/// Local-to-parent transform: translate by `-anchor`, scale, rotate by
/// `-rotation`, translate by `position`.
pub fn group_matrix(props: &Props) -> Matrix {
    let anchor = props.point("anchor").unwrap_or_default();
    let position = props.point("position").unwrap_or_default();
    let scale = props.point("scale").unwrap_or(Point::new(1.0, 1.0));
    let rotation = props.number("rotation").unwrap_or(0.0);
    Matrix::IDENTITY
        .translate(-anchor.x, -anchor.y)
        .scale(scale.x, scale.y)
        .rotate(-rotation)
        .translate(position.x, position.y)
}

fn point_json(props: &Props, key: &str, default: Point) -> Value {
    let p = props.point(key).unwrap_or(default);
    json!([p.x, p.y])
}

fn lottie_anchor(props: &Props) -> Value {
    point_json(props, "anchor", Point::ORIGIN)
}

fn lottie_position(props: &Props) -> Value {
    point_json(props, "position", Point::ORIGIN)
}

/// Rotation is stored in radians and exported in degrees.
fn lottie_rotation(props: &Props) -> Value {
    json!(props.number("rotation").unwrap_or(0.0).to_degrees())
}

/// Scale is stored as a factor and exported as a percentage.
fn lottie_scale(props: &Props) -> Value {
    let s = props.point("scale").unwrap_or(Point::new(1.0, 1.0)) * 100.0;
    json!([s.x, s.y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_matrix_order() {
        let props = props! {
            "anchor" => Point::new(10.0, 0.0),
            "position" => Point::new(100.0, 50.0),
            "rotation" => FRAC_PI_2,
            "scale" => Point::new(2.0, 2.0),
        };
        let m = group_matrix(&props);
        // the anchor lands on the position
        assert_eq!(m.map(Point::new(10.0, 0.0)), Point::new(100.0, 50.0));
        // one unit right of the anchor: scaled, then turned a quarter clockwise on screen
        assert_eq!(m.map(Point::new(11.0, 0.0)), Point::new(100.0, 52.0));
    }

    #[test]
    fn test_defaults_are_identity() {
        assert!(group_matrix(&default_props()).is_identity());
    }

    #[test]
    fn test_lottie_transform_units() {
        let props = props! { "rotation" => FRAC_PI_2, "scale" => Point::new(0.5, 2.0) };
        assert_eq!(lottie_rotation(&props), json!(90.0));
        assert_eq!(lottie_scale(&props), json!([50.0, 200.0]));
    }
}
