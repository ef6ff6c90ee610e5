//! Free-form Bézier shape.

use super::{PropKind, ShapeVTable, style_defaults, style_prop_kind};
use crate::geometry::{Bezier, BoundingBox, Point};
use crate::lottie::{LottieProperty, bezier_to_lottie};
use crate::paint::RenderTarget;
use crate::props::{Props, PropsExt};
use serde_json::Value;

pub(super) static VTABLE: ShapeVTable = ShapeVTable {
    lottie_ty: "sh",
    default_props,
    prop_kind,
    bounding_box,
    contains,
    draw_path,
    lottie_properties: &[LottieProperty {
        name: "ks",
        inputs: &["bezier"],
        convert: lottie_curve,
    }],
};

fn default_props() -> Props {
    let mut props = style_defaults();
    props.insert("bezier".into(), Bezier::default().into());
    props
}

fn prop_kind(key: &str) -> Option<PropKind> {
    match key {
        "bezier" => Some(PropKind::Bezier),
        _ => style_prop_kind(key),
    }
}

fn bounding_box(props: &Props) -> BoundingBox {
    props
        .bezier("bezier")
        .map(Bezier::bounding_box)
        .unwrap_or_default()
}

fn contains(props: &Props, pos: Point) -> bool {
    props
        .bezier("bezier")
        .is_some_and(|curve| curve.contains_point(pos))
}

fn draw_path(props: &Props, target: &mut dyn RenderTarget) {
    if let Some(curve) = props.bezier("bezier") {
        curve.draw_path(target);
    }
}

fn lottie_curve(props: &Props) -> Value {
    bezier_to_lottie(props.bezier("bezier").unwrap_or(&Bezier::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Props {
        let mut p = default_props();
        let mut curve = Bezier::default();
        curve.add_segment(Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        curve.add_segment(Point::new(10.0, 0.0), Point::new(5.0, 10.0), Point::new(5.0, 10.0));
        p.insert("bezier".into(), curve.into());
        p
    }

    #[test]
    fn test_bounds_and_contains() {
        let p = triangle();
        let bbox = bounding_box(&p);
        assert!((bbox.width - 10.0).abs() < 1e-9);
        assert!((bbox.height - 10.0).abs() < 1e-9);
        // open curve, implicitly closed for the hit test
        assert!(contains(&p, Point::new(5.1, 3.3)));
        assert!(!contains(&p, Point::new(9.1, 8.3)));
        assert!(!contains(&default_props(), Point::ORIGIN));
    }
}
