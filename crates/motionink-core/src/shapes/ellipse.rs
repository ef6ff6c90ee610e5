//! Ellipse shape.

use super::{PropKind, ShapeVTable, number, style_defaults, style_prop_kind};
use crate::geometry::{BoundingBox, Point};
use crate::lottie::LottieProperty;
use crate::paint::RenderTarget;
use crate::props::Props;
use serde_json::{Value, json};

pub(super) static VTABLE: ShapeVTable = ShapeVTable {
    lottie_ty: "el",
    default_props,
    prop_kind,
    bounding_box,
    contains,
    draw_path,
    lottie_properties: &[
        LottieProperty {
            name: "p",
            inputs: &["cx", "cy"],
            convert: lottie_position,
        },
        LottieProperty {
            name: "s",
            inputs: &["rx", "ry"],
            convert: lottie_size,
        },
    ],
};

fn default_props() -> Props {
    let mut props = style_defaults();
    props.extend(crate::props! {
        "cx" => 0.0,
        "cy" => 0.0,
        "rx" => 0.0,
        "ry" => 0.0,
    });
    props
}

fn prop_kind(key: &str) -> Option<PropKind> {
    match key {
        "cx" | "cy" | "rx" | "ry" => Some(PropKind::Number),
        _ => style_prop_kind(key),
    }
}

fn bounding_box(props: &Props) -> BoundingBox {
    let (rx, ry) = (number(props, "rx"), number(props, "ry"));
    BoundingBox::new(
        number(props, "cx") - rx,
        number(props, "cy") - ry,
        rx * 2.0,
        ry * 2.0,
    )
}

/// Implicit form `dx²/rx² + dy²/ry² <= 1`; degenerate radii contain nothing.
fn contains(props: &Props, pos: Point) -> bool {
    let (rx, ry) = (number(props, "rx"), number(props, "ry"));
    if rx == 0.0 || ry == 0.0 {
        return false;
    }
    let dx = pos.x - number(props, "cx");
    let dy = pos.y - number(props, "cy");
    (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0
}

fn draw_path(props: &Props, target: &mut dyn RenderTarget) {
    target.ellipse(
        Point::new(number(props, "cx"), number(props, "cy")),
        number(props, "rx").abs(),
        number(props, "ry").abs(),
    );
}

fn lottie_position(props: &Props) -> Value {
    json!([number(props, "cx"), number(props, "cy")])
}

fn lottie_size(props: &Props) -> Value {
    json!([number(props, "rx") * 2.0, number(props, "ry") * 2.0])
}
