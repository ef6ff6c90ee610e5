//! Rectangle shape.

use super::{PropKind, ShapeVTable, number, style_defaults, style_prop_kind};
use crate::geometry::{BoundingBox, Point};
use crate::lottie::LottieProperty;
use crate::paint::RenderTarget;
use crate::props::Props;
use serde_json::{Value, json};

pub(super) static VTABLE: ShapeVTable = ShapeVTable {
    lottie_ty: "rc",
    default_props,
    prop_kind,
    bounding_box,
    contains,
    draw_path,
    lottie_properties: &[
        LottieProperty {
            name: "p",
            inputs: &["left", "top", "width", "height"],
            convert: lottie_center,
        },
        LottieProperty {
            name: "s",
            inputs: &["width", "height"],
            convert: lottie_size,
        },
        LottieProperty {
            name: "r",
            inputs: &[],
            convert: lottie_roundness,
        },
    ],
};

fn default_props() -> Props {
    let mut props = style_defaults();
    props.extend(crate::props! {
        "left" => 0.0,
        "top" => 0.0,
        "width" => 0.0,
        "height" => 0.0,
    });
    props
}

fn prop_kind(key: &str) -> Option<PropKind> {
    match key {
        "left" | "top" | "width" | "height" => Some(PropKind::Number),
        _ => style_prop_kind(key),
    }
}

fn bounding_box(props: &Props) -> BoundingBox {
    BoundingBox::new(
        number(props, "left"),
        number(props, "top"),
        number(props, "width"),
        number(props, "height"),
    )
}

fn contains(props: &Props, pos: Point) -> bool {
    let bbox = bounding_box(props);
    pos.x >= bbox.left && pos.x <= bbox.right() && pos.y >= bbox.top && pos.y <= bbox.bottom()
}

fn draw_path(props: &Props, target: &mut dyn RenderTarget) {
    target.rect(
        number(props, "left"),
        number(props, "top"),
        number(props, "width"),
        number(props, "height"),
    );
}

fn lottie_center(props: &Props) -> Value {
    let center = bounding_box(props).center();
    json!([center.x, center.y])
}

fn lottie_size(props: &Props) -> Value {
    json!([number(props, "width"), number(props, "height")])
}

fn lottie_roundness(_props: &Props) -> Value {
    json!(0)
}
