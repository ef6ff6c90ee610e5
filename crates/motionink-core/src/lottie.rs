//! Lottie export of a scene.
//!
//! Each exported property reads one or more scene properties. A property is
//! animated (`{"a": 1, "k": [...]}`) when any keyframe of the object sets one of
//! its inputs, and static (`{"a": 0, "k": value}`) otherwise.

use crate::geometry::{Bezier, Point};
use crate::props::{Props, PropsExt};
use crate::scene::{ROOT_ID, Scene};
use crate::shapes::{EditorObject, group};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One exported property and the scene properties it is computed from.
pub struct LottieProperty {
    /// Lottie key, e.g. `p` or `s`.
    pub name: &'static str,
    /// Scene properties the value depends on.
    pub inputs: &'static [&'static str],
    pub convert: fn(&Props) -> Value,
}

/// Timing and size of the exported animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    pub width: f64,
    pub height: f64,
    pub frame_rate: f64,
    pub in_point: f64,
    pub out_point: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            width: 512.0,
            height: 512.0,
            frame_rate: 60.0,
            in_point: 0.0,
            out_point: 180.0,
        }
    }
}

const FILL: LottieProperty = LottieProperty {
    name: "c",
    inputs: &["fill"],
    convert: fill_color,
};

const STROKE: LottieProperty = LottieProperty {
    name: "c",
    inputs: &["stroke"],
    convert: stroke_color,
};

const STROKE_WIDTH: LottieProperty = LottieProperty {
    name: "w",
    inputs: &["stroke_width"],
    convert: stroke_width,
};

fn unit_rgb(props: &Props, key: &str) -> Value {
    json!(props.color(key).to_unit_rgb())
}

fn fill_color(props: &Props) -> Value {
    unit_rgb(props, "fill")
}

fn stroke_color(props: &Props) -> Value {
    unit_rgb(props, "stroke")
}

fn stroke_width(props: &Props) -> Value {
    json!(props.number("stroke_width").unwrap_or(0.0))
}

fn static_value(value: Value) -> Value {
    json!({"a": 0, "k": value})
}

/// Keyframe start values are always arrays.
fn keyframe_value(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => json!([other]),
    }
}

/// Static or animated value of `property` for `object`.
///
/// Keyframes that leave an input unset fall back to the live value.
fn property_value(property: &LottieProperty, object: &EditorObject) -> Value {
    let animated: Vec<_> = object
        .timeline()
        .keyframes()
        .iter()
        .filter(|kf| property.inputs.iter().any(|key| kf.props.contains_key(*key)))
        .collect();
    if animated.is_empty() {
        return static_value((property.convert)(object.props()));
    }
    let keyframes: Vec<Value> = animated
        .into_iter()
        .map(|kf| {
            let mut resolved = object.props().clone();
            resolved.extend(kf.props.clone());
            json!({
                "t": kf.time,
                "s": keyframe_value((property.convert)(&resolved)),
                "o": {"x": 0, "y": 0},
                "i": {"x": 1, "y": 1},
            })
        })
        .collect();
    json!({"a": 1, "k": keyframes})
}

fn properties_object(properties: &[LottieProperty], object: &EditorObject, init: Value) -> Value {
    let mut map = match init {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for property in properties {
        map.insert(property.name.to_string(), property_value(property, object));
    }
    Value::Object(map)
}

/// Transform (`tr` item or layer `ks`) of a container.
fn transform(object: &EditorObject, init: Value) -> Value {
    let mut value = properties_object(group::TRANSFORM_PROPERTIES, object, init);
    if let Value::Object(map) = &mut value {
        map.insert("o".into(), static_value(json!(100)));
    }
    value
}

fn identity_transform(init: Value) -> Value {
    let mut map = match init {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("a".into(), static_value(json!([0.0, 0.0])));
    map.insert("p".into(), static_value(json!([0.0, 0.0])));
    map.insert("r".into(), static_value(json!(0.0)));
    map.insert("s".into(), static_value(json!([100.0, 100.0])));
    map.insert("o".into(), static_value(json!(100)));
    Value::Object(map)
}

/// A curve as `{c, v, i, o}`; tangents are offsets from their vertex.
pub fn bezier_to_lottie(curve: &Bezier) -> Value {
    let segments = curve.segments();
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return json!({"c": false, "v": [], "i": [], "o": []});
    };
    let closed = curve.is_closed();

    let mut vertices: Vec<Point> = Vec::with_capacity(segments.len() + 1);
    let mut in_tangents = Vec::with_capacity(segments.len() + 1);
    let mut out_tangents = Vec::with_capacity(segments.len() + 1);

    in_tangents.push(if closed {
        last.points()[2] - first.start()
    } else {
        Point::ORIGIN
    });
    for (index, segment) in segments.iter().enumerate() {
        let [start, out_handle, _, _] = *segment.points();
        vertices.push(start);
        out_tangents.push(out_handle - start);
        if let Some(next) = segments.get(index + 1) {
            in_tangents.push(segment.points()[2] - next.start());
        }
    }
    if !closed {
        vertices.push(last.end());
        in_tangents.push(last.points()[2] - last.end());
        out_tangents.push(Point::ORIGIN);
    }

    json!({
        "c": closed,
        "v": vertices,
        "i": in_tangents,
        "o": out_tangents,
    })
}

/// A shape or group as a Lottie shape item.
pub fn shape_to_lottie(scene: &Scene, id: &str) -> Option<Value> {
    let object = scene.object(id)?;
    if let Some(vtable) = object.kind().primitive() {
        let geometry = properties_object(
            vtable.lottie_properties,
            object,
            json!({"ty": vtable.lottie_ty}),
        );
        let stroke = properties_object(
            &[STROKE, STROKE_WIDTH],
            object,
            json!({"ty": "st", "o": static_value(json!(object.props().color("stroke").opacity() * 100.0))}),
        );
        let fill = properties_object(
            &[FILL],
            object,
            json!({"ty": "fl", "o": static_value(json!(object.props().color("fill").opacity() * 100.0))}),
        );
        return Some(json!({
            "ty": "gr",
            "it": [geometry, stroke, fill, identity_transform(json!({"ty": "tr"}))],
        }));
    }

    let mut items: Vec<Value> = object
        .children()
        .iter()
        .filter_map(|child| shape_to_lottie(scene, child))
        .collect();
    items.push(transform(object, json!({"ty": "tr"})));
    Some(json!({"ty": "gr", "it": items}))
}

/// A top-level object as a shape layer.
fn layer_to_lottie(scene: &Scene, object: &EditorObject, settings: &AnimationSettings) -> Value {
    let (ks, shapes) = if object.kind().is_container() {
        let shapes: Vec<Value> = object
            .children()
            .iter()
            .filter_map(|child| shape_to_lottie(scene, child))
            .collect();
        (transform(object, json!({})), shapes)
    } else {
        let shapes = shape_to_lottie(scene, object.id()).into_iter().collect();
        (identity_transform(json!({})), shapes)
    };
    json!({
        "ty": 4,
        "nm": object.id(),
        "ip": settings.in_point,
        "op": settings.out_point,
        "st": 0,
        "sr": 1,
        "ks": ks,
        "shapes": shapes,
    })
}

/// Export the scene as a Lottie animation. Children of the root layer
/// become layers, in the same order.
pub fn export(scene: &Scene, settings: &AnimationSettings) -> Value {
    let layers: Vec<Value> = scene
        .children(ROOT_ID)
        .iter()
        .filter_map(|id| scene.object(id))
        .map(|object| layer_to_lottie(scene, object, settings))
        .collect();
    log::debug!("Exported {} layers", layers.len());
    json!({
        "v": "5.7.0",
        "w": settings.width,
        "h": settings.height,
        "ip": settings.in_point,
        "op": settings.out_point,
        "fr": settings.frame_rate,
        "layers": layers,
    })
}
