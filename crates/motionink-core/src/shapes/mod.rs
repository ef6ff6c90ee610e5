//! Scene objects: primitive shapes, groups and the root layer.
//!
//! Every object is an [`EditorObject`] tagged with a [`ShapeKind`]. Behaviour
//! that differs per primitive lives in a [`ShapeVTable`] found through
//! [`ShapeKind::primitive`]; containers (groups and layers) have no table and
//! are handled by the [`Scene`](crate::scene::Scene), which owns their children.

mod ellipse;
pub(crate) mod group;
mod path;
mod rectangle;

pub use group::group_matrix;

use crate::color::HexColor;
use crate::geometry::{BoundingBox, Matrix, Point};
use crate::lottie::LottieProperty;
use crate::paint::RenderTarget;
use crate::props::{PropValue, Props, PropsExt};
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a scene object: `<session prefix>-<counter>`.
pub type ObjectId = String;

/// Style keys shared by every primitive shape.
pub const STYLE_KEYS: [&str; 3] = ["fill", "stroke", "stroke_width"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown shape kind: {0}")]
pub struct UnknownShapeKind(pub String);

/// The closed set of object variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Ellipse,
    Rectangle,
    Bezier,
    Group,
    Layer,
}

/// Value type expected for a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Number,
    Color,
    Point,
    Bezier,
}

/// Per-variant behaviour of a primitive shape.
pub struct ShapeVTable {
    /// Lottie shape type (`el`, `rc`, `sh`).
    pub lottie_ty: &'static str,
    pub default_props: fn() -> Props,
    pub prop_kind: fn(&str) -> Option<PropKind>,
    pub bounding_box: fn(&Props) -> BoundingBox,
    pub contains: fn(&Props, Point) -> bool,
    pub draw_path: fn(&Props, &mut dyn RenderTarget),
    /// Geometry properties for export; style properties are added by the exporter.
    pub lottie_properties: &'static [LottieProperty],
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Ellipse,
        ShapeKind::Rectangle,
        ShapeKind::Bezier,
        ShapeKind::Group,
        ShapeKind::Layer,
    ];

    /// Registry name, as used in `shape.add` payloads.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Bezier => "bezier",
            ShapeKind::Group => "group",
            ShapeKind::Layer => "layer",
        }
    }

    /// Look a kind up by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Groups and layers hold children and a transform.
    pub fn is_container(self) -> bool {
        matches!(self, ShapeKind::Group | ShapeKind::Layer)
    }

    pub fn primitive(self) -> Option<&'static ShapeVTable> {
        match self {
            ShapeKind::Ellipse => Some(&ellipse::VTABLE),
            ShapeKind::Rectangle => Some(&rectangle::VTABLE),
            ShapeKind::Bezier => Some(&path::VTABLE),
            ShapeKind::Group | ShapeKind::Layer => None,
        }
    }

    pub fn default_props(self) -> Props {
        match self.primitive() {
            Some(vtable) => (vtable.default_props)(),
            None => group::default_props(),
        }
    }

    pub fn prop_kind(self, key: &str) -> Option<PropKind> {
        match self.primitive() {
            Some(vtable) => (vtable.prop_kind)(key),
            None => group::prop_kind(key),
        }
    }

    /// Coerce known keys to their expected type; values that can't be
    /// coerced are dropped. Unknown keys pass through.
    pub fn filter_props(self, props: &mut Props) {
        props.retain(|key, value| {
            let Some(kind) = self.prop_kind(key) else {
                return true;
            };
            match coerce(value.clone(), kind) {
                Some(coerced) => {
                    *value = coerced;
                    true
                }
                None => {
                    log::warn!("Dropping {} property {key}: {value:?}", self.name());
                    false
                }
            }
        });
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownShapeKind(s.to_string()))
    }
}

fn coerce(value: PropValue, kind: PropKind) -> Option<PropValue> {
    match (kind, value) {
        (PropKind::Number, v @ PropValue::Number(_)) => Some(v),
        (PropKind::Color, PropValue::Text(s)) if s.parse::<HexColor>().is_ok() => {
            Some(PropValue::Text(s))
        }
        (PropKind::Point, v @ PropValue::Point(_)) => Some(v),
        // uniform scale
        (PropKind::Point, PropValue::Number(n)) => Some(PropValue::Point(Point::new(n, n))),
        (PropKind::Bezier, v @ PropValue::Bezier(_)) => Some(v),
        _ => None,
    }
}

/// Default fill, stroke and stroke width.
fn style_defaults() -> Props {
    crate::props! {
        "fill" => "#000000",
        "stroke" => "#000000",
        "stroke_width" => 4.0,
    }
}

fn style_prop_kind(key: &str) -> Option<PropKind> {
    match key {
        "fill" | "stroke" => Some(PropKind::Color),
        "stroke_width" => Some(PropKind::Number),
        _ => None,
    }
}

fn number(props: &Props, key: &str) -> f64 {
    props.number(key).unwrap_or(0.0)
}

/// A node of the scene graph.
///
/// Parent and children are ids into the scene's object table; the table is
/// the only owner.
#[derive(Debug, Clone)]
pub struct EditorObject {
    pub(crate) id: ObjectId,
    kind: ShapeKind,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    /// Slot in the parent's child list while soft-removed.
    pub(crate) detached_at: Option<usize>,
    props: Props,
    timeline: Timeline,
    frame: f64,
    matrix: Matrix,
    inverse: Option<Matrix>,
    bbox_cache: OnceCell<BoundingBox>,
}

impl EditorObject {
    /// Create an object with the variant's default properties.
    pub fn new(id: impl Into<ObjectId>, kind: ShapeKind) -> Self {
        let mut object = Self {
            id: id.into(),
            kind,
            parent: None,
            children: Vec::new(),
            detached_at: None,
            props: kind.default_props(),
            timeline: Timeline::new(),
            frame: 0.0,
            matrix: Matrix::IDENTITY,
            inverse: Some(Matrix::IDENTITY),
            bbox_cache: OnceCell::new(),
        };
        object.on_props_updated();
        object
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn is_removed(&self) -> bool {
        self.detached_at.is_some()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Local-to-parent transform; identity for primitives.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Parent-to-local transform, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<&Matrix> {
        self.inverse.as_ref()
    }

    pub fn number(&self, key: &str) -> f64 {
        number(&self.props, key)
    }

    pub fn point(&self, key: &str) -> Point {
        self.props.point(key).unwrap_or_default()
    }

    /// Merge `props` into the live properties after per-variant coercion.
    pub fn assign_props(&mut self, props: &Props) {
        let mut incoming = props.clone();
        self.kind.filter_props(&mut incoming);
        self.props.extend(incoming);
        self.on_props_updated();
    }

    fn on_props_updated(&mut self) {
        self.bbox_cache = OnceCell::new();
        if self.kind.is_container() {
            self.matrix = group_matrix(&self.props);
            self.inverse = self.matrix.inverse();
        }
    }

    /// Store a keyframe; returns what it replaced.
    pub fn add_keyframe(&mut self, time: f64, props: &Props) -> Option<Props> {
        let mut copy = props.clone();
        self.kind.filter_props(&mut copy);
        self.timeline.add_keyframe(time, copy)
    }

    pub fn remove_keyframe(&mut self, time: f64) -> Option<Props> {
        self.timeline.remove_keyframe(time)
    }

    /// Move to `frame`, pulling interpolated values from the timeline.
    ///
    /// Objects without keyframes keep their live properties.
    pub fn apply_frame(&mut self, frame: f64) {
        self.frame = frame;
        if let Some(props) = self.timeline.props_at(frame) {
            self.assign_props(&props);
        }
    }

    /// Box in the object's own coordinates. Containers report empty here;
    /// their extent depends on children and is computed by the scene.
    pub fn local_bounding_box(&self, include_stroke: bool) -> BoundingBox {
        let Some(vtable) = self.kind.primitive() else {
            return BoundingBox::EMPTY;
        };
        let mut bbox = *self
            .bbox_cache
            .get_or_init(|| (vtable.bounding_box)(&self.props));
        if include_stroke && self.stroke_visible() {
            bbox.expand(self.number("stroke_width") / 2.0);
        }
        bbox
    }

    /// Hit-test a primitive. Containers answer through the scene.
    pub fn contains_local(&self, pos: Point) -> bool {
        self.kind
            .primitive()
            .is_some_and(|vtable| (vtable.contains)(&self.props, pos))
    }

    /// Map a point from parent space into this object's space.
    pub fn parent_to_local(&self, pos: Point) -> Option<Point> {
        self.inverse.as_ref().map(|m| m.map(pos))
    }

    pub fn stroke_visible(&self) -> bool {
        self.props
            .text("stroke")
            .is_some_and(crate::color::is_visible)
    }

    /// Fill/stroke/width of a primitive.
    pub fn style(&self) -> Option<Props> {
        self.kind.primitive()?;
        Some(self.props.subset(STYLE_KEYS))
    }

    /// Paint a primitive: even-odd fill, then stroke when it has width.
    pub fn paint_shape(&self, target: &mut dyn RenderTarget) {
        let Some(vtable) = self.kind.primitive() else {
            return;
        };
        let stroke_width = self.number("stroke_width");
        target.set_fill_color(self.props.color("fill").into());
        target.set_stroke_color(self.props.color("stroke").into());
        target.set_line_width(stroke_width);
        target.begin_path();
        (vtable.draw_path)(&self.props, target);
        target.fill_even_odd();
        if stroke_width > 0.0 {
            target.stroke();
        }
    }
}
