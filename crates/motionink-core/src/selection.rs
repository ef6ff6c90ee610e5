//! Drag handles placed on the selected object.
//!
//! Handle positions are read from the object's live properties; dragging a
//! handle turns the constrained pointer position into a property edit.

use crate::geometry::{BezierSegment, Point};
use crate::props::{Props, PropsExt};
use crate::scene::Scene;
use crate::shapes::{EditorObject, ShapeKind};

/// Default handle hit radius.
pub const HANDLE_RADIUS: f64 = 8.0;

/// Which side of the center a radius handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }
}

/// Type of drag handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    RectLeft,
    RectTop,
    RectRight,
    RectBottom,
    RectCenter,
    EllipseCenter,
    EllipseRadiusX(Direction),
    EllipseRadiusY(Direction),
    /// A curve vertex: the start of segment `first` and/or the end of
    /// segment `last`.
    BezierPoint {
        first: Option<usize>,
        last: Option<usize>,
    },
    /// Control point `tangent` (1 or 2) of `segment`.
    BezierTangent { segment: usize, tangent: usize },
    BezierCenter,
    GroupPosition,
    GroupAnchor,
    GroupRotation,
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    #[default]
    Circle,
    Diamond,
}

impl HandleKind {
    /// Axes the handle cannot leave, as `(lock_x, lock_y)`.
    fn locks(self) -> (bool, bool) {
        match self {
            HandleKind::RectTop | HandleKind::RectBottom | HandleKind::EllipseRadiusY(_) => {
                (true, false)
            }
            HandleKind::RectLeft | HandleKind::RectRight | HandleKind::EllipseRadiusX(_) => {
                (false, true)
            }
            _ => (false, false),
        }
    }

    pub fn shape(self) -> HandleShape {
        match self {
            HandleKind::BezierTangent { .. } => HandleShape::Diamond,
            _ => HandleShape::Circle,
        }
    }

    /// Handles that move the whole object.
    pub fn moves_object(self) -> bool {
        matches!(
            self,
            HandleKind::RectCenter
                | HandleKind::EllipseCenter
                | HandleKind::BezierCenter
                | HandleKind::GroupPosition
        )
    }
}

/// A drag handle with its position in the object's parent space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            position: Point::ORIGIN,
        }
    }

    /// Check if `point` is within `radius` of the handle.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        self.position.distance(point) <= radius
    }

    /// Move the handle to where `object` currently places it.
    pub fn refresh(&mut self, scene: &Scene, object: &EditorObject) {
        if let Some(position) = handle_position(self.kind, scene, object) {
            self.position = position;
        }
    }

    /// Clamp a pointer position to the handle's free axis.
    pub fn constrain(&self, pos: Point) -> Point {
        match self.kind.locks() {
            (true, _) => Point::new(self.position.x, pos.y),
            (false, true) => Point::new(pos.x, self.position.y),
            (false, false) => pos,
        }
    }

    /// Property edit produced by moving the handle to `pos`.
    ///
    /// `None` means the move is impossible (an edge dragged past the
    /// opposite one) and nothing should be edited.
    pub fn drag_props(&self, scene: &Scene, object: &EditorObject, pos: Point) -> Option<Props> {
        let Point { x, y } = pos;
        let props = object.props();
        let left = object.number("left");
        let top = object.number("top");
        let width = object.number("width");
        let height = object.number("height");

        match self.kind {
            HandleKind::RectTop => {
                (y <= top + height).then(|| crate::props! {"top" => y, "height" => height - (y - top)})
            }
            HandleKind::RectLeft => {
                (x <= left + width).then(|| crate::props! {"left" => x, "width" => width - (x - left)})
            }
            HandleKind::RectRight => (x >= left).then(|| crate::props! {"width" => x - left}),
            HandleKind::RectBottom => (y >= top).then(|| crate::props! {"height" => y - top}),
            HandleKind::RectCenter => Some(crate::props! {
                "left" => x - width / 2.0,
                "top" => y - height / 2.0,
            }),
            HandleKind::EllipseCenter => Some(crate::props! {"cx" => x, "cy" => y}),
            HandleKind::EllipseRadiusX(_) => {
                Some(crate::props! {"rx" => (x - object.number("cx")).abs()})
            }
            HandleKind::EllipseRadiusY(_) => {
                Some(crate::props! {"ry" => (y - object.number("cy")).abs()})
            }
            HandleKind::BezierPoint { first, last } => {
                let mut curve = props.bezier("bezier")?.clone();
                let delta = pos - self.position;
                if let Some(index) = first {
                    let [_, k1, k2, k3] = *curve.segment(index)?.points();
                    curve.replace_segment(index, BezierSegment::new(pos, k1 + delta, k2, k3));
                }
                if let Some(index) = last {
                    let [k0, k1, k2, _] = *curve.segment(index)?.points();
                    curve.replace_segment(index, BezierSegment::new(k0, k1, k2 + delta, pos));
                }
                Some(crate::props! {"bezier" => curve})
            }
            HandleKind::BezierTangent { segment, tangent } => {
                let mut curve = props.bezier("bezier")?.clone();
                let mut points = *curve.segment(segment)?.points();
                *points.get_mut(tangent)? = pos;
                curve.replace_segment(segment, BezierSegment::from_array(points));
                Some(crate::props! {"bezier" => curve})
            }
            HandleKind::BezierCenter => {
                let center = scene.bounding_box(object.id(), false)?.center();
                let curve = props.bezier("bezier")?.dragged(pos - center);
                Some(crate::props! {"bezier" => curve})
            }
            HandleKind::GroupPosition => {
                let delta = pos - self.position;
                Some(crate::props! {"position" => object.point("position") + delta})
            }
            HandleKind::GroupAnchor => {
                let delta = pos - self.position;
                Some(crate::props! {
                    "position" => object.point("position") + delta,
                    "anchor" => object.point("anchor") + delta,
                })
            }
            HandleKind::GroupRotation => {
                let center = object.point("position");
                let before = (self.position - center).angle();
                let after = (pos - center).angle();
                Some(crate::props! {"rotation" => object.number("rotation") + after - before})
            }
        }
    }
}

fn handle_position(kind: HandleKind, scene: &Scene, object: &EditorObject) -> Option<Point> {
    let left = object.number("left");
    let top = object.number("top");
    let width = object.number("width");
    let height = object.number("height");
    let cx = object.number("cx");
    let cy = object.number("cy");

    let position = match kind {
        HandleKind::RectLeft => Point::new(left, top + height / 2.0),
        HandleKind::RectTop => Point::new(left + width / 2.0, top),
        HandleKind::RectRight => Point::new(left + width, top + height / 2.0),
        HandleKind::RectBottom => Point::new(left + width / 2.0, top + height),
        HandleKind::RectCenter => Point::new(left + width / 2.0, top + height / 2.0),
        HandleKind::EllipseCenter => Point::new(cx, cy),
        HandleKind::EllipseRadiusX(dir) => Point::new(cx + dir.sign() * object.number("rx"), cy),
        HandleKind::EllipseRadiusY(dir) => Point::new(cx, cy + dir.sign() * object.number("ry")),
        HandleKind::BezierPoint { first, last } => {
            let curve = object.props().bezier("bezier")?;
            match (first, last) {
                (Some(index), _) => curve.segment(index)?.start(),
                (None, Some(index)) => curve.segment(index)?.end(),
                (None, None) => return None,
            }
        }
        HandleKind::BezierTangent { segment, tangent } => {
            let curve = object.props().bezier("bezier")?;
            *curve.segment(segment)?.points().get(tangent)?
        }
        HandleKind::BezierCenter | HandleKind::GroupPosition => {
            scene.bounding_box(object.id(), false)?.center()
        }
        HandleKind::GroupAnchor => object.point("position"),
        HandleKind::GroupRotation => {
            let [top_left, top_right, ..] = scene.bounding_box(object.id(), false)?.corners();
            (top_left + top_right) / 2.0
        }
    };
    Some(position)
}

/// Get the drag handles for an object, positioned.
///
/// Later handles sit on top of earlier ones; hit-testing walks the list
/// backwards.
pub fn get_handles(scene: &Scene, object: &EditorObject) -> Vec<Handle> {
    let kinds: Vec<HandleKind> = match object.kind() {
        ShapeKind::Rectangle => vec![
            HandleKind::RectLeft,
            HandleKind::RectTop,
            HandleKind::RectRight,
            HandleKind::RectBottom,
            HandleKind::RectCenter,
        ],
        ShapeKind::Ellipse => vec![
            HandleKind::EllipseCenter,
            HandleKind::EllipseRadiusX(Direction::Positive),
            HandleKind::EllipseRadiusX(Direction::Negative),
            HandleKind::EllipseRadiusY(Direction::Positive),
            HandleKind::EllipseRadiusY(Direction::Negative),
        ],
        ShapeKind::Bezier => bezier_handles(object),
        ShapeKind::Group => vec![
            HandleKind::GroupPosition,
            HandleKind::GroupRotation,
            HandleKind::GroupAnchor,
        ],
        ShapeKind::Layer => Vec::new(),
    };

    kinds
        .into_iter()
        .map(|kind| {
            let mut handle = Handle::new(kind);
            handle.refresh(scene, object);
            handle
        })
        .collect()
}

/// Tangents below vertices, then the center handle on top.
fn bezier_handles(object: &EditorObject) -> Vec<HandleKind> {
    let Some(curve) = object.props().bezier("bezier").filter(|c| !c.is_empty()) else {
        return vec![HandleKind::BezierCenter];
    };
    let count = curve.len();
    let closed = curve.is_closed();

    let mut tangents = Vec::with_capacity(count * 2);
    let mut points = Vec::with_capacity(count + 1);
    let mut prev = closed.then(|| count - 1);
    for i in 0..count {
        tangents.push(HandleKind::BezierTangent {
            segment: i,
            tangent: 1,
        });
        tangents.push(HandleKind::BezierTangent {
            segment: i,
            tangent: 2,
        });
        points.push(HandleKind::BezierPoint {
            first: Some(i),
            last: prev,
        });
        prev = Some(i);
    }
    if !closed {
        points.push(HandleKind::BezierPoint {
            first: None,
            last: Some(count - 1),
        });
    }

    tangents.extend(points);
    tangents.push(HandleKind::BezierCenter);
    tangents
}

/// Topmost handle hit at `point`, as an index into `handles`.
pub fn hit_test_handles(handles: &[Handle], point: Point, radius: f64) -> Option<usize> {
    handles.iter().rposition(|handle| handle.hit_test(point, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bezier;
    use crate::props;
    use pretty_assertions::assert_eq;

    fn scene_with(kind: ShapeKind, props: Props) -> (Scene, String) {
        let mut scene = Scene::new();
        let id = scene.create_object(kind, None, &props).unwrap();
        (scene, id)
    }

    fn handle_at(scene: &Scene, id: &str, kind: HandleKind) -> Handle {
        let object = scene.object(id).unwrap();
        get_handles(scene, object)
            .into_iter()
            .find(|h| h.kind == kind)
            .unwrap()
    }

    #[test]
    fn test_rectangle_handles() {
        let (scene, id) = scene_with(
            ShapeKind::Rectangle,
            props! {"left" => 10.0, "top" => 20.0, "width" => 100.0, "height" => 40.0},
        );
        let handles = get_handles(&scene, scene.object(&id).unwrap());
        let positions: Vec<Point> = handles.iter().map(|h| h.position).collect();
        assert_eq!(
            positions,
            vec![
                Point::new(10.0, 40.0),
                Point::new(60.0, 20.0),
                Point::new(110.0, 40.0),
                Point::new(60.0, 60.0),
                Point::new(60.0, 40.0),
            ]
        );
        assert!(handles[4].kind.moves_object());
    }

    #[test]
    fn test_rectangle_edge_drag() {
        let (scene, id) = scene_with(
            ShapeKind::Rectangle,
            props! {"left" => 10.0, "top" => 20.0, "width" => 100.0, "height" => 40.0},
        );
        let object = scene.object(&id).unwrap();
        let top = handle_at(&scene, &id, HandleKind::RectTop);

        let pos = top.constrain(Point::new(999.0, 30.0));
        assert_eq!(pos, Point::new(60.0, 30.0));
        assert_eq!(
            top.drag_props(&scene, object, pos),
            Some(props! {"top" => 30.0, "height" => 30.0})
        );
        // Past the bottom edge
        assert_eq!(top.drag_props(&scene, object, Point::new(60.0, 70.0)), None);

        let right = handle_at(&scene, &id, HandleKind::RectRight);
        assert_eq!(right.constrain(Point::new(150.0, 0.0)), Point::new(150.0, 40.0));
        assert_eq!(
            right.drag_props(&scene, object, Point::new(150.0, 40.0)),
            Some(props! {"width" => 140.0})
        );
        assert_eq!(right.drag_props(&scene, object, Point::new(5.0, 40.0)), None);
    }

    #[test]
    fn test_ellipse_radius_drag() {
        let (scene, id) = scene_with(
            ShapeKind::Ellipse,
            props! {"cx" => 50.0, "cy" => 50.0, "rx" => 20.0, "ry" => 10.0},
        );
        let object = scene.object(&id).unwrap();
        let left = handle_at(&scene, &id, HandleKind::EllipseRadiusX(Direction::Negative));
        assert_eq!(left.position, Point::new(30.0, 50.0));
        assert_eq!(
            left.drag_props(&scene, object, Point::new(15.0, 50.0)),
            Some(props! {"rx" => 35.0})
        );
        let bottom = handle_at(&scene, &id, HandleKind::EllipseRadiusY(Direction::Positive));
        assert_eq!(bottom.position, Point::new(50.0, 60.0));
    }

    #[test]
    fn test_bezier_handles_open_and_closed() {
        let mut open = Bezier::default();
        open.add_segment(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 0.0));
        open.add_segment(Point::new(10.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        let (scene, id) = scene_with(ShapeKind::Bezier, props! {"bezier" => open.clone()});
        let handles = get_handles(&scene, scene.object(&id).unwrap());
        // 4 tangents, 3 vertices, 1 center
        assert_eq!(handles.len(), 8);
        assert_eq!(
            handles[4].kind,
            HandleKind::BezierPoint {
                first: Some(0),
                last: None
            }
        );
        assert_eq!(
            handles[6].kind,
            HandleKind::BezierPoint {
                first: None,
                last: Some(1)
            }
        );
        assert_eq!(handles[6].position, Point::new(10.0, 10.0));

        let mut closed = open;
        closed.close();
        let (scene, id) = scene_with(ShapeKind::Bezier, props! {"bezier" => closed});
        let handles = get_handles(&scene, scene.object(&id).unwrap());
        // 6 tangents, 3 shared vertices, 1 center
        assert_eq!(handles.len(), 10);
        assert_eq!(
            handles[6].kind,
            HandleKind::BezierPoint {
                first: Some(0),
                last: Some(2)
            }
        );
    }

    #[test]
    fn test_bezier_point_drag_moves_tangents() {
        let mut curve = Bezier::default();
        curve.add_segment(Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0));
        curve.add_segment(Point::new(15.0, -5.0), Point::new(20.0, 5.0), Point::new(20.0, 0.0));
        let (scene, id) = scene_with(ShapeKind::Bezier, props! {"bezier" => curve});
        let object = scene.object(&id).unwrap();
        let joint = handle_at(
            &scene,
            &id,
            HandleKind::BezierPoint {
                first: Some(1),
                last: Some(0),
            },
        );
        assert_eq!(joint.position, Point::new(10.0, 0.0));

        let edit = joint
            .drag_props(&scene, object, Point::new(10.0, 3.0))
            .unwrap();
        let moved = edit.bezier("bezier").unwrap();
        assert_eq!(
            moved.segment(0).unwrap().points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(0.0, 0.0),
                Point::new(5.0, 8.0),
                Point::new(10.0, 3.0)
            ]
        );
        assert_eq!(
            moved.segment(1).unwrap().points(),
            &[
                Point::new(10.0, 3.0),
                Point::new(15.0, -2.0),
                Point::new(20.0, 5.0),
                Point::new(20.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_group_anchor_and_rotation() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &props! {"position" => Point::new(50.0, 50.0)})
            .unwrap();
        let object = scene.object(&group).unwrap();

        let anchor = handle_at(&scene, &group, HandleKind::GroupAnchor);
        assert_eq!(anchor.position, Point::new(50.0, 50.0));
        assert_eq!(
            anchor.drag_props(&scene, object, Point::new(60.0, 45.0)),
            Some(props! {
                "position" => Point::new(60.0, 45.0),
                "anchor" => Point::new(10.0, -5.0),
            })
        );

        let mut rotation = Handle::new(HandleKind::GroupRotation);
        rotation.position = Point::new(50.0, 0.0);
        let edit = rotation
            .drag_props(&scene, object, Point::new(100.0, 50.0))
            .unwrap();
        let angle = edit.number("rotation").unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let handles = vec![
            Handle {
                kind: HandleKind::RectLeft,
                position: Point::new(0.0, 0.0),
            },
            Handle {
                kind: HandleKind::RectCenter,
                position: Point::new(4.0, 0.0),
            },
        ];
        assert_eq!(hit_test_handles(&handles, Point::new(2.0, 0.0), HANDLE_RADIUS), Some(1));
        assert_eq!(hit_test_handles(&handles, Point::new(-7.0, 0.0), HANDLE_RADIUS), Some(0));
        assert_eq!(hit_test_handles(&handles, Point::new(50.0, 0.0), HANDLE_RADIUS), None);
    }
}
