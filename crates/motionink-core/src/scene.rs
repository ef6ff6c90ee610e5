//! The scene graph: an object table rooted at a layer.
//!
//! The table owns every object, including soft-removed ones that an undo may
//! bring back. Parent/child links are ids into the table. Only the command
//! stack mutates the scene; tools read it for hit-testing.

use crate::geometry::{BoundingBox, Bounds, Point};
use crate::ids::IdGenerator;
use crate::paint::RenderTarget;
use crate::props::Props;
use crate::shapes::{EditorObject, ObjectId, ShapeKind};
use std::collections::HashMap;
use thiserror::Error;

/// Id of the root layer.
pub const ROOT_ID: &str = "root";

/// Errors raised while mutating the scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    #[error("Object {0} cannot hold children")]
    NotAContainer(ObjectId),

    #[error("Moving {child} under {parent} would create a cycle")]
    WouldCycle { child: ObjectId, parent: ObjectId },

    #[error("The root layer cannot be removed or reparented")]
    RootLayer,
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// All objects of one document.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Every object ever created in this session, keyed by id.
    objects: HashMap<ObjectId, EditorObject>,
    /// Layer that receives newly added shapes.
    current_layer: ObjectId,
    /// Frame the scene was last evaluated at.
    frame: f64,
    /// Set once the initial sync has completed.
    loaded: bool,
    ids: IdGenerator,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene holding only the root layer.
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::default())
    }

    pub fn with_ids(ids: IdGenerator) -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            ROOT_ID.to_string(),
            EditorObject::new(ROOT_ID, ShapeKind::Layer),
        );
        Self {
            objects,
            current_layer: ROOT_ID.to_string(),
            frame: 0.0,
            loaded: false,
            ids,
        }
    }

    pub fn object(&self, id: &str) -> Option<&EditorObject> {
        self.objects.get(id)
    }

    /// Like [`Scene::object`], as an error for callers that need the object.
    pub fn get(&self, id: &str) -> SceneResult<&EditorObject> {
        self.objects
            .get(id)
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> SceneResult<&mut EditorObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))
    }

    /// Whether `id` exists and is not soft-removed.
    pub fn is_alive(&self, id: &str) -> bool {
        self.objects.get(id).is_some_and(|obj| !obj.is_removed())
    }

    /// Children of a container, in insertion order. Empty for unknown ids.
    pub fn children(&self, id: &str) -> &[ObjectId] {
        self.objects
            .get(id)
            .map(EditorObject::children)
            .unwrap_or_default()
    }

    /// Number of objects in the table, removed ones included.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() <= 1
    }

    pub fn current_layer(&self) -> &str {
        &self.current_layer
    }

    pub fn set_current_layer(&mut self, id: &str) -> SceneResult<()> {
        if self.get(id)?.kind() != ShapeKind::Layer {
            return Err(SceneError::NotAContainer(id.to_string()));
        }
        self.current_layer = id.to_string();
        Ok(())
    }

    pub fn frame(&self) -> f64 {
        self.frame
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Restart id allocation for a new session.
    pub fn restart_ids(&mut self, prefix: impl Into<String>) {
        self.ids.restart(prefix);
    }

    /// Allocate an id not present in the table.
    pub fn next_id(&mut self) -> ObjectId {
        let objects = &self.objects;
        self.ids.next_id(|candidate| objects.contains_key(candidate))
    }

    /// Create an object in the current layer and return its id.
    ///
    /// Without an id one is allocated. An id that is already alive is
    /// returned untouched; a soft-removed one is re-inserted.
    pub fn create_object(
        &mut self,
        kind: ShapeKind,
        id: Option<&str>,
        props: &Props,
    ) -> SceneResult<ObjectId> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.next_id(),
        };
        if let Some(existing) = self.objects.get(&id) {
            if existing.is_removed() {
                self.insert_object(&id)?;
            } else {
                log::debug!("Object {id} already exists");
            }
            return Ok(id);
        }

        let parent = self.current_layer.clone();
        let mut object = EditorObject::new(id.clone(), kind);
        object.assign_props(props);
        object.apply_frame(self.frame);
        object.parent = Some(parent.clone());
        self.get_mut(&parent)?.children.push(id.clone());
        self.objects.insert(id.clone(), object);
        log::debug!("Created {kind} {id}");
        Ok(id)
    }

    /// Detach an object from its parent, keeping it in the table.
    pub fn remove_object(&mut self, id: &str) -> SceneResult<()> {
        if id == ROOT_ID {
            return Err(SceneError::RootLayer);
        }
        let object = self.get(id)?;
        if object.is_removed() {
            return Ok(());
        }
        let slot = match object.parent.clone() {
            Some(parent) => {
                let siblings = &mut self.get_mut(&parent)?.children;
                let slot = siblings.iter().position(|c| c == id).unwrap_or(siblings.len());
                siblings.retain(|c| c != id);
                slot
            }
            None => 0,
        };
        self.get_mut(id)?.detached_at = Some(slot);
        log::debug!("Removed {id}");
        Ok(())
    }

    /// Put a soft-removed object back where it was.
    pub fn insert_object(&mut self, id: &str) -> SceneResult<()> {
        let object = self.get(id)?;
        let Some(slot) = object.detached_at else {
            return Ok(());
        };
        let parent = match object.parent.clone() {
            Some(parent) if self.is_alive(&parent) => parent,
            _ => self.current_layer.clone(),
        };
        let siblings = &mut self.get_mut(&parent)?.children;
        siblings.insert(slot.min(siblings.len()), id.to_string());
        let object = self.get_mut(id)?;
        object.detached_at = None;
        object.parent = Some(parent);
        log::debug!("Re-inserted {id}");
        Ok(())
    }

    /// Merge `props` into an object.
    pub fn update_object(&mut self, id: &str, props: &Props) -> SceneResult<()> {
        self.get_mut(id)?.assign_props(props);
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children; `None` means the root layer.
    pub fn set_parent(&mut self, child: &str, parent: Option<&str>) -> SceneResult<()> {
        if child == ROOT_ID {
            return Err(SceneError::RootLayer);
        }
        let parent = parent.unwrap_or(ROOT_ID).to_string();
        self.get(child)?;
        if !self.get(&parent)?.kind().is_container() {
            return Err(SceneError::NotAContainer(parent));
        }

        let mut ancestor = Some(parent.as_str());
        while let Some(current) = ancestor {
            if current == child {
                return Err(SceneError::WouldCycle {
                    child: child.to_string(),
                    parent,
                });
            }
            ancestor = self.object(current).and_then(EditorObject::parent);
        }

        let object = self.get(child)?;
        let removed = object.is_removed();
        if let Some(old) = object.parent.clone() {
            self.get_mut(&old)?.children.retain(|c| c != child);
        }
        let siblings = &mut self.get_mut(&parent)?.children;
        let slot = siblings.len();
        if !removed {
            siblings.push(child.to_string());
        }
        let object = self.get_mut(child)?;
        object.parent = Some(parent);
        if removed {
            object.detached_at = Some(slot);
        }
        Ok(())
    }

    /// Store a keyframe on an object, returning the props it overwrote.
    pub fn add_keyframe(&mut self, id: &str, time: f64, props: &Props) -> SceneResult<Option<Props>> {
        Ok(self.get_mut(id)?.add_keyframe(time, props))
    }

    pub fn remove_keyframe(&mut self, id: &str, time: f64) -> SceneResult<Option<Props>> {
        Ok(self.get_mut(id)?.remove_keyframe(time))
    }

    /// Evaluate every attached object at `frame`, parents before children.
    pub fn enter_frame(&mut self, frame: f64) {
        self.frame = frame;
        let mut pending = vec![ROOT_ID.to_string()];
        while let Some(id) = pending.pop() {
            if let Some(object) = self.objects.get_mut(&id) {
                object.apply_frame(frame);
                pending.extend(object.children.iter().rev().cloned());
            }
        }
    }

    /// Initial sync finished: evaluate the current frame and allow painting.
    pub fn mark_loaded(&mut self) {
        self.enter_frame(self.frame);
        self.loaded = true;
        log::info!("Document loaded with {} objects", self.objects.len() - 1);
    }

    /// Extent of an object in its parent's space.
    ///
    /// Containers report the union of their children seen through their own
    /// transform; a lone child under an identity transform is passed through.
    pub fn bounding_box(&self, id: &str, include_stroke: bool) -> Option<Bounds> {
        self.object(id)
            .map(|object| self.object_bounds(object, include_stroke))
    }

    fn object_bounds(&self, object: &EditorObject, include_stroke: bool) -> Bounds {
        if !object.kind().is_container() {
            return object.local_bounding_box(include_stroke).into();
        }
        let children: Vec<&EditorObject> = object
            .children()
            .iter()
            .filter_map(|id| self.object(id))
            .collect();
        match children.as_slice() {
            [] => BoundingBox::EMPTY.into(),
            [only] if object.matrix().is_identity() => self.object_bounds(only, include_stroke),
            _ => {
                let mut bbox = BoundingBox::EMPTY;
                for child in children {
                    bbox.include(&self.object_bounds(child, include_stroke));
                }
                if bbox.is_empty() {
                    return bbox.into();
                }
                bbox.transformed(object.matrix()).into()
            }
        }
    }

    /// Whether `pos`, in the parent's space, hits the object.
    pub fn contains(&self, id: &str, pos: Point) -> bool {
        let Some(object) = self.object(id) else {
            return false;
        };
        if object.kind().is_container() {
            self.child_at(id, pos).is_some()
        } else {
            object.contains_local(pos)
        }
    }

    /// First child, in insertion order, hit by `pos` given in the container's
    /// parent space. A singular transform hits nothing.
    pub fn child_at(&self, id: &str, pos: Point) -> Option<&str> {
        let object = self.object(id)?;
        let local = object.parent_to_local(pos)?;
        object
            .children()
            .iter()
            .find(|child| self.contains(child, local))
            .map(String::as_str)
    }

    /// Object picked by a click at `pos`: layers answer with the hit child,
    /// groups and shapes with themselves.
    pub fn object_at(&self, id: &str, pos: Point) -> Option<&str> {
        let object = self.object(id)?;
        match object.kind() {
            ShapeKind::Layer => self.child_at(id, pos),
            _ if self.contains(id, pos) => Some(object.id()),
            _ => None,
        }
    }

    /// Style of a shape, or of the first descendant shape of a group.
    pub fn style_of(&self, id: &str) -> Option<Props> {
        let object = self.object(id)?;
        if !object.kind().is_container() {
            return object.style();
        }
        object
            .children()
            .iter()
            .find_map(|child| self.style_of(child))
    }

    /// Paint the whole attached tree.
    pub fn paint(&self, target: &mut dyn RenderTarget) {
        self.paint_object(ROOT_ID, target);
    }

    /// Paint one object and its descendants.
    pub fn paint_object(&self, id: &str, target: &mut dyn RenderTarget) {
        let Some(object) = self.object(id) else {
            return;
        };
        if !object.kind().is_container() {
            object.paint_shape(target);
            return;
        }
        target.save();
        target.transform(object.matrix().to_canvas());
        for child in object.children() {
            self.paint_object(child, target);
        }
        target.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::props::PropsExt;
    use pretty_assertions::assert_eq;

    fn rect(scene: &mut Scene, left: f64, top: f64, size: f64) -> ObjectId {
        scene
            .create_object(
                ShapeKind::Rectangle,
                None,
                &props! { "left" => left, "top" => top, "width" => size, "height" => size },
            )
            .unwrap()
    }

    #[test]
    fn test_create_allocates_ids_in_current_layer() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0);
        assert_eq!((a.as_str(), b.as_str()), ("id-0", "id-1"));
        assert_eq!(scene.children(ROOT_ID), &[a.clone(), b]);
        assert_eq!(scene.get(&a).unwrap().parent(), Some(ROOT_ID));
    }

    #[test]
    fn test_create_existing_id_is_noop() {
        let mut scene = Scene::new();
        let id = rect(&mut scene, 0.0, 0.0, 10.0);
        let again = scene
            .create_object(ShapeKind::Ellipse, Some(id.as_str()), &props! { "left" => 99.0 })
            .unwrap();
        assert_eq!(again, id);
        assert_eq!(scene.get(&id).unwrap().kind(), ShapeKind::Rectangle);
        assert_eq!(scene.get(&id).unwrap().number("left"), 0.0);
        assert_eq!(scene.children(ROOT_ID).len(), 1);
    }

    #[test]
    fn test_remove_and_insert_keep_slot() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0);
        let c = rect(&mut scene, 40.0, 0.0, 10.0);

        scene.remove_object(&b).unwrap();
        assert!(!scene.is_alive(&b));
        assert!(scene.object(&b).is_some());
        assert_eq!(scene.children(ROOT_ID), &[a.clone(), c.clone()]);

        scene.insert_object(&b).unwrap();
        assert_eq!(scene.children(ROOT_ID), &[a, b.clone(), c]);

        // re-adding a removed id through create restores it too
        scene.remove_object(&b).unwrap();
        scene
            .create_object(ShapeKind::Rectangle, Some(b.as_str()), &Props::new())
            .unwrap();
        assert!(scene.is_alive(&b));
        assert_eq!(scene.remove_object(ROOT_ID), Err(SceneError::RootLayer));
    }

    #[test]
    fn test_set_parent_rules() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        let inner = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        let shape = rect(&mut scene, 0.0, 0.0, 10.0);

        scene.set_parent(&shape, Some(&group)).unwrap();
        assert_eq!(scene.children(&group), &[shape.clone()]);
        assert_eq!(scene.children(ROOT_ID), &[group.clone(), inner.clone()]);

        scene.set_parent(&inner, Some(&group)).unwrap();
        assert_eq!(
            scene.set_parent(&group, Some(&inner)),
            Err(SceneError::WouldCycle {
                child: group.clone(),
                parent: inner.clone()
            })
        );
        assert_eq!(
            scene.set_parent(&inner, Some(&shape)),
            Err(SceneError::NotAContainer(shape.clone()))
        );
        assert!(matches!(
            scene.set_parent("nope", None),
            Err(SceneError::UnknownObject(_))
        ));

        scene.set_parent(&shape, None).unwrap();
        assert_eq!(scene.get(&shape).unwrap().parent(), Some(ROOT_ID));
        assert_eq!(scene.children(&group), &[inner]);
    }

    #[test]
    fn test_group_transform_hit_test() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(
                ShapeKind::Group,
                None,
                &props! { "position" => Point::new(100.0, 0.0) },
            )
            .unwrap();
        let shape = rect(&mut scene, 0.0, 0.0, 10.0);
        scene.set_parent(&shape, Some(&group)).unwrap();

        assert!(scene.contains(&group, Point::new(105.0, 5.0)));
        assert!(!scene.contains(&group, Point::new(5.0, 5.0)));
        assert_eq!(scene.child_at(&group, Point::new(105.0, 5.0)), Some(shape.as_str()));
        // the layer answers with its direct child, the group with itself
        assert_eq!(scene.object_at(ROOT_ID, Point::new(105.0, 5.0)), Some(group.as_str()));
        assert_eq!(scene.object_at(&group, Point::new(105.0, 5.0)), Some(group.as_str()));

        scene
            .update_object(&group, &props! { "scale" => Point::new(0.0, 0.0) })
            .unwrap();
        assert!(!scene.contains(&group, Point::new(100.0, 0.0)));
    }

    #[test]
    fn test_first_child_in_insertion_order_wins() {
        let mut scene = Scene::new();
        let below = rect(&mut scene, 0.0, 0.0, 10.0);
        rect(&mut scene, 5.0, 5.0, 10.0);
        assert_eq!(scene.child_at(ROOT_ID, Point::new(7.0, 7.0)), Some(below.as_str()));
    }

    #[test]
    fn test_group_bounding_box() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        assert!(scene.bounding_box(&group, false).unwrap().is_empty());

        let a = rect(&mut scene, 0.0, 0.0, 10.0);
        scene.set_parent(&a, Some(&group)).unwrap();
        assert_eq!(
            scene.bounding_box(&group, false),
            Some(Bounds::Box(BoundingBox::new(0.0, 0.0, 10.0, 10.0)))
        );

        let b = rect(&mut scene, 20.0, 20.0, 10.0);
        scene.set_parent(&b, Some(&group)).unwrap();
        scene
            .update_object(&group, &props! { "position" => Point::new(5.0, 5.0) })
            .unwrap();
        let bounds = scene.bounding_box(&group, false).unwrap();
        assert!(matches!(bounds, Bounds::Polygon(_)));
        assert_eq!(bounds.to_aabb(), BoundingBox::new(5.0, 5.0, 30.0, 30.0));
        assert_eq!(scene.bounding_box("missing", false), None);
    }

    #[test]
    fn test_enter_frame_recurses() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        let shape = rect(&mut scene, 0.0, 0.0, 10.0);
        scene.set_parent(&shape, Some(&group)).unwrap();
        scene
            .add_keyframe(&shape, 0.0, &props! { "left" => 0.0 })
            .unwrap();
        scene
            .add_keyframe(&shape, 10.0, &props! { "left" => 20.0 })
            .unwrap();
        scene
            .add_keyframe(&group, 10.0, &props! { "rotation" => 1.0 })
            .unwrap();

        scene.enter_frame(5.0);
        assert_eq!(scene.frame(), 5.0);
        assert_eq!(scene.get(&shape).unwrap().number("left"), 10.0);
        assert_eq!(scene.get(&group).unwrap().number("rotation"), 1.0);
        assert_eq!(scene.get(&shape).unwrap().frame(), 5.0);
    }

    #[test]
    fn test_mark_loaded_evaluates_frame() {
        let mut scene = Scene::new();
        let shape = rect(&mut scene, 0.0, 0.0, 10.0);
        scene
            .add_keyframe(&shape, 0.0, &props! { "width" => 3.0 })
            .unwrap();
        assert!(!scene.is_loaded());
        scene.mark_loaded();
        assert!(scene.is_loaded());
        assert_eq!(scene.get(&shape).unwrap().number("width"), 3.0);
    }

    #[test]
    fn test_style_of_group_uses_first_shape() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        assert_eq!(scene.style_of(&group), None);
        let shape = scene
            .create_object(ShapeKind::Ellipse, None, &props! { "fill" => "#ff0000" })
            .unwrap();
        scene.set_parent(&shape, Some(&group)).unwrap();
        let style = scene.style_of(&group).unwrap();
        assert_eq!(style.text("fill"), Some("#ff0000"));
        assert_eq!(style.number("stroke_width"), Some(4.0));
    }
}
