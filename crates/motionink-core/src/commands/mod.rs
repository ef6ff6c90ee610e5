//! Reversible edits and their wire encoding.
//!
//! Every command knows how to apply itself to a [`Scene`], how to revert that
//! effect, and which `document.edit` message announces each direction.

mod stack;

pub use stack::CommandStack;

use crate::props::{Props, PropsExt};
use crate::scene::{Scene, SceneError};
use crate::shapes::{ObjectId, ShapeKind};
use crate::sync::{ClientMessage, ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Registered command kinds, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    #[serde(rename = "shape.edit")]
    ShapeEdit,
    #[serde(rename = "shape.add")]
    ShapeAdd,
    #[serde(rename = "shape.delete")]
    ShapeDelete,
    #[serde(rename = "shape.parent")]
    ShapeParent,
    #[serde(rename = "keyframe.add")]
    KeyframeAdd,
    #[serde(rename = "keyframe.delete")]
    KeyframeDelete,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::ShapeEdit,
        CommandKind::ShapeAdd,
        CommandKind::ShapeDelete,
        CommandKind::ShapeParent,
        CommandKind::KeyframeAdd,
        CommandKind::KeyframeDelete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::ShapeEdit => "shape.edit",
            CommandKind::ShapeAdd => "shape.add",
            CommandKind::ShapeDelete => "shape.delete",
            CommandKind::ShapeParent => "shape.parent",
            CommandKind::KeyframeAdd => "keyframe.add",
            CommandKind::KeyframeDelete => "keyframe.delete",
        }
    }

    /// Look up a kind by wire name.
    pub fn from_name(name: &str) -> ProtocolResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while applying or reverting a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("shape.add needs a shape kind or the id of a removed shape")]
    MissingShape,
}

/// Result type for command application.
pub type CommandResult<T> = Result<T, CommandError>;

/// A reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Property change on one or more objects.
    ShapeEdit {
        ids: Vec<ObjectId>,
        /// Values before the edit, read from the first object.
        before: Props,
        after: Props,
    },
    /// New object in the current layer. `id` is filled in on first apply.
    /// Without a kind, `id` names a removed object to bring back.
    ShapeAdd {
        shape: Option<ShapeKind>,
        props: Props,
        id: Option<ObjectId>,
    },
    /// Soft removal.
    ShapeDelete { id: ObjectId },
    /// Reparent; `None` parent is the root layer.
    ShapeParent {
        child: ObjectId,
        /// Previous parent, captured on first apply.
        before: Option<Option<ObjectId>>,
        after: Option<ObjectId>,
    },
    KeyframeAdd {
        id: ObjectId,
        time: f64,
        props: Props,
        /// Keyframe overwritten by the last apply.
        replaced: Option<Props>,
    },
    KeyframeDelete {
        id: ObjectId,
        time: f64,
        /// Keyframe dropped by the last apply.
        removed: Option<Props>,
    },
}

#[derive(Debug, Deserialize)]
struct EditData {
    ids: Vec<ObjectId>,
    props: Props,
}

#[derive(Debug, Deserialize)]
struct AddData {
    #[serde(default)]
    shape: Option<ShapeKind>,
    #[serde(default)]
    props: Props,
    #[serde(default)]
    id: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
struct DeleteData {
    id: ObjectId,
}

#[derive(Debug, Deserialize)]
struct ParentData {
    child: ObjectId,
    #[serde(default)]
    parent: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
struct KeyframeData {
    id: ObjectId,
    time: f64,
    #[serde(default)]
    props: Props,
}

fn payload<T: DeserializeOwned>(kind: CommandKind, data: Value) -> ProtocolResult<T> {
    serde_json::from_value(data).map_err(|source| ProtocolError::MalformedPayload { kind, source })
}

/// Milliseconds since the Unix epoch, for last-writer-wins on the server.
fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn edit_message(kind: CommandKind, data: Value) -> ClientMessage {
    ClientMessage::Edit {
        command: kind,
        data,
    }
}

fn keyframe_message(id: &str, time: f64, props: Option<&Props>) -> ClientMessage {
    match props {
        Some(props) => edit_message(
            CommandKind::KeyframeAdd,
            json!({"id": id, "time": time, "props": props}),
        ),
        None => edit_message(CommandKind::KeyframeDelete, json!({"id": id, "time": time})),
    }
}

impl Command {
    /// Edit of `ids` from `before` to `after`.
    pub fn edit(ids: Vec<ObjectId>, before: Props, after: Props) -> Self {
        Command::ShapeEdit { ids, before, after }
    }

    /// New shape with an id allocated on apply.
    pub fn add(shape: ShapeKind, props: Props) -> Self {
        Command::ShapeAdd {
            shape: Some(shape),
            props,
            id: None,
        }
    }

    pub fn delete(id: impl Into<ObjectId>) -> Self {
        Command::ShapeDelete { id: id.into() }
    }

    pub fn reparent(child: impl Into<ObjectId>, parent: Option<ObjectId>) -> Self {
        Command::ShapeParent {
            child: child.into(),
            before: None,
            after: parent,
        }
    }

    pub fn add_keyframe(id: impl Into<ObjectId>, time: f64, props: Props) -> Self {
        Command::KeyframeAdd {
            id: id.into(),
            time,
            props,
            replaced: None,
        }
    }

    pub fn delete_keyframe(id: impl Into<ObjectId>, time: f64) -> Self {
        Command::KeyframeDelete {
            id: id.into(),
            time,
            removed: None,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ShapeEdit { .. } => CommandKind::ShapeEdit,
            Command::ShapeAdd { .. } => CommandKind::ShapeAdd,
            Command::ShapeDelete { .. } => CommandKind::ShapeDelete,
            Command::ShapeParent { .. } => CommandKind::ShapeParent,
            Command::KeyframeAdd { .. } => CommandKind::KeyframeAdd,
            Command::KeyframeDelete { .. } => CommandKind::KeyframeDelete,
        }
    }

    /// Id of the object created by an applied `ShapeAdd`.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Command::ShapeAdd { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Rebuild a command from a remote `document.edit` payload.
    ///
    /// Remote commands carry no reverse state; they are only ever applied.
    pub fn from_remote(kind: CommandKind, data: Value) -> ProtocolResult<Self> {
        Ok(match kind {
            CommandKind::ShapeEdit => {
                let data: EditData = payload(kind, data)?;
                Command::edit(data.ids, Props::new(), data.props)
            }
            CommandKind::ShapeAdd => {
                let data: AddData = payload(kind, data)?;
                Command::ShapeAdd {
                    shape: data.shape,
                    props: data.props,
                    id: data.id,
                }
            }
            CommandKind::ShapeDelete => {
                let data: DeleteData = payload(kind, data)?;
                Command::delete(data.id)
            }
            CommandKind::ShapeParent => {
                let data: ParentData = payload(kind, data)?;
                Command::reparent(data.child, data.parent)
            }
            CommandKind::KeyframeAdd => {
                let data: KeyframeData = payload(kind, data)?;
                Command::add_keyframe(data.id, data.time, data.props)
            }
            CommandKind::KeyframeDelete => {
                let data: KeyframeData = payload(kind, data)?;
                Command::delete_keyframe(data.id, data.time)
            }
        })
    }

    /// Apply the forward effect.
    pub fn redo(&mut self, scene: &mut Scene) -> CommandResult<()> {
        match self {
            Command::ShapeEdit { ids, after, .. } => {
                for id in ids.iter() {
                    scene.update_object(id, after)?;
                }
            }
            Command::ShapeAdd { shape, props, id } => {
                let kind = match (*shape, id.as_deref()) {
                    (Some(kind), _) => kind,
                    (None, Some(existing)) => scene.get(existing)?.kind(),
                    (None, None) => return Err(CommandError::MissingShape),
                };
                *id = Some(scene.create_object(kind, id.as_deref(), props)?);
            }
            Command::ShapeDelete { id } => scene.remove_object(id)?,
            Command::ShapeParent {
                child,
                before,
                after,
            } => {
                if before.is_none() {
                    let current = scene.get(child)?.parent();
                    *before = Some(current.map(str::to_string));
                }
                scene.set_parent(child, after.as_deref())?;
            }
            Command::KeyframeAdd {
                id,
                time,
                props,
                replaced,
            } => {
                *replaced = scene.add_keyframe(id, *time, props)?;
            }
            Command::KeyframeDelete { id, time, removed } => {
                *removed = scene.remove_keyframe(id, *time)?;
            }
        }
        Ok(())
    }

    /// Revert the forward effect.
    pub fn undo(&mut self, scene: &mut Scene) -> CommandResult<()> {
        match self {
            Command::ShapeEdit { ids, before, .. } => {
                for id in ids.iter() {
                    scene.update_object(id, before)?;
                }
            }
            Command::ShapeAdd { id, .. } => {
                if let Some(id) = id {
                    scene.remove_object(id)?;
                }
            }
            Command::ShapeDelete { id } => scene.insert_object(id)?,
            Command::ShapeParent { child, before, .. } => {
                if let Some(parent) = before {
                    scene.set_parent(child, parent.as_deref())?;
                }
            }
            Command::KeyframeAdd {
                id, time, replaced, ..
            } => match replaced.take() {
                Some(previous) => {
                    scene.add_keyframe(id, *time, &previous)?;
                }
                None => {
                    scene.remove_keyframe(id, *time)?;
                }
            },
            Command::KeyframeDelete { id, time, removed } => {
                if let Some(previous) = removed.take() {
                    scene.add_keyframe(id, *time, &previous)?;
                }
            }
        }
        Ok(())
    }

    /// Message announcing the forward effect.
    pub fn redo_message(&self) -> ClientMessage {
        match self {
            Command::ShapeEdit { ids, after, .. } => edit_message(
                CommandKind::ShapeEdit,
                json!({"ids": ids, "props": after, "timestamp": timestamp_ms()}),
            ),
            Command::ShapeAdd { shape, props, id } => {
                let mut data = Map::new();
                if let Some(shape) = shape {
                    data.insert("shape".into(), json!(shape));
                }
                if !props.is_empty() {
                    data.insert("props".into(), json!(props));
                }
                if let Some(id) = id {
                    data.insert("id".into(), json!(id));
                }
                edit_message(CommandKind::ShapeAdd, Value::Object(data))
            }
            Command::ShapeDelete { id } => {
                edit_message(CommandKind::ShapeDelete, json!({"id": id}))
            }
            Command::ShapeParent { child, after, .. } => edit_message(
                CommandKind::ShapeParent,
                json!({"child": child, "parent": after}),
            ),
            Command::KeyframeAdd { id, time, props, .. } => keyframe_message(id, *time, Some(props)),
            Command::KeyframeDelete { id, time, .. } => keyframe_message(id, *time, None),
        }
    }

    /// Message announcing the reverse effect.
    ///
    /// Adding and deleting are each other's reverse; keyframe commands restore
    /// whatever keyframe their last apply overwrote or dropped.
    pub fn undo_message(&self) -> ClientMessage {
        match self {
            Command::ShapeEdit { ids, before, .. } => edit_message(
                CommandKind::ShapeEdit,
                json!({"ids": ids, "props": before, "timestamp": timestamp_ms()}),
            ),
            Command::ShapeAdd { id, .. } => edit_message(
                CommandKind::ShapeDelete,
                json!({"id": id.as_deref().unwrap_or_default()}),
            ),
            Command::ShapeDelete { id } => edit_message(CommandKind::ShapeAdd, json!({"id": id})),
            Command::ShapeParent { child, before, .. } => edit_message(
                CommandKind::ShapeParent,
                json!({"child": child, "parent": before.clone().flatten()}),
            ),
            Command::KeyframeAdd {
                id, time, replaced, ..
            } => keyframe_message(id, *time, replaced.as_ref()),
            Command::KeyframeDelete { id, time, removed } => {
                keyframe_message(id, *time, removed.as_ref())
            }
        }
    }

    /// Fold a newer edit into this one.
    ///
    /// Only edits of the same ids and the same property keys merge; the newer
    /// `after` wins and this command's `before` is kept.
    pub fn merge(&mut self, other: &Command) -> bool {
        match (self, other) {
            (
                Command::ShapeEdit { ids, after, .. },
                Command::ShapeEdit {
                    ids: other_ids,
                    after: other_after,
                    ..
                },
            ) if ids == other_ids && after.same_keys(other_after) => {
                after.clone_from(other_after);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::scene::ROOT_ID;
    use pretty_assertions::assert_eq;

    fn message_data(msg: &ClientMessage) -> (&'static str, &Value) {
        let ClientMessage::Edit { command, data } = msg;
        (command.name(), data)
    }

    #[test]
    fn test_kind_registry() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()).unwrap(), kind);
        }
        assert!(matches!(
            CommandKind::from_name("shape.star"),
            Err(ProtocolError::UnknownCommand(name)) if name == "shape.star"
        ));
    }

    #[test]
    fn test_add_and_delete_are_duals() {
        let mut scene = Scene::new();
        let mut add = Command::add(ShapeKind::Ellipse, props! { "rx" => 5.0 });
        add.redo(&mut scene).unwrap();
        let id = add.created_id().unwrap().to_string();
        assert_eq!(id, "id-0");

        let msg = add.redo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!(kind, "shape.add");
        assert_eq!(data, &json!({"shape": "ellipse", "props": {"rx": 5.0}, "id": "id-0"}));
        let msg = add.undo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!((kind, data), ("shape.delete", &json!({"id": "id-0"})));

        // applying again reuses the allocated id
        add.undo(&mut scene).unwrap();
        assert!(!scene.is_alive(&id));
        add.redo(&mut scene).unwrap();
        assert!(scene.is_alive(&id));
        assert_eq!(scene.children(ROOT_ID).len(), 1);

        let delete = Command::delete(id.clone());
        let msg = delete.undo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!((kind, data), ("shape.add", &json!({"id": "id-0"})));
    }

    #[test]
    fn test_remote_readd_by_id() {
        let mut scene = Scene::new();
        let mut add = Command::add(ShapeKind::Rectangle, Props::new());
        add.redo(&mut scene).unwrap();
        Command::delete("id-0").redo(&mut scene).unwrap();

        let mut readd = Command::from_remote(CommandKind::ShapeAdd, json!({"id": "id-0"})).unwrap();
        readd.redo(&mut scene).unwrap();
        assert!(scene.is_alive("id-0"));

        let mut nothing = Command::from_remote(CommandKind::ShapeAdd, json!({})).unwrap();
        assert_eq!(nothing.redo(&mut scene), Err(CommandError::MissingShape));
    }

    #[test]
    fn test_edit_round_trip() {
        let mut scene = Scene::new();
        let id = scene
            .create_object(ShapeKind::Rectangle, None, &props! { "left" => 1.0 })
            .unwrap();
        let mut edit = Command::edit(
            vec![id.clone()],
            props! { "left" => 1.0 },
            props! { "left" => 7.0 },
        );
        edit.redo(&mut scene).unwrap();
        assert_eq!(scene.get(&id).unwrap().number("left"), 7.0);
        edit.undo(&mut scene).unwrap();
        assert_eq!(scene.get(&id).unwrap().number("left"), 1.0);

        let msg = edit.undo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!(kind, "shape.edit");
        assert_eq!(data["props"], json!({"left": 1.0}));
        assert!(data["timestamp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_merge_rules() {
        let mut a = Command::edit(vec!["id-0".into()], props! { "x" => 0.0 }, props! { "x" => 1.0 });
        let b = Command::edit(vec!["id-0".into()], props! { "x" => 1.0 }, props! { "x" => 2.0 });
        assert!(a.merge(&b));
        assert_eq!(
            a,
            Command::edit(vec!["id-0".into()], props! { "x" => 0.0 }, props! { "x" => 2.0 })
        );

        let other_keys = Command::edit(vec!["id-0".into()], Props::new(), props! { "y" => 2.0 });
        let other_ids = Command::edit(vec!["id-1".into()], Props::new(), props! { "x" => 2.0 });
        assert!(!a.merge(&other_keys));
        assert!(!a.merge(&other_ids));
        assert!(!a.merge(&Command::delete("id-0")));
        assert!(!Command::delete("id-0").merge(&Command::delete("id-0")));
    }

    #[test]
    fn test_parent_captures_previous_parent() {
        let mut scene = Scene::new();
        let group = scene
            .create_object(ShapeKind::Group, None, &Props::new())
            .unwrap();
        let shape = scene
            .create_object(ShapeKind::Ellipse, None, &Props::new())
            .unwrap();

        let mut cmd = Command::reparent(shape.clone(), Some(group.clone()));
        cmd.redo(&mut scene).unwrap();
        assert_eq!(scene.get(&shape).unwrap().parent(), Some(group.as_str()));

        let msg = cmd.redo_message();
        let (_, data) = message_data(&msg);
        assert_eq!(data, &json!({"child": shape, "parent": group}));
        let msg = cmd.undo_message();
        let (_, data) = message_data(&msg);
        assert_eq!(data, &json!({"child": shape, "parent": ROOT_ID}));

        cmd.undo(&mut scene).unwrap();
        assert_eq!(scene.get(&shape).unwrap().parent(), Some(ROOT_ID));
    }

    #[test]
    fn test_keyframe_add_restores_overwritten() {
        let mut scene = Scene::new();
        let id = scene
            .create_object(ShapeKind::Ellipse, None, &Props::new())
            .unwrap();
        scene.add_keyframe(&id, 5.0, &props! { "rx" => 1.0 }).unwrap();

        let mut cmd = Command::add_keyframe(id.clone(), 5.0, props! { "rx" => 9.0 });
        cmd.redo(&mut scene).unwrap();
        let msg = cmd.undo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!(kind, "keyframe.add");
        assert_eq!(data["props"], json!({"rx": 1.0}));

        cmd.undo(&mut scene).unwrap();
        let timeline = scene.get(&id).unwrap().timeline();
        assert_eq!(timeline.keyframe_at(5.0).unwrap().props.number("rx"), Some(1.0));

        let mut fresh = Command::add_keyframe(id.clone(), 8.0, props! { "rx" => 2.0 });
        fresh.redo(&mut scene).unwrap();
        let msg = fresh.undo_message();
        let (kind, data) = message_data(&msg);
        assert_eq!((kind, data), ("keyframe.delete", &json!({"id": id, "time": 8.0})));
        fresh.undo(&mut scene).unwrap();
        assert!(scene.get(&id).unwrap().timeline().keyframe_at(8.0).is_none());
    }

    #[test]
    fn test_keyframe_delete() {
        let mut scene = Scene::new();
        let id = scene
            .create_object(ShapeKind::Ellipse, None, &Props::new())
            .unwrap();
        scene.add_keyframe(&id, 2.0, &props! { "ry" => 3.0 }).unwrap();

        let mut cmd = Command::from_remote(
            CommandKind::KeyframeDelete,
            json!({"id": id, "time": 2.0}),
        )
        .unwrap();
        cmd.redo(&mut scene).unwrap();
        assert!(scene.get(&id).unwrap().timeline().is_empty());
        cmd.undo(&mut scene).unwrap();
        assert_eq!(scene.get(&id).unwrap().timeline().len(), 1);
    }

    #[test]
    fn test_malformed_remote_payload() {
        let err = Command::from_remote(CommandKind::ShapeDelete, json!({"nope": 1})).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedPayload {
                kind: CommandKind::ShapeDelete,
                ..
            }
        ));
    }
}
