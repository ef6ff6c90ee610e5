//! Editing session: scene, history, tools and the dispatch queue.
//!
//! Pointer gestures, tool switches, history navigation, frame changes and
//! server messages all arrive as [`Intent`]s. [`Editor::dispatch`] drains the
//! queue strictly in arrival order, finishing each intent (scene mutation and
//! queued outbound messages) before starting the next.

use crate::commands::{Command, CommandError, CommandStack};
use crate::config::EditorConfig;
use crate::geometry::Point;
use crate::ids::IdGenerator;
use crate::lottie;
use crate::paint::RenderTarget;
use crate::props::Props;
use crate::scene::Scene;
use crate::selection::Handle;
use crate::shapes::ObjectId;
use crate::sync::{ClientMessage, ProtocolError, ProtocolResult, ServerMessage};
use crate::tools::{ToolContext, ToolKind, ToolManager};
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised while handling an intent.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// One queued event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    DragStart(Point),
    DragMove(Point),
    DragEnd(Point),
    SwitchTool(ToolKind),
    Select(Option<ObjectId>),
    Undo,
    Redo,
    EnterFrame(f64),
    /// Keyframe the selected object's properties at the current frame.
    AddKeyframe,
    DeleteSelected,
    /// Move `child` under `parent`, or to the root layer.
    SetParent {
        child: ObjectId,
        parent: Option<ObjectId>,
    },
    /// Restyle the selection and make the style current.
    SetStyle(Props),
    Remote(ServerMessage),
}

/// An editing session.
pub struct Editor {
    scene: Scene,
    stack: CommandStack,
    tools: ToolManager,
    selection: Option<ObjectId>,
    /// Style for new shapes.
    style: Props,
    config: EditorConfig,
    queue: VecDeque<Intent>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let ids = match &config.id_prefix {
            Some(prefix) => IdGenerator::new(prefix.as_str()),
            None => IdGenerator::session(),
        };
        log::info!("Editor session started with id prefix {}", ids.prefix());
        Self {
            scene: Scene::with_ids(ids),
            stack: CommandStack::with_max_depth(config.max_undo_depth),
            tools: ToolManager::new(),
            selection: None,
            style: config.style.to_props(),
            config,
            queue: VecDeque::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn stack(&self) -> &CommandStack {
        &self.stack
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn current_style(&self) -> &Props {
        &self.style
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    /// Drag handles of the selection, when the select tool is active.
    pub fn handles(&self) -> &[Handle] {
        self.tools.handles()
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.is_loaded()
    }

    /// Queue an intent for the next [`Editor::dispatch`].
    pub fn enqueue(&mut self, intent: Intent) {
        self.queue.push_back(intent);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Handle every queued intent in order.
    ///
    /// A failing intent does not stop the queue; its error is logged and
    /// returned alongside the others.
    pub fn dispatch(&mut self) -> Vec<EditorError> {
        let mut errors = Vec::new();
        while let Some(intent) = self.queue.pop_front() {
            if let Err(err) = self.handle(intent) {
                log::warn!("Intent failed: {err}");
                errors.push(err);
            }
        }
        errors
    }

    /// Parse a server message and queue it.
    pub fn receive_json(&mut self, text: &str) -> ProtocolResult<()> {
        let message = ServerMessage::from_json(text)?;
        self.enqueue(Intent::Remote(message));
        Ok(())
    }

    /// Handle one intent right away.
    pub fn handle(&mut self, intent: Intent) -> EditorResult<()> {
        match intent {
            Intent::DragStart(pos) => self.with_tools(|tools, ctx| tools.drag_start(ctx, pos))?,
            Intent::DragMove(pos) => self.with_tools(|tools, ctx| tools.drag_move(ctx, pos))?,
            Intent::DragEnd(pos) => self.with_tools(|tools, ctx| tools.drag_end(ctx, pos))?,
            Intent::SwitchTool(tool) => self.with_tools(|tools, ctx| tools.set_tool(ctx, tool))?,
            Intent::Select(id) => {
                self.with_tools(|_, ctx| ctx.select(id));
                self.scene_changed();
            }
            Intent::Undo => {
                self.stack.undo(&mut self.scene)?;
                self.scene_changed();
            }
            Intent::Redo => {
                self.stack.redo(&mut self.scene)?;
                self.scene_changed();
            }
            Intent::EnterFrame(frame) => {
                self.scene.enter_frame(frame);
                self.scene_changed();
            }
            Intent::AddKeyframe => self.add_keyframe()?,
            Intent::DeleteSelected => self.delete_selected()?,
            Intent::SetParent { child, parent } => {
                self.stack
                    .push(&mut self.scene, Command::reparent(child, parent), true)?;
                self.scene_changed();
            }
            Intent::SetStyle(style) => self.set_style(style)?,
            Intent::Remote(message) => self.handle_message(message)?,
        }
        Ok(())
    }

    fn with_tools<R>(
        &mut self,
        f: impl FnOnce(&mut ToolManager, &mut ToolContext<'_>) -> R,
    ) -> R {
        let settings = self.config.tool_settings();
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            stack: &mut self.stack,
            selection: &mut self.selection,
            style: &mut self.style,
            settings,
        };
        f(&mut self.tools, &mut ctx)
    }

    /// Drop a selection whose object is gone and refresh the tool.
    fn scene_changed(&mut self) {
        if self
            .selection
            .as_deref()
            .is_some_and(|id| !self.scene.is_alive(id))
        {
            self.selection = None;
        }
        self.tools
            .scene_changed(&self.scene, self.selection.as_deref());
    }

    fn add_keyframe(&mut self) -> EditorResult<()> {
        let Some(id) = self.selection.clone() else {
            return Ok(());
        };
        let object = self.scene.get(&id).map_err(CommandError::from)?;
        let time = object.frame().round();
        let props = object.props().clone();
        self.stack
            .push(&mut self.scene, Command::add_keyframe(id, time, props), true)?;
        Ok(())
    }

    fn delete_selected(&mut self) -> EditorResult<()> {
        let Some(id) = self.selection.take() else {
            return Ok(());
        };
        self.stack.push(&mut self.scene, Command::delete(id), true)?;
        self.scene_changed();
        Ok(())
    }

    fn set_style(&mut self, style: Props) -> EditorResult<()> {
        self.style.extend(style.clone());
        if let Some(id) = self.selection.clone() {
            self.stack.edit(&mut self.scene, &[id], style, false)?;
            self.stack.commit();
            self.scene_changed();
        }
        Ok(())
    }

    /// React to a server message.
    pub fn handle_message(&mut self, message: ServerMessage) -> EditorResult<()> {
        match message {
            ServerMessage::Open { id_prefix } => {
                if let Some(prefix) = id_prefix {
                    self.scene.restart_ids(prefix);
                }
            }
            ServerMessage::Edit { command, data } => {
                self.stack.apply_remote(&mut self.scene, &command, data)?;
                self.scene_changed();
            }
            ServerMessage::Loaded => {
                self.scene.mark_loaded();
                self.scene_changed();
            }
            ServerMessage::Error { msg } => log::warn!("Server error: {msg}"),
            ServerMessage::Other => log::trace!("Ignoring unrelated message"),
        }
        Ok(())
    }

    /// Paint the scene. Nothing is drawn before the initial sync finished.
    pub fn paint(&self, target: &mut dyn RenderTarget) -> bool {
        if !self.scene.is_loaded() {
            return false;
        }
        self.scene.paint(target);
        true
    }

    /// Export the document as a Lottie animation.
    pub fn to_lottie(&self) -> Value {
        lottie::export(&self.scene, &self.config.animation())
    }

    /// Drain messages for the server.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        self.stack.take_outgoing()
    }

    /// Drain messages for the server, serialized.
    pub fn take_outgoing_json(&mut self) -> ProtocolResult<Vec<String>> {
        self.take_outgoing()
            .iter()
            .map(ClientMessage::to_json)
            .collect()
    }
}
