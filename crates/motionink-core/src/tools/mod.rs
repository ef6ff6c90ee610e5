//! Pointer tools.
//!
//! Tools receive drag gestures in scene coordinates and turn them into
//! commands. The [`ToolManager`] owns the gesture state: a gesture that is
//! still in flight when the tool changes gets a synthesized drag end, so no
//! command created during it is left uncommitted.

mod freehand;
mod select;
mod shape;

pub use freehand::FreehandTool;
pub use select::SelectTool;
pub use shape::ShapeTool;

use crate::commands::{CommandResult, CommandStack};
use crate::geometry::Point;
use crate::props::Props;
use crate::scene::Scene;
use crate::selection::{HANDLE_RADIUS, Handle};
use crate::shapes::{ObjectId, ShapeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Ellipse,
    Rectangle,
    Freehand,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Select,
        ToolKind::Ellipse,
        ToolKind::Rectangle,
        ToolKind::Freehand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Freehand => "freehand",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunables shared by the tools.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    /// Decimation threshold for freehand strokes.
    pub simplify_threshold: f64,
    /// Pointer distance at which a handle is grabbed.
    pub handle_radius: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            simplify_threshold: 128.0,
            handle_radius: HANDLE_RADIUS,
        }
    }
}

/// What a tool may touch while handling an event.
pub struct ToolContext<'a> {
    pub scene: &'a mut Scene,
    pub stack: &'a mut CommandStack,
    /// Currently selected object.
    pub selection: &'a mut Option<ObjectId>,
    /// Style applied to new shapes.
    pub style: &'a mut Props,
    pub settings: ToolSettings,
}

impl ToolContext<'_> {
    /// Change the selection. Selecting a shape adopts its style as the
    /// current one.
    pub fn select(&mut self, id: Option<ObjectId>) {
        if let Some(style) = id.as_deref().and_then(|id| self.scene.style_of(id)) {
            self.style.extend(style);
        }
        if *self.selection != id {
            log::debug!("Selected {id:?}");
        }
        *self.selection = id;
    }

    /// Base properties for a new shape: the current style plus `geometry`.
    fn shape_props(&self, geometry: Props) -> Props {
        let mut props = self.style.clone();
        props.extend(geometry);
        props
    }
}

/// Gesture callbacks. Drag positions are in scene coordinates.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()>;

    /// Pointer moved to `pos` during a drag that began at `start`.
    fn on_drag(&mut self, ctx: &mut ToolContext<'_>, start: Point, pos: Point)
    -> CommandResult<()>;

    fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()>;

    fn on_activate(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>) -> CommandResult<()> {
        Ok(())
    }

    /// The scene changed outside of this tool (undo, remote edit, frame).
    fn on_scene_changed(&mut self, _scene: &Scene, _selection: Option<&str>) {}
}

/// State of the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Where the gesture began.
        start: Point,
        /// Last position delivered to the tool.
        last: Point,
    },
}

/// Manages the current tool and the gesture in flight.
#[derive(Debug)]
pub struct ToolManager {
    current: ToolKind,
    drag: DragState,
    select: SelectTool,
    ellipse: ShapeTool,
    rectangle: ShapeTool,
    freehand: FreehandTool,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current: ToolKind::default(),
            drag: DragState::Idle,
            select: SelectTool::default(),
            ellipse: ShapeTool::new(ShapeKind::Ellipse),
            rectangle: ShapeTool::new(ShapeKind::Rectangle),
            freehand: FreehandTool::default(),
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Handles of the select tool, for drawing.
    pub fn handles(&self) -> &[Handle] {
        self.select.handles()
    }

    fn tool_mut(&mut self) -> &mut dyn Tool {
        match self.current {
            ToolKind::Select => &mut self.select,
            ToolKind::Ellipse => &mut self.ellipse,
            ToolKind::Rectangle => &mut self.rectangle,
            ToolKind::Freehand => &mut self.freehand,
        }
    }

    /// Switch tools, finishing any gesture with the old one first.
    pub fn set_tool(&mut self, ctx: &mut ToolContext<'_>, tool: ToolKind) -> CommandResult<()> {
        if tool == self.current {
            return Ok(());
        }
        self.cancel_drag(ctx)?;
        self.tool_mut().on_deactivate(ctx)?;
        log::debug!("Tool {} -> {}", self.current, tool);
        self.current = tool;
        self.tool_mut().on_activate(ctx);
        Ok(())
    }

    /// Begin a gesture. A gesture still in flight is ended first.
    pub fn drag_start(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        self.cancel_drag(ctx)?;
        self.drag = DragState::Dragging {
            start: pos,
            last: pos,
        };
        self.tool_mut().on_drag_start(ctx, pos)
    }

    /// Pointer moved. Ignored outside a gesture.
    pub fn drag_move(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        let DragState::Dragging { start, .. } = self.drag else {
            return Ok(());
        };
        self.drag = DragState::Dragging { start, last: pos };
        self.tool_mut().on_drag(ctx, start, pos)
    }

    /// Finish the gesture at `pos`. Ignored outside a gesture.
    pub fn drag_end(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        if !self.is_dragging() {
            return Ok(());
        }
        self.drag = DragState::Idle;
        self.tool_mut().on_drag_end(ctx, pos)
    }

    /// End the gesture in flight at the last known position.
    pub fn cancel_drag(&mut self, ctx: &mut ToolContext<'_>) -> CommandResult<()> {
        let DragState::Dragging { last, .. } = self.drag else {
            return Ok(());
        };
        log::debug!("Synthesizing drag end for {}", self.current);
        self.drag = DragState::Idle;
        self.tool_mut().on_drag_end(ctx, last)
    }

    /// Let the current tool catch up with scene changes it did not make.
    pub fn scene_changed(&mut self, scene: &Scene, selection: Option<&str>) {
        self.tool_mut().on_scene_changed(scene, selection);
    }
}
