//! Select tool: pick objects and drag their handles.

use super::{Tool, ToolContext, ToolKind};
use crate::commands::CommandResult;
use crate::geometry::Point;
use crate::scene::Scene;
use crate::selection::{Handle, get_handles, hit_test_handles};
use crate::shapes::ObjectId;

/// A handle being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveHandle {
    index: usize,
    /// Pointer position relative to the handle when the drag began.
    offset: Point,
}

/// Clicking picks the object under the pointer (or clears the selection);
/// pressing on a handle drags it; pressing on an object and moving drags the
/// object by its position handle.
#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    /// Object the handles belong to.
    target: Option<ObjectId>,
    handles: Vec<Handle>,
    active: Option<ActiveHandle>,
    /// Object hit when the drag began.
    under_mouse: Option<ObjectId>,
    /// Pressed on an object; moving will drag it.
    maybe_drag: bool,
    /// Handle released last, for highlighting.
    highlight: Option<usize>,
}

impl SelectTool {
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn highlighted(&self) -> Option<&Handle> {
        self.highlight.and_then(|index| self.handles.get(index))
    }

    /// Rebuild the handles for `selection`, or just move them if the
    /// selection is unchanged.
    fn sync_handles(&mut self, scene: &Scene, selection: Option<&str>) {
        let object = selection.and_then(|id| scene.object(id));
        let Some(object) = object.filter(|o| !o.is_removed()) else {
            self.target = None;
            self.handles.clear();
            self.active = None;
            self.highlight = None;
            return;
        };

        if self.target.as_deref() == Some(object.id()) {
            for handle in &mut self.handles {
                handle.refresh(scene, object);
            }
        } else {
            self.target = Some(object.id().to_string());
            self.handles = get_handles(scene, object);
            self.active = None;
            self.highlight = None;
        }
    }

    fn position_handle(&self) -> Option<usize> {
        self.handles.iter().position(|h| h.kind.moves_object())
    }

    fn drag_handle(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        let (Some(active), Some(target)) = (self.active, self.target.clone()) else {
            return Ok(());
        };
        let Some(handle) = self.handles.get(active.index).copied() else {
            return Ok(());
        };
        let props = {
            let object = ctx.scene.get(&target)?;
            handle.drag_props(ctx.scene, object, handle.constrain(pos - active.offset))
        };
        if let Some(props) = props {
            ctx.stack.edit(ctx.scene, &[target], props, false)?;
        }
        self.sync_handles(ctx.scene, ctx.selection.as_deref());
        Ok(())
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        self.sync_handles(ctx.scene, ctx.selection.as_deref());
        self.highlight = None;
        self.maybe_drag = false;
        self.active = hit_test_handles(&self.handles, pos, ctx.settings.handle_radius).map(
            |index| ActiveHandle {
                index,
                offset: Point::ORIGIN,
            },
        );
        if self.active.is_some() {
            self.under_mouse = None;
            return Ok(());
        }

        self.under_mouse = ctx
            .scene
            .object_at(ctx.scene.current_layer(), pos)
            .map(str::to_string);
        self.maybe_drag = self.under_mouse.is_some();
        if self.under_mouse.is_some() && self.under_mouse != self.target {
            ctx.select(self.under_mouse.clone());
            self.sync_handles(ctx.scene, ctx.selection.as_deref());
        }
        Ok(())
    }

    fn on_drag(
        &mut self,
        ctx: &mut ToolContext<'_>,
        _start: Point,
        pos: Point,
    ) -> CommandResult<()> {
        if self.active.is_some() {
            return self.drag_handle(ctx, pos);
        }
        if self.maybe_drag {
            self.maybe_drag = false;
            self.active = self.position_handle().map(|index| ActiveHandle {
                index,
                offset: pos - self.handles[index].position,
            });
        }
        Ok(())
    }

    fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, _pos: Point) -> CommandResult<()> {
        self.maybe_drag = false;
        match self.active.take() {
            Some(active) => {
                ctx.stack.commit();
                self.highlight = Some(active.index);
            }
            None => {
                ctx.select(self.under_mouse.take());
                self.sync_handles(ctx.scene, ctx.selection.as_deref());
            }
        }
        Ok(())
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) {
        self.sync_handles(ctx.scene, ctx.selection.as_deref());
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> CommandResult<()> {
        if self.active.take().is_some() {
            ctx.stack.commit();
        }
        self.target = None;
        self.handles.clear();
        self.under_mouse = None;
        self.highlight = None;
        Ok(())
    }

    fn on_scene_changed(&mut self, scene: &Scene, selection: Option<&str>) {
        self.sync_handles(scene, selection);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::super::ToolManager;
    use crate::commands::Command;
    use crate::geometry::Point;
    use crate::props;
    use crate::props::PropsExt;
    use crate::selection::HandleKind;
    use crate::shapes::ShapeKind;
    use pretty_assertions::assert_eq;

    fn add_rect(fx: &mut Fixture) -> String {
        let command = Command::add(
            ShapeKind::Rectangle,
            props! {"left" => 0.0, "top" => 0.0, "width" => 100.0, "height" => 50.0},
        );
        fx.stack.push(&mut fx.scene, command, true).unwrap();
        fx.stack.last().unwrap().created_id().unwrap().to_string()
    }

    #[test]
    fn test_click_selects_and_clears() {
        let mut fx = Fixture::new();
        let id = add_rect(&mut fx);
        let mut tm = ToolManager::new();

        tm.drag_start(&mut fx.ctx(), Point::new(20.0, 20.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(20.0, 20.0)).unwrap();
        assert_eq!(fx.selection.as_deref(), Some(id.as_str()));
        assert_eq!(tm.handles().len(), 5);

        tm.drag_start(&mut fx.ctx(), Point::new(300.0, 300.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(300.0, 300.0)).unwrap();
        assert_eq!(fx.selection, None);
        assert!(tm.handles().is_empty());
    }

    #[test]
    fn test_press_and_move_drags_object() {
        let mut fx = Fixture::new();
        let id = add_rect(&mut fx);
        let mut tm = ToolManager::new();

        // Press away from the handles; the first move grabs the object,
        // the second drags it by (9, 5).
        tm.drag_start(&mut fx.ctx(), Point::new(20.0, 20.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(21.0, 20.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(30.0, 25.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(30.0, 25.0)).unwrap();

        let rect = fx.scene.get(&id).unwrap();
        assert_eq!(rect.number("left"), 9.0);
        assert_eq!(rect.number("top"), 5.0);
        assert!(fx.stack.is_last_committed());
        assert_eq!(fx.stack.undo_len(), 2);

        fx.stack.undo(&mut fx.scene).unwrap();
        assert_eq!(fx.scene.get(&id).unwrap().number("left"), 0.0);
    }

    #[test]
    fn test_handle_drag_resizes() {
        let mut fx = Fixture::new();
        let id = add_rect(&mut fx);
        fx.ctx().select(Some(id.clone()));
        let mut tm = ToolManager::new();

        // Right edge handle sits at (100, 25).
        tm.drag_start(&mut fx.ctx(), Point::new(101.0, 26.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(150.0, 80.0)).unwrap();
        let right = tm.handles()[2];
        assert_eq!(right.kind, HandleKind::RectRight);
        assert_eq!(right.position, Point::new(150.0, 25.0));

        // Dragging past the left edge issues no edit.
        tm.drag_move(&mut fx.ctx(), Point::new(-20.0, 25.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(-20.0, 25.0)).unwrap();

        let rect = fx.scene.get(&id).unwrap();
        assert_eq!(rect.number("width"), 150.0);
        assert_eq!(rect.props().number("height"), Some(50.0));
    }
}
