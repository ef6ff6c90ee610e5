//! Ellipse and rectangle tools: drag out a box from the press point.

use super::{Tool, ToolContext, ToolKind};
use crate::commands::{Command, CommandResult};
use crate::geometry::Point;
use crate::props::Props;
use crate::shapes::{ObjectId, ShapeKind};

/// Draws an ellipse or rectangle spanning the drag.
///
/// The shape is added on the first movement, resized by uncommitted edits
/// while the drag lasts, and committed and selected when it ends.
#[derive(Debug, Clone)]
pub struct ShapeTool {
    kind: ShapeKind,
    /// Shape created by the current drag.
    shape: Option<ObjectId>,
}

impl ShapeTool {
    /// Tool for `kind`, which should be an ellipse or rectangle.
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, shape: None }
    }

    fn anchor_props(&self, start: Point) -> Props {
        match self.kind {
            ShapeKind::Rectangle => crate::props! {"left" => start.x, "top" => start.y},
            _ => crate::props! {"cx" => start.x, "cy" => start.y},
        }
    }

    fn drag_props(&self, start: Point, pos: Point) -> Props {
        match self.kind {
            ShapeKind::Rectangle => {
                let delta = pos - start;
                crate::props! {
                    "left" => start.x.min(pos.x),
                    "top" => start.y.min(pos.y),
                    "width" => delta.x.abs(),
                    "height" => delta.y.abs(),
                }
            }
            _ => {
                let center = (start + pos) / 2.0;
                crate::props! {
                    "cx" => center.x,
                    "cy" => center.y,
                    "rx" => ((pos.x - start.x) / 2.0).abs(),
                    "ry" => ((pos.y - start.y) / 2.0).abs(),
                }
            }
        }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.kind {
            ShapeKind::Rectangle => ToolKind::Rectangle,
            _ => ToolKind::Ellipse,
        }
    }

    fn on_drag_start(&mut self, _ctx: &mut ToolContext<'_>, _pos: Point) -> CommandResult<()> {
        self.shape = None;
        Ok(())
    }

    fn on_drag(
        &mut self,
        ctx: &mut ToolContext<'_>,
        start: Point,
        pos: Point,
    ) -> CommandResult<()> {
        let id = match &self.shape {
            Some(id) => id.clone(),
            None => {
                let props = ctx.shape_props(self.anchor_props(start));
                ctx.stack.push(ctx.scene, Command::add(self.kind, props), true)?;
                let Some(id) = ctx.stack.last().and_then(Command::created_id) else {
                    return Ok(());
                };
                let id = id.to_string();
                self.shape = Some(id.clone());
                id
            }
        };
        ctx.stack
            .edit(ctx.scene, &[id], self.drag_props(start, pos), false)?;
        Ok(())
    }

    fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, _pos: Point) -> CommandResult<()> {
        if let Some(id) = self.shape.take() {
            ctx.select(Some(id));
            ctx.stack.commit();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::super::{ToolKind, ToolManager};
    use crate::commands::CommandKind;
    use crate::geometry::Point;
    use crate::props::PropsExt;
    use crate::sync::ClientMessage;
    use pretty_assertions::assert_eq;

    fn sent_kinds(messages: &[ClientMessage]) -> Vec<CommandKind> {
        messages
            .iter()
            .map(|ClientMessage::Edit { command, .. }| *command)
            .collect()
    }

    #[test]
    fn test_rectangle_drag_normalizes() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Rectangle).unwrap();

        tm.drag_start(&mut fx.ctx(), Point::new(100.0, 100.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(90.0, 80.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(40.0, 60.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(40.0, 60.0)).unwrap();

        let id = fx.selection.clone().unwrap();
        let rect = fx.scene.get(&id).unwrap();
        assert_eq!(rect.number("left"), 40.0);
        assert_eq!(rect.number("top"), 60.0);
        assert_eq!(rect.number("width"), 60.0);
        assert_eq!(rect.number("height"), 40.0);
        assert_eq!(rect.props().text("fill"), Some("#cc88ffff"));

        // One add, one coalesced resize.
        assert_eq!(fx.stack.undo_len(), 2);
        assert_eq!(
            sent_kinds(&fx.stack.take_outgoing()),
            vec![
                CommandKind::ShapeAdd,
                CommandKind::ShapeEdit,
                CommandKind::ShapeEdit
            ]
        );
    }

    #[test]
    fn test_ellipse_drag() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Ellipse).unwrap();

        tm.drag_start(&mut fx.ctx(), Point::new(10.0, 10.0)).unwrap();
        tm.drag_move(&mut fx.ctx(), Point::new(50.0, 30.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(50.0, 30.0)).unwrap();

        let id = fx.selection.clone().unwrap();
        let ellipse = fx.scene.get(&id).unwrap();
        assert_eq!(ellipse.number("cx"), 30.0);
        assert_eq!(ellipse.number("cy"), 20.0);
        assert_eq!(ellipse.number("rx"), 20.0);
        assert_eq!(ellipse.number("ry"), 10.0);
        assert!(fx.stack.is_last_committed());
    }

    #[test]
    fn test_click_without_move_adds_nothing() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Ellipse).unwrap();

        tm.drag_start(&mut fx.ctx(), Point::new(10.0, 10.0)).unwrap();
        tm.drag_end(&mut fx.ctx(), Point::new(10.0, 10.0)).unwrap();
        assert_eq!(fx.selection, None);
        assert_eq!(fx.stack.undo_len(), 0);
    }
}
