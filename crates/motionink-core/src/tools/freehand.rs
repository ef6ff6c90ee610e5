//! Freehand tool: capture the pointer path and fit a curve to it.

use super::{Tool, ToolContext, ToolKind};
use crate::commands::{Command, CommandResult};
use crate::geometry::{Point, simplify};
use crate::shapes::ShapeKind;

/// Collects pointer samples during a drag and adds them as one Bézier shape
/// when the drag ends. Releasing within the handle radius of the start point
/// closes the stroke.
#[derive(Debug, Clone, Default)]
pub struct FreehandTool {
    points: Vec<Point>,
    /// Whether the pointer is currently over the start point.
    closing: bool,
}

impl FreehandTool {
    /// Samples captured so far.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    fn commit_shape(&mut self, ctx: &mut ToolContext<'_>, close: bool) -> CommandResult<()> {
        let mut points = std::mem::take(&mut self.points);
        self.closing = false;
        if points.len() < 2 {
            return Ok(());
        }
        if close {
            points.push(points[0]);
        }

        let curve = simplify(&points, ctx.settings.simplify_threshold);
        log::debug!(
            "Freehand stroke: {} samples -> {} segments",
            points.len(),
            curve.len()
        );
        let props = ctx.shape_props(crate::props! {"bezier" => curve});
        ctx.stack
            .push(ctx.scene, Command::add(ShapeKind::Bezier, props), true)?;
        let created = ctx
            .stack
            .last()
            .and_then(Command::created_id)
            .map(str::to_string);
        ctx.select(created);
        Ok(())
    }
}

impl Tool for FreehandTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Freehand
    }

    fn on_drag_start(&mut self, _ctx: &mut ToolContext<'_>, pos: Point) -> CommandResult<()> {
        self.points = vec![pos];
        self.closing = true;
        Ok(())
    }

    fn on_drag(
        &mut self,
        ctx: &mut ToolContext<'_>,
        start: Point,
        pos: Point,
    ) -> CommandResult<()> {
        self.points.push(pos);
        self.closing = start.distance(pos) <= ctx.settings.handle_radius;
        Ok(())
    }

    fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, _pos: Point) -> CommandResult<()> {
        let close = self.closing;
        self.commit_shape(ctx, close)
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> CommandResult<()> {
        self.commit_shape(ctx, false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::super::{ToolKind, ToolManager};
    use crate::geometry::Point;
    use crate::props::PropsExt;
    use crate::shapes::ShapeKind;
    use pretty_assertions::assert_eq;

    fn draw(tm: &mut ToolManager, fx: &mut Fixture, points: &[Point]) {
        tm.drag_start(&mut fx.ctx(), points[0]).unwrap();
        for &p in &points[1..] {
            tm.drag_move(&mut fx.ctx(), p).unwrap();
        }
        let last = points[points.len() - 1];
        tm.drag_end(&mut fx.ctx(), last).unwrap();
    }

    #[test]
    fn test_open_stroke() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Freehand).unwrap();

        draw(
            &mut tm,
            &mut fx,
            &[
                Point::new(0.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
            ],
        );

        let id = fx.selection.clone().unwrap();
        let shape = fx.scene.get(&id).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Bezier);
        let curve = shape.props().bezier("bezier").unwrap();
        // The collinear midpoint is decimated away.
        assert_eq!(curve.len(), 2);
        assert!(!curve.is_closed());
        assert!(fx.stack.is_last_committed());
    }

    #[test]
    fn test_release_near_start_closes() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Freehand).unwrap();

        draw(
            &mut tm,
            &mut fx,
            &[
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(3.0, 2.0),
            ],
        );

        let id = fx.selection.clone().unwrap();
        let curve = fx
            .scene
            .get(&id)
            .unwrap()
            .props()
            .bezier("bezier")
            .unwrap()
            .clone();
        assert!(curve.is_closed());
    }

    #[test]
    fn test_single_sample_adds_nothing() {
        let mut fx = Fixture::new();
        let mut tm = ToolManager::new();
        tm.set_tool(&mut fx.ctx(), ToolKind::Freehand).unwrap();

        draw(&mut tm, &mut fx, &[Point::new(5.0, 5.0)]);
        assert_eq!(fx.stack.undo_len(), 0);
        assert_eq!(fx.selection, None);
    }
}
