//! Recording render target.

use kurbo::{Affine, BezPath, Rect, Shape};
use motionink_core::{Point, RenderTarget};
use peniko::Color;
use std::fmt::Write as _;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Failed to format SVG: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("Failed to write SVG: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// One recorded paint call. Paths are in device space.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// Even-odd fill.
    Fill { path: BezPath, color: Color },
    Stroke {
        path: BezPath,
        color: Color,
        /// Line width scaled by the transform in effect.
        width: f64,
    },
}

impl DrawOp {
    pub fn path(&self) -> &BezPath {
        match self {
            DrawOp::Fill { path, .. } | DrawOp::Stroke { path, .. } => path,
        }
    }
}

/// Graphics state saved and restored as a unit.
#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine,
    fill: Color,
    stroke: Color,
    line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Color::from_rgba8(0, 0, 0, 255),
            stroke: Color::from_rgba8(0, 0, 0, 255),
            line_width: 1.0,
        }
    }
}

/// A [`RenderTarget`] that records fills and strokes instead of rasterizing.
///
/// Points are mapped through the current transform as the path is built, so
/// changing the transform mid-path affects only later points.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
    ops: Vec<DrawOp>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint calls recorded so far, in order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Drop recorded ops and reset the graphics state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn current_transform(&self) -> Affine {
        self.state.transform
    }

    /// Number of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Union of the recorded paths' bounding boxes.
    pub fn bounds(&self) -> Option<Rect> {
        self.ops
            .iter()
            .map(|op| {
                let rect = op.path().bounding_box();
                match op {
                    DrawOp::Stroke { width, .. } => rect.inflate(width / 2.0, width / 2.0),
                    DrawOp::Fill { .. } => rect,
                }
            })
            .reduce(|a, b| a.union(b))
    }

    fn map(&self, p: Point) -> kurbo::Point {
        self.state.transform * kurbo::Point::from(p)
    }

    /// Serialize the recorded frame as an SVG document of the given size.
    pub fn to_svg(&self, width: f64, height: f64) -> RenderResult<String> {
        let mut svg = String::new();
        writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        )?;
        for op in &self.ops {
            match op {
                DrawOp::Fill { path, color } => {
                    if path.elements().is_empty() {
                        continue;
                    }
                    writeln!(
                        svg,
                        "  <path d=\"{}\" fill=\"{}\"{} fill-rule=\"evenodd\" stroke=\"none\"/>",
                        path.to_svg(),
                        svg_color(*color),
                        opacity_attr("fill-opacity", *color),
                    )?;
                }
                DrawOp::Stroke { path, color, width } => {
                    if path.elements().is_empty() {
                        continue;
                    }
                    writeln!(
                        svg,
                        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\"{} stroke-width=\"{}\"/>",
                        path.to_svg(),
                        svg_color(*color),
                        opacity_attr("stroke-opacity", *color),
                        width,
                    )?;
                }
            }
        }
        svg.push_str("</svg>\n");
        Ok(svg)
    }

    /// Write the SVG for the recorded frame to `writer`.
    pub fn write_svg<W: std::io::Write>(
        &self,
        mut writer: W,
        width: f64,
        height: f64,
    ) -> RenderResult<()> {
        writer.write_all(self.to_svg(width, height)?.as_bytes())?;
        Ok(())
    }
}

fn svg_color(color: Color) -> String {
    let rgba = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
}

fn opacity_attr(name: &str, color: Color) -> String {
    let alpha = color.to_rgba8().a;
    if alpha == u8::MAX {
        String::new()
    } else {
        format!(" {name}=\"{:.3}\"", f64::from(alpha) / 255.0)
    }
}

impl RenderTarget for RecordingRenderer {
    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
    }

    fn move_to(&mut self, p: Point) {
        let p = self.map(p);
        self.path.move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        let p = self.map(p);
        self.path.line_to(p);
    }

    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        let (c1, c2, p) = (self.map(c1), self.map(c2), self.map(p));
        self.path.curve_to(c1, c2, p);
    }

    fn close_path(&mut self) {
        self.path.close_path();
    }

    fn fill_even_odd(&mut self) {
        self.ops.push(DrawOp::Fill {
            path: self.path.clone(),
            color: self.state.fill,
        });
    }

    fn stroke(&mut self) {
        // Uniform approximation of the transform's scale.
        let scale = self.state.transform.determinant().abs().sqrt();
        self.ops.push(DrawOp::Stroke {
            path: self.path.clone(),
            color: self.state.stroke,
            width: self.state.line_width * scale,
        });
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("restore without matching save"),
        }
    }

    fn transform(&mut self, m: [f64; 6]) {
        self.state.transform *= Affine::new(m);
    }
}
