//! MotionInk Render Library
//!
//! Render targets for MotionInk scenes. The recording renderer captures the
//! paint calls of a frame and serializes them as SVG.

mod renderer;

pub use renderer::{DrawOp, RecordingRenderer, RenderResult, RendererError};
