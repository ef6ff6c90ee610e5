//! Transcript replay.
//!
//! A transcript is a JSON-lines file of server messages, one per line, as
//! received by an editor session. Blank lines are skipped.

use anyhow::Context as _;
use motionink_core::Editor;
use motionink_render::RecordingRenderer;
use std::io::BufRead;

/// Counts gathered while replaying a transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Messages parsed and dispatched.
    pub messages: usize,
    /// Messages whose edit the editor refused.
    pub rejected: usize,
}

/// Feed every message in `reader` to `editor`, in order.
///
/// A line that is not a valid server message aborts the replay. Edits the
/// editor refuses are logged and counted, and the replay carries on.
pub fn replay<R: BufRead>(editor: &mut Editor, reader: R) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("read transcript line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor
            .receive_json(line)
            .with_context(|| format!("parse transcript line {line_no}"))?;
        summary.messages += 1;
        for err in editor.dispatch() {
            log::debug!("line {line_no}: {err}");
            summary.rejected += 1;
        }
    }
    log::debug!(
        "Replayed {} messages ({} rejected)",
        summary.messages,
        summary.rejected
    );
    Ok(summary)
}

/// Paint the editor's scene and serialize it as SVG at the canvas size.
///
/// A document that never finished loading paints as an empty canvas.
pub fn snapshot_svg(editor: &Editor) -> anyhow::Result<String> {
    let mut renderer = RecordingRenderer::new();
    if !editor.paint(&mut renderer) {
        log::warn!("Document not loaded; writing an empty snapshot");
    }
    let canvas = &editor.config().canvas;
    let svg = renderer
        .to_svg(canvas.width, canvas.height)
        .context("serialize SVG snapshot")?;
    Ok(svg)
}
