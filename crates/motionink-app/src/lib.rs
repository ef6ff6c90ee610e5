//! MotionInk Application
//!
//! Command-line shell around an editor session: replays recorded server
//! transcripts and exports the resulting document.

mod replay;

pub use replay::{ReplaySummary, replay, snapshot_svg};
