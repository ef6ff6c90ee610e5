//! MotionInk Core Library
//!
//! Geometry kernel, scene graph, synchronized command stack and pointer tools
//! for the MotionInk vector animation editor.

pub mod color;
pub mod commands;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod ids;
pub mod lottie;
pub mod paint;
pub mod props;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod sync;
pub mod timeline;
pub mod tools;

pub use color::HexColor;
pub use commands::{Command, CommandError, CommandKind, CommandStack};
pub use config::{ConfigError, EditorConfig};
pub use editor::{Editor, EditorError, Intent};
pub use geometry::{Bezier, BezierSegment, BoundingBox, Bounds, Matrix, Point};
pub use lottie::AnimationSettings;
pub use paint::RenderTarget;
pub use props::{PropValue, Props, PropsExt};
pub use scene::{ROOT_ID, Scene, SceneError};
pub use selection::{Handle, HandleKind, HandleShape};
pub use shapes::{EditorObject, ObjectId, ShapeKind};
pub use sync::{ClientMessage, ProtocolError, ServerMessage};
pub use timeline::{Keyframe, Timeline};
pub use tools::{ToolKind, ToolManager};
