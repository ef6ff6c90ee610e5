//! Editor configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::lottie::AnimationSettings;
use crate::props::Props;
use crate::tools::ToolSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Style given to newly drawn shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingStyle {
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

fn default_fill() -> String {
    "#cc88ffff".to_string()
}

fn default_stroke() -> String {
    "#aa66ddff".to_string()
}

fn default_stroke_width() -> f64 {
    4.0
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
        }
    }
}

impl DrawingStyle {
    pub fn to_props(&self) -> Props {
        crate::props! {
            "fill" => self.fill.as_str(),
            "stroke" => self.stroke.as_str(),
            "stroke_width" => self.stroke_width,
        }
    }
}

/// Canvas size and timing, used by the Lottie export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_size")]
    pub width: f64,
    #[serde(default = "default_canvas_size")]
    pub height: f64,
    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Length in frames.
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_canvas_size() -> f64 {
    512.0
}

fn default_fps() -> f64 {
    60.0
}

fn default_duration() -> f64 {
    180.0
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_size(),
            height: default_canvas_size(),
            fps: default_fps(),
            duration: default_duration(),
        }
    }
}

impl From<CanvasConfig> for AnimationSettings {
    fn from(canvas: CanvasConfig) -> Self {
        AnimationSettings {
            width: canvas.width,
            height: canvas.height,
            frame_rate: canvas.fps,
            in_point: 0.0,
            out_point: canvas.duration,
        }
    }
}

/// Editor session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Prefix for locally minted ids; random per session when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
    #[serde(default)]
    pub style: DrawingStyle,
    /// Freehand decimation threshold; 0 keeps every sample.
    #[serde(default = "default_simplify_threshold")]
    pub simplify_threshold: f64,
    /// Undo history limit; 0 is unlimited.
    #[serde(default)]
    pub max_undo_depth: usize,
    #[serde(default = "default_handle_radius")]
    pub handle_radius: f64,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

fn default_simplify_threshold() -> f64 {
    128.0
}

fn default_handle_radius() -> f64 {
    crate::selection::HANDLE_RADIUS
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id_prefix: None,
            style: DrawingStyle::default(),
            simplify_threshold: default_simplify_threshold(),
            max_undo_depth: 0,
            handle_radius: default_handle_radius(),
            canvas: CanvasConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> ConfigResult<Self> {
        let config: EditorConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.handle_radius <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "handle_radius",
                reason: format!("must be positive, got {}", self.handle_radius),
            });
        }
        if self.canvas.fps <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "canvas.fps",
                reason: format!("must be positive, got {}", self.canvas.fps),
            });
        }
        for (field, color) in [("style.fill", &self.style.fill), ("style.stroke", &self.style.stroke)] {
            if let Err(err) = color.parse::<crate::color::HexColor>() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            simplify_threshold: self.simplify_threshold,
            handle_radius: self.handle_radius,
        }
    }

    pub fn animation(&self) -> AnimationSettings {
        self.canvas.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.style.fill, "#cc88ffff");
        assert_eq!(config.simplify_threshold, 128.0);
        assert_eq!(config.handle_radius, 8.0);
        assert_eq!(config.animation(), AnimationSettings::default());
    }

    #[test]
    fn test_partial_config() {
        let config = EditorConfig::from_json(
            r##"{"id_prefix": "c1", "style": {"stroke_width": 2}, "canvas": {"fps": 30}}"##,
        )
        .unwrap();
        assert_eq!(config.id_prefix.as_deref(), Some("c1"));
        assert_eq!(config.style.stroke_width, 2.0);
        assert_eq!(config.style.stroke, "#aa66ddff");
        assert_eq!(config.canvas.fps, 30.0);
        assert_eq!(config.canvas.width, 512.0);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EditorConfig::from_json(r#"{"handle_radius": 0}"#),
            Err(ConfigError::Invalid {
                field: "handle_radius",
                ..
            })
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{"style": {"fill": "purple"}}"#),
            Err(ConfigError::Invalid {
                field: "style.fill",
                ..
            })
        ));
        assert!(matches!(
            EditorConfig::from_json("[1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
