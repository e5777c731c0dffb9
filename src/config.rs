//! Configuration persistence for snapnote settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Layout, Tool};

/// Serializable RGB color for annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self::RED
    }
}

impl ShapeColor {
    pub const RED: ShapeColor = ShapeColor { r: 255, g: 0, b: 0 };
    pub const WHITE: ShapeColor = ShapeColor {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Convert to image crate RGBA format (0-255), fully opaque
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Tool selected when a capture is loaded
    #[serde(default)]
    pub default_tool: Tool,
    /// Color for new annotations
    #[serde(default)]
    pub shape_color: ShapeColor,
    /// Stroke width for new annotations in display pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    /// Report layout for new entries
    #[serde(default)]
    pub layout: Layout,
    /// Directory used when no session is given on the command line
    #[serde(default)]
    pub sessions_dir: Option<PathBuf>,
    /// JPEG quality for saved entry images (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Fonts tried in order for text labels before the built-in font
    #[serde(default = "default_font_paths")]
    pub font_paths: Vec<PathBuf>,
}

fn default_stroke_width() -> u32 {
    crate::domain::DEFAULT_STROKE_WIDTH
}

fn default_jpeg_quality() -> u8 {
    95
}

/// Common system locations of a sans-serif TrueType font
pub fn default_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl AnnotatorConfig {
    /// Directory name under the platform config dir
    pub const ID: &'static str = "snapnote";

    /// Location of the config file, if the platform has a config dir
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("Error parsing config {:?}, using defaults: {}", path, err);
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                log::warn!("Could not read config {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    ///
    /// Returns the path written, or `None` after logging why it failed.
    pub fn save(&self) -> Option<PathBuf> {
        let Some(path) = Self::path() else {
            log::error!("No config directory available, not saving config");
            return None;
        };
        match self.save_to(&path) {
            Ok(()) => Some(path),
            Err(err) => {
                log::error!("Failed to save config {:?}: {}", path, err);
                None
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Sessions directory, falling back to `~/Documents/snapnote`
    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions_dir.clone().unwrap_or_else(|| {
            dirs::document_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
                .unwrap_or_else(|| PathBuf::from("."))
                .join(Self::ID)
        })
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            default_tool: Tool::Arrow,
            shape_color: ShapeColor::default(),
            stroke_width: default_stroke_width(),
            layout: Layout::ImageLeft,
            sessions_dir: None,
            jpeg_quality: default_jpeg_quality(),
            font_paths: default_font_paths(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnnotatorConfig =
            serde_json::from_str(r#"{"stroke_width": 5, "default_tool": "box"}"#).unwrap();
        assert_eq!(config.stroke_width, 5);
        assert_eq!(config.default_tool, Tool::Box);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.shape_color, ShapeColor::RED);
        assert_eq!(config.font_paths, default_font_paths());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AnnotatorConfig {
            default_tool: Tool::Text,
            stroke_width: 7,
            layout: Layout::ImageTop,
            jpeg_quality: 80,
            ..AnnotatorConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AnnotatorConfig::load_from(&path), config);
    }

    #[test]
    fn test_unreadable_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AnnotatorConfig::load_from(&dir.path().join("absent.json")),
            AnnotatorConfig::default()
        );
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ nope").unwrap();
        assert_eq!(AnnotatorConfig::load_from(&broken), AnnotatorConfig::default());
    }

    #[test]
    fn test_color_to_rgba() {
        let c = ShapeColor { r: 1, g: 2, b: 3 };
        assert_eq!(c.to_rgba_u8(), [1, 2, 3, 255]);
    }
}
