//! Annotation types for drawing on captures
//!
//! All annotation types store coordinates in display space; the render
//! engine maps them into image space when burning them in.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::config::ShapeColor;
use crate::error::{Error, Result};

/// Default stroke width in display pixels
pub const DEFAULT_STROKE_WIDTH: u32 = 3;

/// Annotation tool selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Arrow,
    Box,
    Freehand,
    Text,
    Blur,
}

impl Tool {
    /// Whether this tool is drawn by dragging from a start to an end point
    pub fn is_stroke(self) -> bool {
        !matches!(self, Tool::Text)
    }
}

/// Annotation spanning a start and an end point (arrow, box, freehand, blur)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeAnnotation {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub color: ShapeColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

/// Text label anchored at its top-left corner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub position: Point,
    pub text: String,
    #[serde(default)]
    pub color: ShapeColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

/// Unified annotation type; a `Vec<Annotation>` is painted in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum Annotation {
    Arrow(StrokeAnnotation),
    Box(StrokeAnnotation),
    Freehand(StrokeAnnotation),
    Text(TextAnnotation),
    Blur(StrokeAnnotation),
}

impl Annotation {
    /// Start a stroke annotation for `tool`, or `None` for the text tool
    pub fn stroke(tool: Tool, start: Point, color: ShapeColor, stroke_width: u32) -> Option<Self> {
        let stroke = StrokeAnnotation {
            start,
            end: start,
            color,
            stroke_width,
        };
        match tool {
            Tool::Arrow => Some(Annotation::Arrow(stroke)),
            Tool::Box => Some(Annotation::Box(stroke)),
            Tool::Freehand => Some(Annotation::Freehand(stroke)),
            Tool::Blur => Some(Annotation::Blur(stroke)),
            Tool::Text => None,
        }
    }

    /// Build a text label; empty (or whitespace-only) text is rejected
    pub fn text(
        position: Point,
        text: impl Into<String>,
        color: ShapeColor,
        stroke_width: u32,
    ) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Annotation::Text(TextAnnotation {
            position,
            text,
            color,
            stroke_width,
        }))
    }

    pub fn tool(&self) -> Tool {
        match self {
            Annotation::Arrow(_) => Tool::Arrow,
            Annotation::Box(_) => Tool::Box,
            Annotation::Freehand(_) => Tool::Freehand,
            Annotation::Text(_) => Tool::Text,
            Annotation::Blur(_) => Tool::Blur,
        }
    }

    pub fn start(&self) -> Point {
        match self {
            Annotation::Arrow(s)
            | Annotation::Box(s)
            | Annotation::Freehand(s)
            | Annotation::Blur(s) => s.start,
            Annotation::Text(t) => t.position,
        }
    }

    /// End point; text labels have none
    pub fn end(&self) -> Option<Point> {
        self.as_stroke().map(|s| s.end)
    }

    pub fn as_stroke(&self) -> Option<&StrokeAnnotation> {
        match self {
            Annotation::Arrow(s)
            | Annotation::Box(s)
            | Annotation::Freehand(s)
            | Annotation::Blur(s) => Some(s),
            Annotation::Text(_) => None,
        }
    }

    /// Move the end point of an in-progress stroke
    pub fn set_end(&mut self, point: Point) {
        match self {
            Annotation::Arrow(s)
            | Annotation::Box(s)
            | Annotation::Freehand(s)
            | Annotation::Blur(s) => s.end = point,
            Annotation::Text(_) => {}
        }
    }

    /// Check the invariants for annotations that arrive from outside
    pub fn validate(&self) -> Result<()> {
        match self {
            Annotation::Arrow(s)
            | Annotation::Box(s)
            | Annotation::Freehand(s)
            | Annotation::Blur(s) => {
                if s.stroke_width == 0 {
                    return Err(Error::InvalidAnnotation(format!(
                        "{:?} stroke width must be positive",
                        self.tool()
                    )));
                }
            }
            Annotation::Text(t) => {
                if t.text.trim().is_empty() {
                    return Err(Error::InvalidAnnotation(
                        "text label needs non-empty text".to_string(),
                    ));
                }
                if t.stroke_width == 0 {
                    return Err(Error::InvalidAnnotation(
                        "text stroke width must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_tool_has_no_stroke() {
        assert!(Annotation::stroke(Tool::Text, Point::new(1.0, 1.0), ShapeColor::default(), 3).is_none());
        let a = Annotation::stroke(Tool::Box, Point::new(1.0, 2.0), ShapeColor::default(), 3).unwrap();
        assert_eq!(a.tool(), Tool::Box);
        assert_eq!(a.end(), Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(Annotation::text(Point::default(), "  ", ShapeColor::default(), 3).is_none());
        let t = Annotation::text(Point::default(), "hi", ShapeColor::default(), 3).unwrap();
        assert_eq!(t.end(), None);
    }

    #[test]
    fn test_deserialize_script() {
        let json = r#"[
            {"tool": "arrow", "start": {"x": 1, "y": 2}, "end": {"x": 30, "y": 40}},
            {"tool": "text", "position": {"x": 5, "y": 5}, "text": "look", "color": {"r": 0, "g": 0, "b": 255}},
            {"tool": "blur", "start": {"x": 0, "y": 0}, "end": {"x": 10, "y": 10}, "stroke_width": 1}
        ]"#;
        let parsed: Vec<Annotation> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].tool(), Tool::Arrow);
        assert_eq!(parsed[0].as_stroke().unwrap().stroke_width, DEFAULT_STROKE_WIDTH);
        match &parsed[1] {
            Annotation::Text(t) => {
                assert_eq!(t.text, "look");
                assert_eq!(t.color, ShapeColor { r: 0, g: 0, b: 255 });
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert!(parsed.iter().all(|a| a.validate().is_ok()));
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let mut a = Annotation::stroke(Tool::Arrow, Point::default(), ShapeColor::default(), 0).unwrap();
        a.set_end(Point::new(10.0, 0.0));
        assert!(matches!(a.validate(), Err(Error::InvalidAnnotation(_))));
    }
}
