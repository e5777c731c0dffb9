//! Screen-capture annotation and session reports
//!
//! A captured bitmap is loaded into an [`AnnotationModel`], marked up with
//! arrows, boxes, freehand strokes, text labels and blur regions, flattened
//! at full resolution and stored in a [`SessionRepository`] that exports
//! Markdown and HTML reports.

pub mod annotations;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod render;
pub mod session;

pub use annotations::AnnotationModel;
pub use capture::{CaptureSource, CapturedImage, FileCapture};
pub use config::{AnnotatorConfig, ShapeColor};
pub use error::{Error, Result};
pub use render::RenderEngine;
pub use session::{SessionOptions, SessionRepository};
