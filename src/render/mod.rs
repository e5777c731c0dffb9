//! Annotation rendering module
//!
//! This module contains:
//! - Geometry calculations shared between preview and final rendering
//! - Raster primitives using tiny-skia
//! - Glyph rendering for text labels
//! - The render engine and the preview hand-off slot

pub mod engine;
pub mod geometry;
pub mod image;
pub mod mapper;
pub mod preview;
pub mod text;

pub use engine::{DrawSpace, RenderEngine, RenderMode};
pub use mapper::CoordinateMapper;
pub use preview::PreviewSlot;
pub use text::FontFace;
