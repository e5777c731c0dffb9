//! Pure domain types with minimal dependencies
//!
//! This module contains the annotation, geometry and entry types shared by
//! the editing model, the render engine and the session repository.

pub mod annotation;
pub mod entry;
pub mod geometry;

pub use annotation::*;
pub use entry::*;
pub use geometry::*;
