//! Annotation editing
//!
//! This module provides:
//! - The editing model for the active capture
//! - Message handlers for pointer and toolbar events

pub mod handlers;
pub mod model;

pub use handlers::{EditMsg, handle_edit_msg, replay};
pub use model::AnnotationModel;
