//! Session persistence and report export
//!
//! This module provides:
//! - The on-disk session repository (images, entry records, reports)
//! - The report template language
//! - Default templates written into each session

pub mod report;
pub mod repository;
pub mod templates;

pub use repository::{SessionOptions, SessionRepository};
