//! Error types for capture, rendering and session storage

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for snapnote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the annotation engine and session repository
///
/// Font lookup failures never show up here: text rendering falls back to the
/// built-in font instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Zero-dimension or undecodable bitmap
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Display surface with zero width or height
    #[error("cannot map from a {width}x{height} display surface")]
    DegenerateTransform { width: u32, height: u32 },

    /// Referenced image file does not exist
    #[error("missing asset: {}", .0.display())]
    MissingAsset(PathBuf),

    /// Persisted entry record that does not parse
    #[error("corrupt entry record {}: {source}", path.display())]
    CorruptEntry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Operation needs a loaded capture
    #[error("no image loaded")]
    NoImage,

    /// Annotation data that violates the per-tool invariants
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Report template that cannot be parsed or rendered
    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
