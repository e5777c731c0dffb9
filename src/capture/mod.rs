//! Captured bitmaps and the capture provider seam
//!
//! Screen grabbing itself lives outside this crate; anything that can hand
//! over an RGBA bitmap implements [`CaptureSource`].

pub mod image;

use std::path::PathBuf;

pub use self::image::CapturedImage;
use crate::error::Result;

/// Provider of raw bitmaps on demand
pub trait CaptureSource {
    fn capture(&mut self) -> Result<CapturedImage>;
}

/// Capture source that decodes an image file from disk
#[derive(Clone, Debug)]
pub struct FileCapture {
    pub path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileCapture {
    fn capture(&mut self) -> Result<CapturedImage> {
        log::debug!("Capturing from file {:?}", self.path);
        CapturedImage::open(&self.path)
    }
}
