//! Captured bitmap that annotations are drawn over

use std::path::Path;

use image::RgbaImage;

use crate::error::{Error, Result};

/// The raw RGBA bitmap being annotated
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pub rgba: RgbaImage,
}

impl CapturedImage {
    /// Wrap an RGBA buffer, rejecting zero-sized bitmaps
    pub fn new(rgba: RgbaImage) -> Result<Self> {
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(Error::InvalidImage(format!(
                "zero-sized bitmap {}x{}",
                rgba.width(),
                rgba.height()
            )));
        }
        log::debug!("CapturedImage loaded: {}x{} pixels", rgba.width(), rgba.height());
        Ok(Self { rgba })
    }

    /// Build from raw RGBA8 bytes as handed over by a capture provider
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let rgba = RgbaImage::from_raw(width, height, bytes).ok_or_else(|| {
            Error::InvalidImage(format!("buffer does not hold {}x{} RGBA pixels", width, height))
        })?;
        Self::new(rgba)
    }

    /// Decode an image file of any supported format
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingAsset(path.to_path_buf()));
        }
        let decoded = image::open(path)
            .map_err(|e| Error::InvalidImage(format!("{}: {}", path.display(), e)))?;
        Self::new(decoded.to_rgba8())
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }
}
