//! Hand-off slot for the live preview raster
//!
//! The preview is built completely off to the side and then swapped in under
//! the lock. Readers clone the `Arc` under the same lock and release it
//! before painting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;

#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Mutex<Option<Arc<RgbaImage>>>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<RgbaImage>>> {
        // A panicking painter must not take the preview down with it
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a finished raster, replacing the previous one
    pub fn publish(&self, raster: RgbaImage) {
        let raster = Arc::new(raster);
        let previous = self.lock().replace(raster);
        // Drop the old raster after the lock is released
        drop(previous);
    }

    /// Latest published raster, if any
    pub fn current(&self) -> Option<Arc<RgbaImage>> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        let previous = self.lock().take();
        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_publish_replaces() {
        let slot = PreviewSlot::new();
        assert!(slot.current().is_none());
        slot.publish(RgbaImage::new(2, 2));
        let first = slot.current().unwrap();
        slot.publish(RgbaImage::new(3, 3));
        // Readers keep the raster they took
        assert_eq!(first.dimensions(), (2, 2));
        assert_eq!(slot.current().unwrap().dimensions(), (3, 3));
        slot.clear();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_reader_on_other_thread_sees_whole_rasters() {
        let slot = Arc::new(PreviewSlot::new());
        let reader = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Some(raster) = slot.current() {
                        let (w, h) = raster.dimensions();
                        assert_eq!(w, h);
                        assert_eq!(raster.as_raw().len(), (w * h * 4) as usize);
                    }
                }
            })
        };
        for size in 1..50 {
            slot.publish(RgbaImage::new(size, size));
        }
        reader.join().unwrap();
    }
}
