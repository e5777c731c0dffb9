//! Display-space to image-space coordinate mapping
//!
//! The editing surface shows the capture stretched to fit, so each axis has
//! its own scale factor and no aspect-ratio correction is applied.

use crate::domain::{Point, Rect};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    /// Mapper for the final burn-in; a zero-sized display surface is an error
    pub fn new(display: (u32, u32), image: (u32, u32)) -> Result<Self> {
        let (disp_w, disp_h) = display;
        if disp_w == 0 || disp_h == 0 {
            return Err(Error::DegenerateTransform {
                width: disp_w,
                height: disp_h,
            });
        }
        Ok(Self {
            scale_x: image.0 as f32 / disp_w as f32,
            scale_y: image.1 as f32 / disp_h as f32,
        })
    }

    /// Mapper for the live preview; zero display dimensions count as 1
    pub fn lenient(display: (u32, u32), image: (u32, u32)) -> Self {
        Self {
            scale_x: image.0 as f32 / display.0.max(1) as f32,
            scale_y: image.1 as f32 / display.1.max(1) as f32,
        }
    }

    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    /// Factor applied to widths and sizes so marks stay proportionate
    pub fn scale_factor(&self) -> f32 {
        self.scale_x.max(self.scale_y)
    }

    /// Map a display-space point to rounded image pixels
    pub fn to_image_space(&self, p: Point) -> (i32, i32) {
        (
            (p.x * self.scale_x).round() as i32,
            (p.y * self.scale_y).round() as i32,
        )
    }

    /// Map an image pixel back onto the display surface
    pub fn to_display_space(&self, (x, y): (i32, i32)) -> Point {
        Point::new(x as f32 / self.scale_x, y as f32 / self.scale_y)
    }

    /// Normalized image-space rectangle spanned by two display points
    pub fn rect_to_image_space(&self, a: Point, b: Point) -> Rect {
        Rect::from_corners(self.to_image_space(a), self.to_image_space(b))
    }
}
