//! Annotation render engine
//!
//! The live preview and the final burn-in share one drawing routine. A
//! [`DrawSpace`] decides how display-space coordinates are mapped and how
//! large widths, arrowheads and fonts come out in the target raster.

use std::path::PathBuf;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use super::geometry::{self, arrow, blur, stroke};
use super::image::{blur_region, fill_rect, fill_triangle, stroke_line, stroke_rect_inside, stroke_ring};
use super::mapper::CoordinateMapper;
use super::text::FontFace;
use crate::capture::CapturedImage;
use crate::config::ShapeColor;
use crate::domain::{Annotation, Point, Rect, StrokeAnnotation, TextAnnotation};
use crate::error::Result;

/// Which raster the annotations are drawn into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Display-space preview with fixed sizes
    Preview,
    /// Full-resolution burn-in with sizes scaled to the image
    Final,
}

/// Coordinate mapping plus size rules for one render pass
#[derive(Clone, Copy, Debug)]
pub struct DrawSpace {
    pub mapper: CoordinateMapper,
    pub mode: RenderMode,
}

impl DrawSpace {
    pub fn preview() -> Self {
        Self {
            mapper: CoordinateMapper::identity(),
            mode: RenderMode::Preview,
        }
    }

    /// Image-space pass; fails on a degenerate display surface
    pub fn final_render(display: (u32, u32), image: (u32, u32)) -> Result<Self> {
        Ok(Self {
            mapper: CoordinateMapper::new(display, image)?,
            mode: RenderMode::Final,
        })
    }

    fn scale(&self) -> f32 {
        self.mapper.scale_factor()
    }

    pub fn point(&self, p: Point) -> (f32, f32) {
        let (x, y) = self.mapper.to_image_space(p);
        (x as f32, y as f32)
    }

    pub fn rect(&self, a: Point, b: Point) -> Rect {
        self.mapper.rect_to_image_space(a, b)
    }

    pub fn line_width(&self, width: u32) -> f32 {
        match self.mode {
            RenderMode::Preview => width as f32,
            RenderMode::Final => {
                let s = self.scale();
                let min_width = stroke::MIN_WIDTH.max(stroke::MIN_WIDTH * s);
                min_width.max(width as f32 * s)
            }
        }
    }

    pub fn head_size(&self) -> f32 {
        match self.mode {
            RenderMode::Preview => arrow::PREVIEW_HEAD_SIZE,
            RenderMode::Final => arrow::FINAL_HEAD_MIN.max(arrow::FINAL_HEAD_BASE * self.scale()),
        }
    }

    pub fn font_size(&self) -> f32 {
        match self.mode {
            RenderMode::Preview => geometry::text::PREVIEW_FONT_SIZE,
            RenderMode::Final => geometry::text::FINAL_FONT_MIN
                .max(geometry::text::FINAL_FONT_BASE * self.scale()),
        }
    }

    pub fn text_padding(&self) -> f32 {
        match self.mode {
            RenderMode::Preview => geometry::text::PADDING,
            RenderMode::Final => (geometry::text::PADDING * self.scale()).max(2.0),
        }
    }
}

/// Burns annotations into rasters
#[derive(Debug)]
pub struct RenderEngine {
    font: FontFace,
}

impl RenderEngine {
    /// Resolve the label font from `font_paths`, falling back to the built-in font
    pub fn new(font_paths: &[PathBuf]) -> Self {
        Self::with_font(FontFace::resolve(font_paths))
    }

    pub fn with_font(font: FontFace) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &FontFace {
        &self.font
    }

    /// Cheap display-space composite, used on every pointer move
    ///
    /// A zero display dimension is treated as 1 so the preview never fails.
    pub fn render_preview(
        &self,
        image: &CapturedImage,
        annotations: &[Annotation],
        display: (u32, u32),
    ) -> RgbaImage {
        let (w, h) = (display.0.max(1), display.1.max(1));
        let mut raster = if (w, h) == image.dimensions() {
            image.rgba.clone()
        } else {
            imageops::resize(&image.rgba, w, h, FilterType::Triangle)
        };
        self.draw_all(&mut raster, annotations, &DrawSpace::preview());
        raster
    }

    /// Full-resolution burn-in, used once per save
    pub fn render_final(
        &self,
        image: &CapturedImage,
        annotations: &[Annotation],
        display: (u32, u32),
    ) -> Result<RgbaImage> {
        let space = DrawSpace::final_render(display, image.dimensions())?;
        let mut raster = image.rgba.clone();
        self.draw_all(&mut raster, annotations, &space);
        log::debug!(
            "Rendered {} annotations at {}x{} (scale {:.2})",
            annotations.len(),
            raster.width(),
            raster.height(),
            space.mapper.scale_factor()
        );
        Ok(raster)
    }

    /// Draw annotations in order; later ones paint over earlier ones
    pub fn draw_all(&self, img: &mut RgbaImage, annotations: &[Annotation], space: &DrawSpace) {
        for annotation in annotations {
            self.draw(img, annotation, space);
        }
    }

    pub fn draw(&self, img: &mut RgbaImage, annotation: &Annotation, space: &DrawSpace) {
        match annotation {
            Annotation::Arrow(s) => self.draw_arrow(img, s, space),
            Annotation::Box(s) => {
                let rect = space.rect(s.start, s.end);
                stroke_rect_inside(img, rect, space.line_width(s.stroke_width), s.color.to_rgba_u8());
            }
            Annotation::Freehand(s) => {
                stroke_line(
                    img,
                    space.point(s.start),
                    space.point(s.end),
                    space.line_width(s.stroke_width),
                    s.color.to_rgba_u8(),
                );
            }
            Annotation::Text(t) => self.draw_text(img, t, space),
            Annotation::Blur(s) => {
                blur_region(img, space.rect(s.start, s.end), blur::RADIUS);
            }
        }
    }

    fn draw_arrow(&self, img: &mut RgbaImage, s: &StrokeAnnotation, space: &DrawSpace) {
        let from = space.point(s.start);
        let to = space.point(s.end);
        let width = space.line_width(s.stroke_width);
        let color = s.color.to_rgba_u8();

        match arrow::head_points(from, to, space.head_size()) {
            Some([tip, left, right]) => {
                // Stop the shaft at the head so its cap does not poke past the tip
                stroke_line(img, from, arrow::head_base(left, right), width, color);
                fill_triangle(img, [tip, left, right], color);
            }
            None => stroke_line(img, from, to, width, color),
        }
    }

    fn draw_text(&self, img: &mut RgbaImage, t: &TextAnnotation, space: &DrawSpace) {
        let (x, y) = space.point(t.position);
        let px = space.font_size();
        let pad = space.text_padding();
        let (w, h) = self.font.measure(&t.text, px);

        fill_rect(
            img,
            (x - pad, y - pad, x + w + pad, y + h + pad),
            ShapeColor::WHITE.to_rgba_u8(),
        );
        self.font.draw(img, &t.text, x, y, px, t.color.to_rgba_u8());
    }

    /// Blur the image-space region under a display-space stroke, in place
    ///
    /// Returns false for a zero-area region.
    pub fn apply_blur(
        &self,
        image: &mut CapturedImage,
        region: &StrokeAnnotation,
        display: (u32, u32),
    ) -> Result<bool> {
        let mapper = CoordinateMapper::new(display, image.dimensions())?;
        let rect = mapper.rect_to_image_space(region.start, region.end);
        if rect.is_empty() {
            log::debug!("Ignoring zero-area blur region {:?}", rect);
            return Ok(false);
        }
        log::debug!("Blurring region {:?}", rect);
        Ok(blur_region(&mut image.rgba, rect, blur::RADIUS))
    }

    /// Ring marking where a text label will be placed
    pub fn draw_text_marker(&self, img: &mut RgbaImage, position: Point, color: ShapeColor) {
        let center = DrawSpace::preview().point(position);
        stroke_ring(img, center, stroke::MARKER_RADIUS, stroke::MARKER_WIDTH, color.to_rgba_u8());
    }
}
