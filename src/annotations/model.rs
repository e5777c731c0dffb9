//! Editing state for one captured image
//!
//! The model owns the active bitmap, the ordered annotation set and the
//! in-progress stroke. Pointer input arrives in display space; the render
//! engine takes care of mapping into image space.

use std::sync::Arc;

use image::RgbaImage;

use crate::capture::CapturedImage;
use crate::config::{AnnotatorConfig, ShapeColor};
use crate::domain::{Annotation, DEFAULT_STROKE_WIDTH, Point, Tool};
use crate::error::{Error, Result};
use crate::render::image::stroke_rect_inside;
use crate::render::{DrawSpace, PreviewSlot, RenderEngine};

/// Outline width for a blur region while it is being dragged
const BLUR_OUTLINE_WIDTH: f32 = 1.0;

#[derive(Debug)]
pub struct AnnotationModel {
    image: Option<CapturedImage>,
    display: Option<(u32, u32)>,
    /// Display size came from `set_display_size`, not from the loaded image
    display_pinned: bool,
    annotations: Vec<Annotation>,
    in_progress: Option<Annotation>,
    tool: Tool,
    color: ShapeColor,
    stroke_width: u32,
    /// Where the next text label goes, set when the text tool is pressed
    pending_text: Option<Point>,
    engine: RenderEngine,
    preview: Arc<PreviewSlot>,
}

impl AnnotationModel {
    pub fn new(engine: RenderEngine) -> Self {
        Self {
            image: None,
            display: None,
            display_pinned: false,
            annotations: Vec::new(),
            in_progress: None,
            tool: Tool::default(),
            color: ShapeColor::default(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            pending_text: None,
            engine,
            preview: Arc::new(PreviewSlot::new()),
        }
    }

    /// Model with the configured tool defaults and font search paths
    pub fn from_config(config: &AnnotatorConfig) -> Self {
        let mut model = Self::new(RenderEngine::new(&config.font_paths));
        model.set_active_tool(
            config.default_tool,
            Some(config.shape_color),
            Some(config.stroke_width),
        );
        model
    }

    /// Make `image` the active bitmap, discarding all edits on the previous one
    pub fn load_image(&mut self, image: CapturedImage) {
        log::debug!("Loading {}x{} image for annotation", image.width(), image.height());
        if !self.display_pinned {
            self.display = Some(image.dimensions());
        }
        self.image = Some(image);
        self.annotations.clear();
        self.in_progress = None;
        self.pending_text = None;
        self.preview.clear();
    }

    /// Size of the surface pointer input is reported in
    ///
    /// Stays in effect across later loads; without it the display tracks
    /// each loaded image's own size.
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display = Some((width, height));
        self.display_pinned = true;
    }

    /// Switch tools; `None` keeps the current color or width
    pub fn set_active_tool(&mut self, tool: Tool, color: Option<ShapeColor>, width: Option<u32>) {
        self.tool = tool;
        if let Some(color) = color {
            self.color = color;
        }
        match width {
            Some(0) => log::debug!("Ignoring zero stroke width"),
            Some(width) => self.stroke_width = width,
            None => {}
        }
    }

    /// Pointer pressed
    pub fn begin_stroke(&mut self, point: Point) {
        if self.image.is_none() {
            return;
        }
        if !self.tool.is_stroke() {
            self.pending_text = Some(point);
            return;
        }
        self.in_progress = Annotation::stroke(self.tool, point, self.color, self.stroke_width);
    }

    /// Pointer dragged
    pub fn update_stroke(&mut self, point: Point) {
        if let Some(annotation) = self.in_progress.as_mut() {
            annotation.set_end(point);
        }
    }

    /// Pointer released
    ///
    /// Blur strokes are applied to the pixel buffer right away and never
    /// enter the annotation set, so they cannot be undone.
    pub fn end_stroke(&mut self, point: Point) -> Result<()> {
        let Some(mut annotation) = self.in_progress.take() else {
            return Ok(());
        };
        annotation.set_end(point);

        if let Annotation::Blur(region) = &annotation {
            let display = self.display_size();
            if let Some(image) = self.image.as_mut() {
                self.engine.apply_blur(image, region, display)?;
            }
            return Ok(());
        }

        log::debug!("Added {:?} annotation", annotation.tool());
        self.annotations.push(annotation);
        Ok(())
    }

    /// Place a text label at the pending position
    ///
    /// Returns false when no text position is pending or `text` is blank.
    pub fn add_text_annotation(&mut self, text: &str) -> bool {
        let Some(position) = self.pending_text else {
            return false;
        };
        let Some(label) = Annotation::text(position, text, self.color, self.stroke_width) else {
            return false;
        };
        self.annotations.push(label);
        self.pending_text = None;
        true
    }

    pub fn undo_last(&mut self) -> Option<Annotation> {
        self.annotations.pop()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.in_progress = None;
    }

    /// Drop all annotations and any outstanding text request
    pub fn cancel(&mut self) {
        self.clear();
        self.pending_text = None;
    }

    /// Composite the display-space preview and publish it
    ///
    /// Returns false when there is nothing to show.
    pub fn render_preview(&self) -> bool {
        let Some(image) = self.image.as_ref() else {
            return false;
        };
        let mut raster = self
            .engine
            .render_preview(image, &self.annotations, self.display_size());

        let space = DrawSpace::preview();
        match &self.in_progress {
            Some(Annotation::Blur(region)) => {
                let rect = space.rect(region.start, region.end);
                stroke_rect_inside(&mut raster, rect, BLUR_OUTLINE_WIDTH, region.color.to_rgba_u8());
            }
            Some(annotation) => self.engine.draw(&mut raster, annotation, &space),
            None => {}
        }
        if let Some(position) = self.pending_text {
            self.engine.draw_text_marker(&mut raster, position, self.color);
        }

        self.preview.publish(raster);
        true
    }

    /// Slot the paint path reads the latest preview from
    pub fn preview_slot(&self) -> Arc<PreviewSlot> {
        Arc::clone(&self.preview)
    }

    /// Burn the annotation set into a full-resolution copy of the image
    pub fn render_final(&self) -> Result<RgbaImage> {
        let image = self.image.as_ref().ok_or(Error::NoImage)?;
        self.engine
            .render_final(image, &self.annotations, self.display_size())
    }

    /// Final raster for saving; the annotation set starts over afterwards
    pub fn take_for_save(&mut self) -> Result<RgbaImage> {
        let raster = self.render_final()?;
        self.clear();
        Ok(raster)
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn in_progress(&self) -> Option<&Annotation> {
        self.in_progress.as_ref()
    }

    pub fn pending_text(&self) -> Option<Point> {
        self.pending_text
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> ShapeColor {
        self.color
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    /// Editing surface size; (0, 0) until an image or size is set
    pub fn display_size(&self) -> (u32, u32) {
        self.display.unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FontFace;
    use image::Rgba;

    fn model() -> AnnotationModel {
        AnnotationModel::new(RenderEngine::with_font(FontFace::Builtin))
    }

    fn checkerboard(w: u32, h: u32) -> CapturedImage {
        CapturedImage::new(RgbaImage::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }))
        .unwrap()
    }

    fn drag(model: &mut AnnotationModel, from: (f32, f32), to: (f32, f32)) -> Result<()> {
        model.begin_stroke(Point::new(from.0, from.1));
        model.update_stroke(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        model.end_stroke(Point::new(to.0, to.1))
    }

    #[test]
    fn test_no_image_ignores_input() {
        let mut m = model();
        m.begin_stroke(Point::new(1.0, 1.0));
        assert!(m.in_progress().is_none());
        m.end_stroke(Point::new(5.0, 5.0)).unwrap();
        assert!(m.annotations().is_empty());
        assert!(matches!(m.render_final(), Err(Error::NoImage)));
        assert!(!m.render_preview());
    }

    #[test]
    fn test_stroke_appended_with_end_point() {
        let mut m = model();
        m.load_image(checkerboard(40, 40));
        assert_eq!(m.display_size(), (40, 40));

        m.set_active_tool(Tool::Box, Some(ShapeColor::WHITE), Some(4));
        drag(&mut m, (2.0, 3.0), (20.0, 30.0)).unwrap();

        assert!(m.in_progress().is_none());
        let [Annotation::Box(b)] = m.annotations() else {
            panic!("expected one box, got {:?}", m.annotations());
        };
        assert_eq!(b.start, Point::new(2.0, 3.0));
        assert_eq!(b.end, Point::new(20.0, 30.0));
        assert_eq!(b.color, ShapeColor::WHITE);
        assert_eq!(b.stroke_width, 4);
    }

    #[test]
    fn test_zero_width_ignored() {
        let mut m = model();
        m.set_active_tool(Tool::Arrow, None, Some(0));
        assert_eq!(m.stroke_width(), DEFAULT_STROKE_WIDTH);
        assert_eq!(m.color(), ShapeColor::default());
    }

    #[test]
    fn test_text_flow() {
        let mut m = model();
        m.load_image(checkerboard(40, 40));
        assert!(!m.add_text_annotation("orphan"));

        m.set_active_tool(Tool::Text, None, None);
        m.begin_stroke(Point::new(5.0, 6.0));
        assert!(m.in_progress().is_none());
        assert_eq!(m.pending_text(), Some(Point::new(5.0, 6.0)));

        assert!(!m.add_text_annotation("   "));
        assert!(m.add_text_annotation("Bug here"));
        assert!(m.pending_text().is_none());
        assert!(!m.add_text_annotation("again"));

        let [Annotation::Text(t)] = m.annotations() else {
            panic!("expected one label");
        };
        assert_eq!(t.text, "Bug here");
        assert_eq!(t.position, Point::new(5.0, 6.0));
    }

    #[test]
    fn test_blur_is_immediate_and_not_undoable() {
        let mut m = model();
        m.load_image(checkerboard(100, 100));
        let before = m.image().unwrap().rgba.clone();

        m.set_active_tool(Tool::Blur, None, None);
        drag(&mut m, (10.0, 10.0), (60.0, 60.0)).unwrap();

        assert!(m.annotations().is_empty());
        let after = &m.image().unwrap().rgba;
        assert_ne!(after.get_pixel(30, 30), before.get_pixel(30, 30));
        assert_eq!(after.get_pixel(80, 80), before.get_pixel(80, 80));

        assert!(m.undo_last().is_none());
        assert_ne!(&m.image().unwrap().rgba, &before);
    }

    #[test]
    fn test_blur_with_degenerate_display_fails() {
        let mut m = model();
        m.load_image(checkerboard(20, 20));
        m.set_display_size(0, 20);
        m.set_active_tool(Tool::Blur, None, None);
        let err = drag(&mut m, (1.0, 1.0), (10.0, 10.0)).unwrap_err();
        assert!(matches!(err, Error::DegenerateTransform { .. }));
    }

    #[test]
    fn test_undo_clear_and_cancel() {
        let mut m = model();
        m.load_image(checkerboard(40, 40));
        drag(&mut m, (1.0, 1.0), (10.0, 10.0)).unwrap();
        drag(&mut m, (2.0, 2.0), (20.0, 20.0)).unwrap();
        assert_eq!(m.annotations().len(), 2);

        let undone = m.undo_last().unwrap();
        assert_eq!(undone.start(), Point::new(2.0, 2.0));
        assert_eq!(m.annotations().len(), 1);

        m.clear();
        assert!(m.annotations().is_empty());

        m.set_active_tool(Tool::Text, None, None);
        m.begin_stroke(Point::new(3.0, 3.0));
        m.cancel();
        assert!(m.pending_text().is_none());
    }

    #[test]
    fn test_load_image_resets_edits() {
        let mut m = model();
        m.load_image(checkerboard(40, 40));
        drag(&mut m, (1.0, 1.0), (10.0, 10.0)).unwrap();
        m.begin_stroke(Point::new(4.0, 4.0));

        m.load_image(checkerboard(30, 30));
        assert!(m.annotations().is_empty());
        assert!(m.in_progress().is_none());
        assert_eq!(m.display_size(), (30, 30));
    }

    #[test]
    fn test_display_follows_image_until_set() {
        let mut m = model();
        m.load_image(checkerboard(40, 40));
        m.load_image(checkerboard(80, 20));
        assert_eq!(m.display_size(), (80, 20));

        // A box over the whole second image must cover it at scale 1
        m.set_active_tool(Tool::Box, None, Some(2));
        drag(&mut m, (0.0, 0.0), (80.0, 20.0)).unwrap();
        let out = m.render_final().unwrap();
        let edge = out.get_pixel(79, 10);
        assert!(edge[0] > 200 && edge[1] < 60 && edge[2] < 60, "edge pixel {edge:?}");

        m.set_display_size(40, 10);
        m.load_image(checkerboard(120, 30));
        assert_eq!(m.display_size(), (40, 10));
    }

    #[test]
    fn test_preview_published_at_display_size() {
        let mut m = model();
        m.load_image(checkerboard(200, 100));
        m.set_display_size(100, 50);
        m.set_active_tool(Tool::Blur, None, None);
        m.begin_stroke(Point::new(5.0, 5.0));
        m.update_stroke(Point::new(30.0, 30.0));

        let slot = m.preview_slot();
        assert!(slot.current().is_none());
        assert!(m.render_preview());
        assert_eq!(slot.current().unwrap().dimensions(), (100, 50));
    }

    #[test]
    fn test_take_for_save_clears_set() {
        let mut m = model();
        m.load_image(checkerboard(60, 40));
        m.set_display_size(30, 20);
        drag(&mut m, (1.0, 1.0), (10.0, 10.0)).unwrap();

        let raster = m.take_for_save().unwrap();
        assert_eq!(raster.dimensions(), (60, 40));
        assert!(m.annotations().is_empty());
    }
}
