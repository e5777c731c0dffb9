//! Raster primitives for annotations using tiny-skia
//!
//! These functions draw onto an `RgbaImage` in whatever coordinate space the
//! caller has already mapped into.

use image::{RgbaImage, imageops};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::domain::Rect;

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    // Copy back
    img.copy_from_slice(pixmap.data());
}

fn solid_paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Stroke a straight segment with rounded caps
pub fn stroke_line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32, color: [u8; 4]) {
    let mut pb = PathBuilder::new();
    pb.move_to(from.0, from.1);
    pb.line_to(to.0, to.1);
    let Some(path) = pb.finish() else {
        return;
    };

    with_pixmap(img, |pixmap| {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    });
}

/// Outline `rect` with a stroke that lies entirely inside it
///
/// The outer edge of the stroke coincides with the rectangle, so the drawn
/// bounding box is exactly `rect`. Rectangles thinner than two strokes are
/// filled.
pub fn stroke_rect_inside(img: &mut RgbaImage, rect: Rect, width: f32, color: [u8; 4]) {
    if rect.is_empty() {
        return;
    }
    let (left, top) = (rect.left as f32, rect.top as f32);
    let (right, bottom) = (rect.right as f32, rect.bottom as f32);

    if width * 2.0 >= rect.width() as f32 || width * 2.0 >= rect.height() as f32 {
        fill_rect(img, (left, top, right, bottom), color);
        return;
    }

    let half = width / 2.0;
    let mut pb = PathBuilder::new();
    pb.move_to(left + half, top + half);
    pb.line_to(right - half, top + half);
    pb.line_to(right - half, bottom - half);
    pb.line_to(left + half, bottom - half);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    with_pixmap(img, |pixmap| {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    });
}

/// Fill the rectangle given as (left, top, right, bottom)
pub fn fill_rect(img: &mut RgbaImage, (left, top, right, bottom): (f32, f32, f32, f32), color: [u8; 4]) {
    let Some(rect) = tiny_skia::Rect::from_ltrb(left, top, right, bottom) else {
        return;
    };
    with_pixmap(img, |pixmap| {
        pixmap.fill_rect(rect, &solid_paint(color), Transform::identity(), None);
    });
}

/// Fill a triangle
pub fn fill_triangle(img: &mut RgbaImage, points: [(f32, f32); 3], color: [u8; 4]) {
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].0, points[0].1);
    pb.line_to(points[1].0, points[1].1);
    pb.line_to(points[2].0, points[2].1);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };
    with_pixmap(img, |pixmap| {
        pixmap.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    });
}

/// Small ring marking a pending text position
pub fn stroke_ring(img: &mut RgbaImage, center: (f32, f32), radius: f32, width: f32, color: [u8; 4]) {
    let Some(path) = PathBuilder::from_circle(center.0, center.1, radius) else {
        return;
    };
    with_pixmap(img, |pixmap| {
        let stroke = Stroke {
            width,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    });
}

/// Gaussian-blur the pixels inside `rect`, leaving everything else untouched
///
/// Returns false when the rectangle does not overlap the image.
pub fn blur_region(img: &mut RgbaImage, rect: Rect, radius: f32) -> bool {
    let bounds = Rect {
        left: 0,
        top: 0,
        right: img.width() as i32,
        bottom: img.height() as i32,
    };
    let Some(region) = rect.intersect(bounds) else {
        return false;
    };

    let (x, y) = (region.left as u32, region.top as u32);
    let (w, h) = (region.width() as u32, region.height() as u32);
    let crop = imageops::crop_imm(&*img, x, y, w, h).to_image();
    let blurred = imageops::blur(&crop, radius);
    imageops::replace(img, &blurred, x as i64, y as i64);
    true
}
