//! Glyph rendering for text labels
//!
//! Fonts are resolved once from an ordered list of paths. When none of them
//! loads, labels are drawn with a small built-in bitmap font, so text
//! rendering never fails.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::RgbaImage;

/// Font used for text labels
pub enum FontFace {
    Outline { font: FontVec, source: PathBuf },
    Builtin,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Outline { source, .. } => f.debug_tuple("Outline").field(source).finish(),
            FontFace::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontFace {
    /// Use the first font in `paths` that loads, else the built-in font
    pub fn resolve(paths: &[PathBuf]) -> Self {
        for path in paths {
            match load_font(path) {
                Some(font) => {
                    log::debug!("Using font {:?} for text labels", path);
                    return FontFace::Outline {
                        font,
                        source: path.clone(),
                    };
                }
                None => log::debug!("Font unavailable: {:?}", path),
            }
        }
        log::debug!("No system font found, using built-in bitmap font");
        FontFace::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Builtin)
    }

    /// Height of one line of text at `px`
    pub fn line_height(&self, px: f32) -> f32 {
        match self {
            FontFace::Outline { font, .. } => {
                let scaled = font.as_scaled(PxScale::from(px));
                scaled.ascent() - scaled.descent() + scaled.line_gap()
            }
            FontFace::Builtin => builtin::unit(px) * builtin::LINE_UNITS as f32,
        }
    }

    /// Width and height of the (possibly multi-line) text block
    pub fn measure(&self, text: &str, px: f32) -> (f32, f32) {
        let line_height = self.line_height(px);
        let mut width: f32 = 0.0;
        let mut lines = 0;
        for line in text.lines() {
            width = width.max(self.line_width(line, px));
            lines += 1;
        }
        (width, line_height * lines.max(1) as f32)
    }

    fn line_width(&self, line: &str, px: f32) -> f32 {
        match self {
            FontFace::Outline { font, .. } => {
                let scaled = font.as_scaled(PxScale::from(px));
                let mut caret = 0.0;
                let mut last = None;
                for c in line.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = last {
                        caret += scaled.kern(prev, id);
                    }
                    caret += scaled.h_advance(id);
                    last = Some(id);
                }
                caret
            }
            FontFace::Builtin => {
                builtin::unit(px) * (line.chars().count() * builtin::ADVANCE_UNITS) as f32
            }
        }
    }

    /// Draw `text` with its top-left corner at (`x`, `y`)
    pub fn draw(&self, img: &mut RgbaImage, text: &str, x: f32, y: f32, px: f32, color: [u8; 4]) {
        let line_height = self.line_height(px);
        for (i, line) in text.lines().enumerate() {
            let top = y + i as f32 * line_height;
            match self {
                FontFace::Outline { font, .. } => draw_outline_line(img, font, line, x, top, px, color),
                FontFace::Builtin => builtin::draw_line(img, line, x, top, px, color),
            }
        }
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    FontVec::try_from_vec(bytes).ok()
}

fn draw_outline_line(
    img: &mut RgbaImage,
    font: &FontVec,
    line: &str,
    x: f32,
    top: f32,
    px: f32,
    color: [u8; 4],
) {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);
    let baseline = top + scaled.ascent();
    let mut caret = x;
    let mut last = None;

    for c in line.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = last {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        last = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            blend_pixel(img, px, py, color, coverage);
        });
    }
}

/// Alpha-blend `color` onto one pixel with the given coverage
pub(crate) fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: [u8; 4], coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * color[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let pixel = img.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let dst = pixel[c] as f32;
        pixel[c] = (dst + (color[c] as f32 - dst) * alpha).round() as u8;
    }
    let dst_a = pixel[3] as f32;
    pixel[3] = (dst_a + (255.0 - dst_a) * alpha).round() as u8;
}

/// 5x7 bitmap font covering ASCII letters, digits and common punctuation
mod builtin {
    use image::RgbaImage;

    /// Horizontal cells per character (5 glyph columns + 1 spacing)
    pub const ADVANCE_UNITS: usize = 6;
    /// Vertical cells per line (7 glyph rows + 2 spacing)
    pub const LINE_UNITS: usize = 9;

    /// Size of one font cell in pixels
    pub fn unit(px: f32) -> f32 {
        (px / LINE_UNITS as f32).max(1.0)
    }

    pub fn draw_line(img: &mut RgbaImage, line: &str, x: f32, top: f32, px: f32, color: [u8; 4]) {
        let unit = unit(px);
        for (i, c) in line.chars().enumerate() {
            let left = x + (i * ADVANCE_UNITS) as f32 * unit;
            // One spacing row above the glyph
            let glyph_top = top + unit;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..5 {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    fill_cell(img, left + col as f32 * unit, glyph_top + row as f32 * unit, unit, color);
                }
            }
        }
    }

    fn fill_cell(img: &mut RgbaImage, x: f32, y: f32, unit: f32, color: [u8; 4]) {
        let x0 = x.round() as i32;
        let y0 = y.round() as i32;
        let x1 = (x + unit).round() as i32;
        let y1 = (y + unit).round() as i32;
        for py in y0..y1 {
            for px in x0..x1 {
                super::blend_pixel(img, px, py, color, 1.0);
            }
        }
    }

    fn glyph(c: char) -> [u8; 7] {
        match c.to_ascii_uppercase() {
            'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
            'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
            'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
            'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
            'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
            'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
            'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
            'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
            'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
            'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
            'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
            'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
            'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
            'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
            'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
            'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
            'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
            'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
            'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
            'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
            'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
            'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
            '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
            '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
            '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
            '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
            '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
            '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
            '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
            '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
            '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
            '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
            ' ' => [0x00; 7],
            '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
            ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
            ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
            ';' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08],
            '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
            '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
            '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
            '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
            '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
            '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
            '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
            '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
            ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
            '[' => [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E],
            ']' => [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E],
            '<' => [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02],
            '>' => [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08],
            '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
            '"' => [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00],
            '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
            '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
            '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
            '*' => [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00],
            '@' => [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E],
            // Hollow box for anything else
            _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
        }
    }
}
