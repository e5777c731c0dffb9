//! Shared geometry calculations for annotations
//!
//! This module contains constants and math shared between the display-space
//! preview and the full-resolution burn-in.

/// Arrow geometry constants
pub mod arrow {
    /// Arrowhead size in preview (display) pixels
    pub const PREVIEW_HEAD_SIZE: f32 = 15.0;
    /// Smallest arrowhead in final renders
    pub const FINAL_HEAD_MIN: f32 = 20.0;
    /// Arrowhead size per unit of display-to-image scale in final renders
    pub const FINAL_HEAD_BASE: f32 = 30.0;
    /// Half-width of the head's back edge relative to its length
    pub const HEAD_SPREAD: f32 = 0.5;
    /// Longest head relative to the shaft
    pub const MAX_HEAD_FRACTION: f32 = 0.7;

    /// Calculate the filled arrowhead triangle for a shaft from `start` to `end`
    ///
    /// Returns `[tip, back_left, back_right]`, or `None` for a zero-length
    /// shaft. The head is capped at `MAX_HEAD_FRACTION` of the shaft length.
    pub fn head_points(
        start: (f32, f32),
        end: (f32, f32),
        head_size: f32,
    ) -> Option<[(f32, f32); 3]> {
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f32::EPSILON {
            return None;
        }

        // Unit direction (start -> end) and its 90 degree rotation
        let (nx, ny) = (dx / length, dy / length);
        let (px, py) = (-ny, nx);
        let size = head_size.min(length * MAX_HEAD_FRACTION);

        let back_left = (
            end.0 - size * (nx + px * HEAD_SPREAD),
            end.1 - size * (ny + py * HEAD_SPREAD),
        );
        let back_right = (
            end.0 - size * (nx - px * HEAD_SPREAD),
            end.1 - size * (ny - py * HEAD_SPREAD),
        );
        Some([end, back_left, back_right])
    }

    /// Point where the shaft meets the head's back edge
    pub fn head_base(back_left: (f32, f32), back_right: (f32, f32)) -> (f32, f32) {
        (
            (back_left.0 + back_right.0) * 0.5,
            (back_left.1 + back_right.1) * 0.5,
        )
    }
}

/// Line width rules
pub mod stroke {
    /// Smallest final-render line width, scaled with resolution
    pub const MIN_WIDTH: f32 = 3.0;
    /// Ring drawn at a pending text position in the preview
    pub const MARKER_RADIUS: f32 = 5.0;
    pub const MARKER_WIDTH: f32 = 2.0;
}

/// Text label constants
pub mod text {
    pub const PREVIEW_FONT_SIZE: f32 = 18.0;
    pub const FINAL_FONT_MIN: f32 = 24.0;
    pub const FINAL_FONT_BASE: f32 = 32.0;
    /// Background padding around the glyph run, in display pixels
    pub const PADDING: f32 = 5.0;
}

/// Blur constants
pub mod blur {
    /// Gaussian radius, applied directly to the live pixel buffer
    pub const RADIUS: f32 = 15.0;
}
