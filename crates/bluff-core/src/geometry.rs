//! Face regions in source (video) coordinates.
//!
//! The detector may report a plain bounding box, landmark points, or both.
//! Downstream code only ever sees a [`BoundingBox`]; which representation it
//! came from is decided per frame by the caller.

use serde::{Deserialize, Serialize};

/// Per-frame box smoothing factor. Larger than the confidence factor so the
/// overlay follows the face quickly while the label stays steady.
pub const DEFAULT_BOX_ALPHA: f32 = 0.3;

/// Margin added around the landmark extent, as a fraction of that extent per side.
pub const DEFAULT_LANDMARK_MARGIN: f32 = 0.1;

/// Landmark point, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f32, pub f32);

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tight box around landmark points, widened by `margin` on every side.
    ///
    /// # Arguments
    ///
    /// * `points` — Landmark positions from a single frame, in any order.
    /// * `margin` — Fraction of the extent added to each side of each axis
    ///   (0.1 grows a 100 px wide extent to 120 px).
    ///
    /// # Returns
    ///
    /// `None` if `points` is empty.
    pub fn from_landmarks(points: &[Point], margin: f32) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);

        for p in &points[1..] {
            min_x = min_x.min(p.0);
            min_y = min_y.min(p.1);
            max_x = max_x.max(p.0);
            max_y = max_y.max(p.1);
        }

        let width = max_x - min_x;
        let height = max_y - min_y;
        let margin_x = width * margin;
        let margin_y = height * margin;

        Some(Self {
            x: min_x - margin_x,
            y: min_y - margin_y,
            width: width + 2.0 * margin_x,
            height: height + 2.0 * margin_y,
        })
    }

    /// Interpolate every field toward `target` by `t` (0 keeps `self`, 1 jumps to `target`).
    pub fn lerp(&self, target: &BoundingBox, t: f32) -> Self {
        Self {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
            width: self.width + (target.width - self.width) * t,
            height: self.height + (target.height - self.height) * t,
        }
    }
}
