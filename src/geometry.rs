//! Geometry primitives in bitmap-pixel space.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, top-left origin, in bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width (never negative)
    pub width: f32,
    /// Height (never negative)
    pub height: f32,
}

impl Rect {
    /// Create a rectangle. Negative extents are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Smallest rectangle containing all the given points.
    pub fn bounding(points: &[(f32, f32)]) -> Self {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for &(px, py) in points {
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
        }
        if points.is_empty() {
            return Self::default();
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area in square pixels.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Bounding union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Whether the vertical spans of two rectangles overlap.
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }

    /// Whether two rectangles share a region of positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.overlaps_vertically(other) && self.x < other.right() && other.x < self.right()
    }

    /// Integer pixel window `(x, y, width, height)` of this rectangle clipped
    /// to a `width × height` bitmap. Edges are expanded outward to whole pixels.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the bitmap.
    pub fn pixel_window(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.floor().max(0.0);
        let top = self.y.floor().max(0.0);
        let right = self.right().ceil().min(width as f32);
        let bottom = self.bottom().ceil().min(height as f32);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// A 2D affine transform `[a, b, c, d, e, f]` in PDF matrix convention:
/// `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f32; 6]);

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Map a point through the transform.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = next.0;
        Transform([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    /// A pure translation.
    pub fn translation(tx: f32, ty: f32) -> Transform {
        Transform([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Horizontal translation component.
    pub fn translate_x(&self) -> f32 {
        self.0[4]
    }

    /// Vertical translation component.
    pub fn translate_y(&self) -> f32 {
        self.0[5]
    }

    /// Vertical scale component (`d`).
    pub fn vertical_scale(&self) -> f32 {
        self.0[3]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Mapping from a page's PDF user space to rendered bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Bitmap width in pixels
    pub width: f32,
    /// Bitmap height in pixels
    pub height: f32,
    /// User-space to pixel scale factor
    pub scale: f32,
    /// The full affine mapping (includes the Y flip)
    pub transform: Transform,
}

impl Viewport {
    /// Build the viewport for a page `MediaBox` `[x0, y0, x1, y1]` at `scale`.
    ///
    /// PDF user space grows upward, bitmap space grows downward, so the
    /// transform flips Y around the top of the media box.
    pub fn from_media_box(media_box: [f32; 4], scale: f32) -> Self {
        let [x0, y0, x1, y1] = media_box;
        Self {
            width: (x1 - x0).abs() * scale,
            height: (y1 - y0).abs() * scale,
            scale,
            transform: Transform([scale, 0.0, 0.0, -scale, -x0 * scale, y1 * scale]),
        }
    }

    /// Bitmap dimensions rounded up to whole pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.ceil() as u32, self.height.ceil() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_overlap() {
        let a = Rect::new(10.0, 100.0, 50.0, 12.0);
        let b = Rect::new(62.0, 102.0, 40.0, 12.0);
        let u = a.union(&b);
        assert_eq!(u.x, 10.0);
        assert_eq!(u.right(), 102.0);
        assert_eq!(u.bottom(), 114.0);
        assert!(a.overlaps_vertically(&b));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_bounding_handles_flipped_points() {
        let r = Rect::bounding(&[(30.0, 80.0), (10.0, 20.0), (30.0, 20.0), (10.0, 80.0)]);
        assert_eq!(r, Rect::new(10.0, 20.0, 20.0, 60.0));
    }

    #[test]
    fn test_pixel_window_clipping() {
        let r = Rect::new(-5.0, 90.5, 20.0, 20.0);
        assert_eq!(r.pixel_window(100, 100), Some((0, 90, 15, 10)));
        assert_eq!(Rect::new(200.0, 0.0, 10.0, 10.0).pixel_window(100, 100), None);
    }

    #[test]
    fn test_transform_composition_order() {
        let scale = Transform([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let shift = Transform::translation(10.0, 5.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 7.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 12.0));
        assert_eq!(Transform::IDENTITY.then(&shift), shift);
    }

    #[test]
    fn test_viewport_flips_y() {
        let vp = Viewport::from_media_box([0.0, 0.0, 612.0, 792.0], 1.5);
        assert_eq!(vp.pixel_size(), (918, 1188));
        let (x, y) = vp.transform.apply(100.0, 700.0);
        assert!((x - 150.0).abs() < 1e-3);
        assert!((y - 138.0).abs() < 1e-3);
    }
}
