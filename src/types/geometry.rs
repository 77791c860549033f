//! Isometric projection and pixel bounding boxes.
//!
//! Pixel space is the PSD canvas: x to the right, y down, integer corners.
//! Unit space is the game's isometric grid. The two are related by a fixed
//! 2x2 basis scaled by the document's pixels-per-diagonal-unit (PPDU).

use std::f32::consts::SQRT_2;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Export resolution, in pixels per unit.
pub const STANDARD_PPU: f32 = 100.0;

/// PPDU assumed when a document has no `meta/ruler` layer.
pub const STANDARD_PPDU: f32 = SQRT_2 * STANDARD_PPU;

/// Pixel-space image of one unit along the grid's x axis.
pub const ISO_X: Vec2 = Vec2 {
    x: SQRT_2 / 2.0,
    y: SQRT_2 / SQRT_3 / 2.0,
};

/// Pixel-space image of one unit along the grid's y axis.
pub const ISO_Y: Vec2 = Vec2 {
    x: SQRT_2 / 2.0,
    y: -SQRT_2 / SQRT_3 / 2.0,
};

/// A 2D float vector, serialized as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

/// A 2D integer vector in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl Neg for IVec2 {
    type Output = IVec2;

    fn neg(self) -> IVec2 {
        IVec2::new(-self.x, -self.y)
    }
}

/// Map a unit-basis vector into pixel directions.
pub fn to_isometric(p: Vec2) -> Vec2 {
    Vec2::new(ISO_X.x * p.x + ISO_Y.x * p.y, ISO_X.y * p.x + ISO_Y.y * p.y)
}

/// Inverse of [`to_isometric`].
pub fn from_isometric(p: Vec2) -> Vec2 {
    let det = ISO_X.x * ISO_Y.y - ISO_Y.x * ISO_X.y;
    Vec2::new(
        (ISO_Y.y * p.x - ISO_Y.x * p.y) / det,
        (ISO_X.x * p.y - ISO_X.y * p.x) / det,
    )
}

/// Convert a pixel offset into unit space.
pub fn pixel_pos_to_unit_pos(pixel: Vec2, ppdu: f32) -> Vec2 {
    from_isometric(pixel) / (ppdu / SQRT_2)
}

/// Convert a unit-space offset into pixels. Exact inverse of
/// [`pixel_pos_to_unit_pos`].
pub fn unit_pos_to_pixel_pos(unit: Vec2, ppdu: f32) -> Vec2 {
    to_isometric(unit) * (ppdu / SQRT_2)
}

/// Axis-aligned pixel rectangle as `min` corner plus `size`.
///
/// [`PixelBounds::empty`] produces an inverted sentinel so that the first
/// [`PixelBounds::expand`] takes the expanded rectangle verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBounds {
    pub min: IVec2,
    pub size: IVec2,
}

impl PixelBounds {
    pub fn empty(canvas: IVec2) -> Self {
        Self {
            min: canvas,
            size: -canvas,
        }
    }

    pub fn max(&self) -> IVec2 {
        IVec2::new(self.min.x + self.size.x, self.min.y + self.size.y)
    }

    /// Grow to cover `(left, top, right, bottom)`, clamped to the canvas.
    pub fn expand(&mut self, rect: (i32, i32, i32, i32), canvas: IVec2) {
        let (left, top, right, bottom) = rect;
        let max = self.max();
        let min = IVec2::new(left.max(0).min(self.min.x), top.max(0).min(self.min.y));
        let max = IVec2::new(
            right.min(canvas.x).max(max.x),
            bottom.min(canvas.y).max(max.y),
        );
        self.min = min;
        self.size = IVec2::new(max.x - min.x, max.y - min.y);
    }

    /// True when no positive-area rectangle has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        let tolerance = 1e-3 * (1.0 + b.x.abs().max(b.y.abs()));
        assert!(
            (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_isometric_round_trip() {
        let points = [
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            Vec2::new(-37.5, 120.25),
            Vec2::new(4096.0, -2048.0),
            Vec2::new(0.001, 0.002),
        ];
        for ppdu in [1.0, 64.0, STANDARD_PPDU, 300.5] {
            for p in points {
                let unit = pixel_pos_to_unit_pos(p, ppdu);
                assert_close(unit_pos_to_pixel_pos(unit, ppdu), p);
            }
        }
    }

    #[test]
    fn test_from_isometric_inverts_basis() {
        assert_close(from_isometric(ISO_X), Vec2::new(1.0, 0.0));
        assert_close(from_isometric(ISO_Y), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_standard_ppdu_unit_length() {
        // One unit along x at the standard PPDU spans STANDARD_PPU * ISO_X
        let px = unit_pos_to_pixel_pos(Vec2::new(1.0, 0.0), STANDARD_PPDU);
        assert_close(px, ISO_X * STANDARD_PPU);
    }

    #[test]
    fn test_empty_bounds_take_first_rect() {
        let canvas = IVec2::new(100, 50);
        let mut bounds = PixelBounds::empty(canvas);
        assert!(bounds.is_empty());

        bounds.expand((10, 5, 30, 25), canvas);
        assert_eq!(bounds.min, IVec2::new(10, 5));
        assert_eq!(bounds.size, IVec2::new(20, 20));
    }

    #[test]
    fn test_bounds_union_and_clamp() {
        let canvas = IVec2::new(100, 50);
        let rects = [(10, 5, 30, 25), (-20, 20, 15, 80), (90, -4, 140, 10)];
        let mut bounds = PixelBounds::empty(canvas);
        for rect in rects {
            bounds.expand(rect, canvas);
        }

        assert_eq!(bounds.min, IVec2::new(0, 0));
        assert_eq!(bounds.max(), IVec2::new(100, 50));

        for (left, top, right, bottom) in rects {
            assert!(bounds.min.x <= left.max(0));
            assert!(bounds.min.y <= top.max(0));
            assert!(bounds.max().x >= right.min(canvas.x));
            assert!(bounds.max().y >= bottom.min(canvas.y));
        }
    }

    #[test]
    fn test_bounds_off_canvas_stays_empty() {
        let canvas = IVec2::new(10, 10);
        let mut bounds = PixelBounds::empty(canvas);
        bounds.expand((20, 20, 30, 30), canvas);
        assert!(bounds.is_empty());
    }
}
