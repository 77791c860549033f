//! Core domain types for psdpack.
//!
//! - `Vec2`, `IVec2`, `PixelBounds` - pixel and unit space geometry
//! - `SpriteSet` - one exported sprite with its layers and placement
//! - `AssetPack` - all sprites of a document plus its calibration

mod geometry;
mod sprite;

pub use geometry::{
    from_isometric, pixel_pos_to_unit_pos, to_isometric, unit_pos_to_pixel_pos, IVec2,
    PixelBounds, Vec2, ISO_X, ISO_Y, STANDARD_PPDU, STANDARD_PPU,
};
pub use sprite::{AssetPack, PositionStatus, SpriteSet};
