//! Assembled sprites and the asset pack that owns them.

use std::collections::BTreeMap;

use crate::classify::{join_tokens, split_tokens};

use super::geometry::{IVec2, PixelBounds, Vec2, STANDARD_PPDU};

/// How much of a sprite's unit-space placement has been read so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// No metadata layer seen yet.
    NotParsed,
    /// A two-number name gave the size; a `corner` layer must supply the position.
    ParsedSizeOnly,
    /// Position and size are both known.
    ParseDone,
}

/// One exported sprite: its pixel layers plus placement.
///
/// All pixel buffers are canvas-sized. Base and light buffers are RGBA, the
/// emission mask holds the alpha channel only.
#[derive(Debug, Clone, Default)]
pub struct SpriteSet {
    pub name: String,
    pub base_layers: Vec<Vec<u8>>,
    pub light_layers: Vec<Vec<u8>>,
    /// Parallel to `light_layers`; shown as tooltips in the engine.
    pub light_names: Vec<String>,
    pub emission_mask: Option<Vec<u8>>,
    pub bounds: PixelBounds,
    /// Relative to the document origin, in units.
    pub min_unit: Vec2,
    pub size_unit: Vec2,
}

impl SpriteSet {
    /// Light texture slots available per material.
    pub const MAX_LIGHTS: usize = 4;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// File-system safe name: "red crystal" becomes "RedCrystal".
    pub fn base_name(&self) -> String {
        join_tokens(&split_tokens(&self.name, ' '))
    }

    /// Number of base parts, one material each.
    pub fn part_count(&self) -> usize {
        self.base_layers.len()
    }

    pub fn is_multi_part(&self) -> bool {
        self.base_layers.len() > 1
    }

    pub fn base_tex_path(&self, index: usize) -> String {
        format!("{}_base{}.png", self.base_name(), index)
    }

    pub fn light_tex_path(&self, index: usize) -> String {
        format!("{}_L{}.png", self.base_name(), index)
    }

    pub fn emission_tex_path(&self) -> String {
        format!("{}_emission.png", self.base_name())
    }

    /// Material name for one base part; only multi-part sprites get a suffix.
    pub fn material_name(&self, index: usize) -> String {
        if self.is_multi_part() {
            format!("{}_part{}", self.base_name(), index)
        } else {
            self.base_name()
        }
    }

    /// Texture name used by layout exports.
    ///
    /// `&` stands in for the path separator between pack and sprite, and `#`
    /// terminates the sprite path so layer names can carry a suffix.
    pub fn layout_png_path(&self, pack_name: &str, index: usize) -> String {
        format!("{}&{}#.png", pack_name, self.material_name(index))
    }
}

/// Every sprite read from one document, plus the document calibration.
#[derive(Debug, Clone)]
pub struct AssetPack {
    /// Keyed by sprite folder name; iteration order is the export order.
    pub sprites: BTreeMap<String, SpriteSet>,
    pub width: u32,
    pub height: u32,
    /// `meta/origin` centre, in canvas pixels.
    pub origin: Vec2,
    /// Pixels per diagonal unit, from `meta/ruler N`.
    pub ppdu: f32,
}

impl AssetPack {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sprites: BTreeMap::new(),
            width,
            height,
            origin: Vec2::ZERO,
            ppdu: STANDARD_PPDU,
        }
    }

    pub fn canvas(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    /// Sprites that ended the scan without any base layer.
    pub fn sprites_without_base(&self) -> impl Iterator<Item = &SpriteSet> {
        self.sprites.values().filter(|s| s.base_layers.is_empty())
    }

    /// A pack is exportable only when every sprite has a base layer.
    pub fn is_valid(&self) -> bool {
        self.sprites_without_base().next().is_none()
    }
}
