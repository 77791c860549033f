//! The `.assetpack` manifest: pivots and materials read by the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};
use crate::render::WRITE_HELP;
use crate::types::{unit_pos_to_pixel_pos, AssetPack, SpriteSet, Vec2};

/// Light slot label used when a slot is empty.
pub const NO_LIGHT: &str = "(none)";

/// Normalized anchor of one base texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotInfo {
    pub tex_path: String,
    pub pivot: Vec2,
}

/// One material per base texture.
///
/// Light slots are fixed at four; unused slots keep an empty path and the
/// `(none)` label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInfo {
    pub name: String,
    pub main_tex_path: String,
    #[serde(default)]
    pub emission_tex_path: String,
    #[serde(default)]
    pub light0_tex_path: String,
    #[serde(default = "no_light")]
    pub light0_message: String,
    #[serde(default)]
    pub light1_tex_path: String,
    #[serde(default = "no_light")]
    pub light1_message: String,
    #[serde(default)]
    pub light2_tex_path: String,
    #[serde(default = "no_light")]
    pub light2_message: String,
    #[serde(default)]
    pub light3_tex_path: String,
    #[serde(default = "no_light")]
    pub light3_message: String,
    pub base_position: Vec2,
    pub size: Vec2,
}

fn no_light() -> String {
    NO_LIGHT.to_string()
}

impl MaterialInfo {
    fn new(name: String, main_tex_path: String, base_position: Vec2, size: Vec2) -> Self {
        Self {
            name,
            main_tex_path,
            emission_tex_path: String::new(),
            light0_tex_path: String::new(),
            light0_message: no_light(),
            light1_tex_path: String::new(),
            light1_message: no_light(),
            light2_tex_path: String::new(),
            light2_message: no_light(),
            light3_tex_path: String::new(),
            light3_message: no_light(),
            base_position,
            size,
        }
    }

    /// Fill light slot `index`. Returns false when the slot does not exist.
    pub fn set_light(&mut self, index: usize, tex_path: String, message: String) -> bool {
        let (path, label) = match index {
            0 => (&mut self.light0_tex_path, &mut self.light0_message),
            1 => (&mut self.light1_tex_path, &mut self.light1_message),
            2 => (&mut self.light2_tex_path, &mut self.light2_message),
            3 => (&mut self.light3_tex_path, &mut self.light3_message),
            _ => return false,
        };
        *path = tex_path;
        *label = message;
        true
    }

    /// Light texture paths in slot order, empty slots included.
    pub fn light_tex_paths(&self) -> [&str; 4] {
        [
            &self.light0_tex_path,
            &self.light1_tex_path,
            &self.light2_tex_path,
            &self.light3_tex_path,
        ]
    }
}

/// Contents of an `.assetpack` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetPackManifest {
    pub pivots: Vec<PivotInfo>,
    pub materials: Vec<MaterialInfo>,
}

impl AssetPackManifest {
    /// Load a manifest written by `psdpack export`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PackError::io(path, format!("Failed to read asset pack: {}", e)))?;

        serde_json::from_str(&content).map_err(|e| PackError::Parse {
            message: format!("Invalid asset pack {}: {}", path.display(), e),
            help: Some("Re-export the pack with psdpack export".to_string()),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| PackError::Export {
            message: format!("Failed to serialize asset pack: {}", e),
            help: None,
        })?;

        std::fs::write(path, json).map_err(|e| PackError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write asset pack: {}", e),
            help: Some(WRITE_HELP.to_string()),
        })
    }

    /// Pivot recorded for a base texture.
    pub fn pivot_for(&self, tex_path: &str) -> Option<Vec2> {
        self.pivots
            .iter()
            .find(|p| p.tex_path == tex_path)
            .map(|p| p.pivot)
    }
}

/// Anchor of a sprite inside its own crop region, normalized to 0..1.
///
/// The anchor is the centre of the sprite's unit-space footprint. Y is
/// flipped because the engine measures texture coordinates from the bottom.
pub fn sprite_pivot(sprite: &SpriteSet, origin: Vec2, ppdu: f32) -> Vec2 {
    let anchor_unit = sprite.min_unit + sprite.size_unit / 2.0;
    let anchor_px = unit_pos_to_pixel_pos(anchor_unit, ppdu) + origin - sprite.bounds.min.as_vec2();
    let size = sprite.bounds.size.as_vec2();
    Vec2::new(anchor_px.x / size.x, 1.0 - anchor_px.y / size.y)
}

/// Build the manifest for every base part of every sprite, in pack order.
pub fn build_manifest(pack: &AssetPack) -> AssetPackManifest {
    let mut manifest = AssetPackManifest::default();

    for sprite in pack.sprites.values() {
        let pivot = sprite_pivot(sprite, pack.origin, pack.ppdu);
        for index in 0..sprite.part_count() {
            manifest.pivots.push(PivotInfo {
                tex_path: sprite.base_tex_path(index),
                pivot,
            });
        }
    }

    for sprite in pack.sprites.values() {
        for index in 0..sprite.part_count() {
            let mut material = MaterialInfo::new(
                sprite.material_name(index),
                sprite.base_tex_path(index),
                sprite.min_unit,
                sprite.size_unit,
            );
            for (light, name) in sprite.light_names.iter().enumerate() {
                material.set_light(light, sprite.light_tex_path(light), name.clone());
            }
            if sprite.emission_mask.is_some() {
                material.emission_tex_path = sprite.emission_tex_path();
            }
            manifest.materials.push(material);
        }
    }

    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IVec2, PixelBounds};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sprite(name: &str, parts: usize, bounds: PixelBounds) -> SpriteSet {
        let mut sprite = SpriteSet::new(name);
        sprite.base_layers = vec![Vec::new(); parts];
        sprite.bounds = bounds;
        sprite.size_unit = Vec2::ONE;
        sprite
    }

    fn bounds(x: i32, y: i32, w: i32, h: i32) -> PixelBounds {
        PixelBounds {
            min: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }

    #[test]
    fn test_pivot_centered() {
        // Unit square centred on the origin, crop region centred on it too
        let mut gem = sprite("Gem", 1, bounds(40, 40, 20, 20));
        gem.min_unit = Vec2::new(-0.5, -0.5);

        let pivot = sprite_pivot(&gem, Vec2::new(50.0, 50.0), 100.0);
        assert!((pivot.x - 0.5).abs() < 1e-5);
        assert!((pivot.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_pivot_y_flipped() {
        // Anchor at the top edge of the crop region maps to y = 1
        let gem = sprite("Gem", 1, bounds(0, 10, 10, 10));
        let mut at_top = gem.clone();
        at_top.min_unit = Vec2::ZERO;
        at_top.size_unit = Vec2::ZERO;

        let pivot = sprite_pivot(&at_top, Vec2::new(5.0, 10.0), 100.0);
        assert!((pivot.x - 0.5).abs() < 1e-5);
        assert!((pivot.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pivot_in_range_for_anchor_inside_bounds() {
        for (ox, oy) in [(10.0, 10.0), (30.0, 5.0), (1.0, 39.0), (39.0, 20.0)] {
            let mut s = sprite("Gem", 1, bounds(0, 0, 40, 40));
            s.min_unit = Vec2::ZERO;
            s.size_unit = Vec2::ZERO;
            let pivot = sprite_pivot(&s, Vec2::new(ox, oy), 141.42);
            assert!((0.0..=1.0).contains(&pivot.x), "x out of range: {:?}", pivot);
            assert!((0.0..=1.0).contains(&pivot.y), "y out of range: {:?}", pivot);
        }
    }

    #[test]
    fn test_single_part_manifest() {
        let mut pack = AssetPack::new(100, 100);
        let mut gem = sprite("red gem", 1, bounds(0, 0, 10, 10));
        gem.light_layers.push(Vec::new());
        gem.light_names.push("glow".to_string());
        gem.emission_mask = Some(Vec::new());
        pack.sprites.insert("red gem".to_string(), gem);

        let manifest = build_manifest(&pack);
        assert_eq!(manifest.pivots.len(), 1);
        assert_eq!(manifest.pivots[0].tex_path, "RedGem_base0.png");

        let material = &manifest.materials[0];
        assert_eq!(material.name, "RedGem");
        assert_eq!(material.main_tex_path, "RedGem_base0.png");
        assert_eq!(material.emission_tex_path, "RedGem_emission.png");
        assert_eq!(material.light_tex_paths(), ["RedGem_L0.png", "", "", ""]);
        assert_eq!(material.light0_message, "glow");
        assert_eq!(material.light1_message, "(none)");
        assert_eq!(material.size, Vec2::ONE);
    }

    #[test]
    fn test_multi_part_manifest() {
        let mut pack = AssetPack::new(100, 100);
        pack.sprites.insert("Rock".to_string(), sprite("Rock", 2, bounds(0, 0, 10, 10)));

        let manifest = build_manifest(&pack);
        let names: Vec<&str> = manifest.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Rock_part0", "Rock_part1"]);

        let textures: Vec<&str> = manifest.pivots.iter().map(|p| p.tex_path.as_str()).collect();
        assert_eq!(textures, vec!["Rock_base0.png", "Rock_base1.png"]);
        assert_eq!(manifest.pivots[0].pivot, manifest.pivots[1].pivot);
    }

    #[test]
    fn test_manifest_sorted_by_sprite_name() {
        let mut pack = AssetPack::new(100, 100);
        for name in ["Tree", "Bush", "Rock"] {
            pack.sprites.insert(name.to_string(), sprite(name, 1, bounds(0, 0, 10, 10)));
        }

        let manifest = build_manifest(&pack);
        let names: Vec<&str> = manifest.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bush", "Rock", "Tree"]);
    }

    #[test]
    fn test_json_field_names() {
        let mut material = MaterialInfo::new("Gem".into(), "Gem_base0.png".into(), Vec2::ZERO, Vec2::ONE);
        assert!(material.set_light(3, "Gem_L3.png".into(), "rim".into()));
        assert!(!material.set_light(4, "Gem_L4.png".into(), "extra".into()));

        let json = serde_json::to_string(&material).unwrap();
        assert!(json.contains("\"mainTexPath\":\"Gem_base0.png\""));
        assert!(json.contains("\"emissionTexPath\":\"\""));
        assert!(json.contains("\"light3TexPath\":\"Gem_L3.png\""));
        assert!(json.contains("\"light3Message\":\"rim\""));
        assert!(json.contains("\"light0Message\":\"(none)\""));
        assert!(json.contains("\"basePosition\":{\"x\":0.0,\"y\":0.0}"));
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Island.assetpack");

        let mut pack = AssetPack::new(100, 100);
        pack.sprites.insert("Gem".to_string(), sprite("Gem", 1, bounds(0, 0, 10, 10)));
        let manifest = build_manifest(&pack);
        manifest.write(&path).unwrap();

        let loaded = AssetPackManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.pivot_for("Gem_base0.png"), Some(manifest.pivots[0].pivot));
        assert_eq!(loaded.pivot_for("Missing_base0.png"), None);
    }

    #[test]
    fn test_load_defaults_missing_light_slots() {
        let json = r#"{
            "pivots": [],
            "materials": [{
                "name": "Gem",
                "mainTexPath": "Gem_base0.png",
                "basePosition": {"x": 0, "y": 0},
                "size": {"x": 1, "y": 1}
            }]
        }"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.assetpack");
        std::fs::write(&path, json).unwrap();

        let loaded = AssetPackManifest::load(&path).unwrap();
        assert_eq!(loaded.materials[0].light2_message, "(none)");
        assert_eq!(loaded.materials[0].emission_tex_path, "");
    }
}
