//! Writing an assembled pack to disk.
//!
//! Every texture is cropped to its sprite's pixel bounds, scaled by one
//! pack-wide ratio so that the document's ruler maps to the export
//! resolution, and encoded as PNG. Asset pack exports also write the
//! `.assetpack` manifest next to the textures; layout exports write base
//! textures only, named so they can be placed into a layout document.

mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::{PackError, Result};
use crate::render::{crop, gray_image, resize, rgba_image, write_png, WRITE_HELP};
use crate::types::{AssetPack, SpriteSet, STANDARD_PPU};
use crate::validation::{Diagnostic, LogSink};

pub use manifest::{
    build_manifest, sprite_pivot, AssetPackManifest, MaterialInfo, PivotInfo, NO_LIGHT,
};

/// Extension of the manifest written next to the textures.
pub const MANIFEST_EXTENSION: &str = "assetpack";

/// Suffix appended to the output folder of layout exports.
pub const LAYOUT_SUFFIX: &str = " (layout)";

/// What an export writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Base, light and emission textures plus the manifest.
    #[default]
    AssetPack,
    /// Base textures only, named `<pack>&<sprite>#.png`.
    Layout,
}

/// Where and how to export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub destination: PathBuf,
    /// Output folder name; also names the manifest.
    pub name: String,
    /// Remove the output folder before writing.
    pub clean: bool,
    pub mode: ExportMode,
    /// Target pixels per unit.
    pub export_ppu: f32,
    pub filter: FilterType,
}

impl ExportOptions {
    pub fn new(destination: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            name: name.into(),
            clean: false,
            mode: ExportMode::AssetPack,
            export_ppu: STANDARD_PPU,
            filter: FilterType::CatmullRom,
        }
    }

    /// `<destination>/<name>`, with ` (layout)` appended in layout mode.
    pub fn output_dir(&self) -> PathBuf {
        match self.mode {
            ExportMode::AssetPack => self.destination.join(&self.name),
            ExportMode::Layout => self
                .destination
                .join(format!("{}{}", self.name, LAYOUT_SUFFIX)),
        }
    }
}

/// What an export wrote.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub textures: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub ratio: f32,
}

/// Scale that maps the document's pixels per diagonal unit onto `export_ppu`.
pub fn resize_ratio(ppdu: f32, export_ppu: f32) -> f32 {
    (std::f32::consts::SQRT_2 * export_ppu) / ppdu
}

/// Export a pack. Refuses packs that fail the base layer check and sprites
/// without any pixels on the canvas.
pub fn export_asset_pack(
    pack: &AssetPack,
    options: &ExportOptions,
    log: &mut dyn LogSink,
) -> Result<ExportSummary> {
    if !pack.is_valid() {
        let names: Vec<&str> = pack.sprites_without_base().map(|s| s.name.as_str()).collect();
        return Err(PackError::Validation {
            message: format!("sprite(s) without a base layer: {}", names.join(", ")),
            help: Some("Every sprite folder needs a base layer; nothing was exported".to_string()),
        });
    }

    if let Some(sprite) = pack.sprites.values().find(|s| s.bounds.is_empty()) {
        return Err(PackError::Export {
            message: format!("sprite '{}' has no pixels on the canvas", sprite.name),
            help: Some("Move the sprite's base layers inside the document bounds".to_string()),
        });
    }

    let output_dir = options.output_dir();
    if options.clean && output_dir.exists() {
        fs::remove_dir_all(&output_dir).map_err(|e| PackError::Io {
            path: output_dir.clone(),
            message: format!("Failed to clean output directory: {}", e),
            help: Some(WRITE_HELP.to_string()),
        })?;
    }
    fs::create_dir_all(&output_dir).map_err(|e| PackError::Io {
        path: output_dir.clone(),
        message: format!("Failed to create output directory: {}", e),
        help: Some(WRITE_HELP.to_string()),
    })?;

    let ratio = resize_ratio(pack.ppdu, options.export_ppu);
    if ratio > 1.0 {
        log.append(
            Diagnostic::warning(
                "psdpack::export::upscale",
                format!("resize ratio is {:.3} (>1); textures will be upscaled", ratio),
            )
            .with_help("Check the ruler layer in meta, or lower export_ppu"),
        );
    }

    let mut summary = ExportSummary {
        output_dir: output_dir.clone(),
        ratio,
        ..Default::default()
    };
    let writer = TextureWriter {
        pack,
        dir: &output_dir,
        ratio,
        filter: options.filter,
    };

    for sprite in pack.sprites.values() {
        match options.mode {
            ExportMode::AssetPack => {
                for (index, data) in sprite.base_layers.iter().enumerate() {
                    let path = writer.rgba(sprite, data, &sprite.base_tex_path(index))?;
                    summary.textures.push(path);
                }
                for (index, data) in sprite.light_layers.iter().enumerate() {
                    let path = writer.rgba(sprite, data, &sprite.light_tex_path(index))?;
                    summary.textures.push(path);
                }
                if let Some(mask) = &sprite.emission_mask {
                    let path = writer.mask(sprite, mask, &sprite.emission_tex_path())?;
                    summary.textures.push(path);
                }
            }
            ExportMode::Layout => {
                for (index, data) in sprite.base_layers.iter().enumerate() {
                    let name = sprite.layout_png_path(&options.name, index);
                    summary.textures.push(writer.rgba(sprite, data, &name)?);
                }
            }
        }
    }

    if options.mode == ExportMode::AssetPack {
        let path = output_dir.join(format!("{}.{}", options.name, MANIFEST_EXTENSION));
        build_manifest(pack).write(&path)?;
        summary.manifest = Some(path);
    }

    Ok(summary)
}

struct TextureWriter<'a> {
    pack: &'a AssetPack,
    dir: &'a Path,
    ratio: f32,
    filter: FilterType,
}

impl TextureWriter<'_> {
    fn rgba(&self, sprite: &SpriteSet, data: &[u8], file_name: &str) -> Result<PathBuf> {
        let (width, height) = region_size(sprite);
        let cropped = crop(data, self.pack.width, 4, &sprite.bounds);
        let image = rgba_image(cropped, width, height)?;
        self.write(image, file_name)
    }

    fn mask(&self, sprite: &SpriteSet, data: &[u8], file_name: &str) -> Result<PathBuf> {
        let (width, height) = region_size(sprite);
        let cropped = crop(data, self.pack.width, 1, &sprite.bounds);
        let image = gray_image(cropped, width, height)?;
        self.write(image, file_name)
    }

    fn write(&self, image: image::DynamicImage, file_name: &str) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        write_png(&resize(image, self.ratio, self.filter), &path)?;
        Ok(path)
    }
}

fn region_size(sprite: &SpriteSet) -> (u32, u32) {
    (sprite.bounds.size.x as u32, sprite.bounds.size.y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::read_asset_pack;
    use crate::psd::DocumentBuilder;
    use crate::types::{IVec2, PixelBounds, Vec2, STANDARD_PPDU};
    use crate::validation::ValidationResult;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    /// A 100x100 canvas with one sprite "red gem" covering (40,40)-(60,60).
    fn gem_pack() -> AssetPack {
        let mut builder = DocumentBuilder::new(100, 100);
        builder.group("export", |b| {
            b.group("meta", |b| {
                b.raster("origin", (49, 49, 51, 51), [0, 0, 0, 255]);
            });
            b.group("red gem", |b| {
                b.group("-0.5 -0.5 1 1", |b| {
                    b.raster("base", (40, 40, 60, 60), [255, 0, 0, 255]);
                });
                b.raster("glow", (40, 40, 60, 60), [255, 255, 0, 128]);
                b.raster("emission", (45, 45, 55, 55), [0, 0, 0, 200]);
            });
        });
        let doc = builder.build();
        read_asset_pack(&doc, &mut ValidationResult::new()).unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_resize_ratio() {
        assert!((resize_ratio(STANDARD_PPDU, 100.0) - 1.0).abs() < 1e-6);
        assert!((resize_ratio(STANDARD_PPDU * 2.0, 100.0) - 0.5).abs() < 1e-6);
        assert!((resize_ratio(STANDARD_PPDU, 50.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_output_dir() {
        let mut options = ExportOptions::new("/out", "Island");
        assert_eq!(options.output_dir(), PathBuf::from("/out/Island"));
        options.mode = ExportMode::Layout;
        assert_eq!(options.output_dir(), PathBuf::from("/out/Island (layout)"));
    }

    #[test]
    fn test_export_asset_pack() {
        let dir = tempdir().unwrap();
        let pack = gem_pack();
        let options = ExportOptions::new(dir.path(), "Island");

        let mut log = ValidationResult::new();
        let summary = export_asset_pack(&pack, &options, &mut log).unwrap();

        assert!(log.is_ok());
        assert_eq!(summary.output_dir, dir.path().join("Island"));
        assert_eq!(
            file_names(&summary.output_dir),
            vec![
                "Island.assetpack",
                "RedGem_L0.png",
                "RedGem_base0.png",
                "RedGem_emission.png",
            ]
        );

        let base = image::open(summary.output_dir.join("RedGem_base0.png")).unwrap();
        assert_eq!((base.width(), base.height()), (20, 20));
        assert_eq!(base.to_rgba8().get_pixel(0, 0).0, [255, 0, 0, 255]);

        let emission = image::open(summary.output_dir.join("RedGem_emission.png")).unwrap();
        assert_eq!(emission.color(), image::ColorType::L8);
        let emission = emission.to_luma8();
        assert_eq!(emission.get_pixel(0, 0).0, [0]);
        assert_eq!(emission.get_pixel(10, 10).0, [200]);

        let manifest = AssetPackManifest::load(summary.manifest.as_ref().unwrap()).unwrap();
        assert_eq!(manifest.materials[0].light0_message, "glow");
        let pivot = manifest.pivots[0].pivot;
        assert!((pivot.x - 0.5).abs() < 1e-4);
        assert!((pivot.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_export_scales_by_ruler() {
        let dir = tempdir().unwrap();
        let mut pack = gem_pack();
        pack.ppdu = STANDARD_PPDU * 2.0;

        let options = ExportOptions::new(dir.path(), "Island");
        let summary = export_asset_pack(&pack, &options, &mut ValidationResult::new()).unwrap();

        assert!((summary.ratio - 0.5).abs() < 1e-6);
        let base = image::open(summary.output_dir.join("RedGem_base0.png")).unwrap();
        assert_eq!((base.width(), base.height()), (10, 10));
    }

    #[test]
    fn test_export_warns_on_upscale() {
        let dir = tempdir().unwrap();
        let mut pack = gem_pack();
        pack.ppdu = STANDARD_PPDU / 2.0;

        let mut log = ValidationResult::new();
        export_asset_pack(&pack, &ExportOptions::new(dir.path(), "Island"), &mut log).unwrap();

        let codes: Vec<&str> = log.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["psdpack::export::upscale"]);
    }

    #[test]
    fn test_export_layout() {
        let dir = tempdir().unwrap();
        let pack = gem_pack();
        let mut options = ExportOptions::new(dir.path(), "Island");
        options.mode = ExportMode::Layout;

        let summary = export_asset_pack(&pack, &options, &mut ValidationResult::new()).unwrap();

        assert_eq!(summary.output_dir, dir.path().join("Island (layout)"));
        assert!(summary.manifest.is_none());
        assert_eq!(file_names(&summary.output_dir), vec!["Island&RedGem#.png"]);
    }

    #[test]
    fn test_export_clean() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("Island/Stale_base0.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        let pack = gem_pack();
        let mut options = ExportOptions::new(dir.path(), "Island");
        export_asset_pack(&pack, &options, &mut ValidationResult::new()).unwrap();
        assert!(stale.exists());

        options.clean = true;
        export_asset_pack(&pack, &options, &mut ValidationResult::new()).unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("Island/RedGem_base0.png").exists());
    }

    #[test]
    fn test_export_refuses_invalid_pack() {
        let dir = tempdir().unwrap();
        let mut pack = gem_pack();
        pack.sprites.insert("Empty".to_string(), SpriteSet::new("Empty"));

        let err = export_asset_pack(&pack, &ExportOptions::new(dir.path(), "Island"), &mut ValidationResult::new())
            .unwrap_err();
        assert!(matches!(err, PackError::Validation { .. }));
        assert!(!dir.path().join("Island").exists());
    }

    #[test]
    fn test_export_refuses_empty_region() {
        let dir = tempdir().unwrap();
        let mut pack = AssetPack::new(10, 10);
        let mut ghost = SpriteSet::new("Ghost");
        ghost.base_layers.push(vec![0; 400]);
        ghost.bounds = PixelBounds::empty(IVec2::new(10, 10));
        ghost.size_unit = Vec2::ONE;
        pack.sprites.insert("Ghost".to_string(), ghost);

        let err = export_asset_pack(&pack, &ExportOptions::new(dir.path(), "Island"), &mut ValidationResult::new())
            .unwrap_err();
        assert!(matches!(err, PackError::Export { .. }));
    }
}
