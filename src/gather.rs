//! Gathering exported sprites into one sheet.
//!
//! Every `.assetpack` below a root directory contributes one entry per
//! material. An entry's sprite path is the manifest's directory relative to
//! the root plus the material name, e.g. `props/rocks/Boulder`. The selected
//! base textures are packed into a single sheet, and an index file records
//! each sprite's frame and pivot so a layout document can be placed from it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::{relative_dir, scan_asset_packs, SpriteFilter};
use crate::error::{PackError, Result};
use crate::export::AssetPackManifest;
use crate::render::{write_png, Frame, SheetPacker, SheetSprite, WRITE_HELP};
use crate::types::Vec2;
use crate::validation::{Diagnostic, LogSink};

/// Extension of the index written next to the sheet.
pub const INDEX_EXTENSION: &str = "index";

/// One material found in an exported pack.
#[derive(Debug, Clone, PartialEq)]
pub struct GatherEntry {
    pub sprite_path: String,
    pub png_path: PathBuf,
    pub pivot: Vec2,
    /// Dropped by the ignore list and not rescued by the include list.
    pub ignored: bool,
}

/// Placement of a sprite on the gathered sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFrame {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl From<&Frame> for IndexFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            x: frame.x,
            y: frame.y,
            w: frame.w,
            h: frame.h,
        }
    }
}

/// One line of the gathered index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub sprite_path: String,
    pub pivot: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<IndexFrame>,
}

/// Read a gathered index file.
pub fn load_index(path: &Path) -> Result<Vec<IndexEntry>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PackError::io(path, format!("Failed to read index: {}", e)))?;

    serde_json::from_str(&content).map_err(|e| PackError::Parse {
        message: format!("Invalid index {}: {}", path.display(), e),
        help: Some("Regenerate the index with psdpack gather".to_string()),
    })
}

/// Collect every material of every asset pack under `root`, in path order.
///
/// Materials whose base texture has no pivot in the manifest keep a zero
/// pivot and are reported.
pub fn collect_entries(
    root: &Path,
    filter: &SpriteFilter,
    log: &mut dyn LogSink,
) -> Result<Vec<GatherEntry>> {
    let mut entries = Vec::new();

    for manifest_path in scan_asset_packs(root)? {
        let manifest = AssetPackManifest::load(&manifest_path)?;
        let dir = manifest_path.parent().unwrap_or(root);
        let prefix = relative_dir(root, &manifest_path);

        for material in &manifest.materials {
            let sprite_path = if prefix.is_empty() {
                material.name.clone()
            } else {
                format!("{}/{}", prefix, material.name)
            };

            let pivot = match manifest.pivot_for(&material.main_tex_path) {
                Some(pivot) => pivot,
                None => {
                    log.append(Diagnostic::warning(
                        "psdpack::gather::pivot",
                        format!("no pivot recorded for '{}' in {}", material.main_tex_path, manifest_path.display()),
                    ));
                    Vec2::ZERO
                }
            };

            entries.push(GatherEntry {
                ignored: !filter.keeps(&sprite_path),
                png_path: dir.join(&material.main_tex_path),
                sprite_path,
                pivot,
            });
        }
    }

    Ok(entries)
}

/// A packed sheet and its index.
#[derive(Debug, Clone)]
pub struct GatheredSheet {
    pub image: image::RgbaImage,
    pub index: Vec<IndexEntry>,
}

/// Load the kept entries' textures and pack them into one sheet.
///
/// Textures wider or taller than `max_size` are skipped with a warning.
/// Fails when nothing is left to pack.
pub fn pack_sheet(
    entries: &[GatherEntry],
    max_size: u32,
    padding: u32,
    log: &mut dyn LogSink,
) -> Result<GatheredSheet> {
    let mut sprites = Vec::new();
    let mut pivots = Vec::new();

    for entry in entries.iter().filter(|e| !e.ignored) {
        let image = image::open(&entry.png_path)
            .map_err(|e| PackError::io(&entry.png_path, format!("Failed to read texture: {}", e)))?
            .to_rgba8();

        if image.width() > max_size || image.height() > max_size {
            log.append(
                Diagnostic::warning(
                    "psdpack::gather::too-big",
                    format!(
                        "skipping sprite '{}' because it's too big ({}x{})",
                        entry.sprite_path,
                        image.width(),
                        image.height()
                    ),
                )
                .with_help(format!("Sprites larger than {} pixels are not gathered", max_size)),
            );
            continue;
        }

        sprites.push(SheetSprite {
            name: entry.sprite_path.clone(),
            image,
        });
        pivots.push(entry.pivot);
    }

    if sprites.is_empty() {
        return Err(PackError::Validation {
            message: "No sprites to gather".to_string(),
            help: Some("Check the ignore list and the maximum sprite size".to_string()),
        });
    }

    let (image, frames) = SheetPacker::new(padding).pack(&sprites);
    let index = frames
        .iter()
        .zip(pivots)
        .map(|(frame, pivot)| IndexEntry {
            sprite_path: frame.name.clone(),
            pivot,
            frame: Some(IndexFrame::from(frame)),
        })
        .collect();

    Ok(GatheredSheet { image, index })
}

/// Write `<stem>.png` and `<stem>.index`; returns both paths.
pub fn write_sheet(sheet: &GatheredSheet, stem: &Path) -> Result<(PathBuf, PathBuf)> {
    let png_path = stem.with_extension("png");
    let index_path = stem.with_extension(INDEX_EXTENSION);

    if let Some(parent) = stem.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PackError::Io {
            path: parent.to_path_buf(),
            message: format!("Failed to create output directory: {}", e),
            help: Some(WRITE_HELP.to_string()),
        })?;
    }

    write_png(&image::DynamicImage::ImageRgba8(sheet.image.clone()), &png_path)?;

    let json = serde_json::to_string_pretty(&sheet.index).map_err(|e| PackError::Export {
        message: format!("Failed to serialize index: {}", e),
        help: None,
    })?;
    std::fs::write(&index_path, json).map_err(|e| PackError::Io {
        path: index_path.clone(),
        message: format!("Failed to write index: {}", e),
        help: Some(WRITE_HELP.to_string()),
    })?;

    Ok((png_path, index_path))
}
