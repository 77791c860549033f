//! Island blueprints: sprite placements read from a layout document.
//!
//! A layout document holds one raster layer per placed sprite under a
//! `layout` folder, named after the sprite path (`pack&Sprite#...`, as
//! written by layout exports). Each layer's pivot point, taken from a
//! gathered index, is converted to a unit position relative to the
//! document's `meta/origin`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assemble::scan_metadata;
use crate::classify::{is_or_under_layer, split_tokens, visible_in_hierarchy, LAYOUT_FOLDER};
use crate::error::{PackError, Result};
use crate::gather::IndexEntry;
use crate::psd::{Document, LayerKind};
use crate::render::WRITE_HELP;
use crate::types::{pixel_pos_to_unit_pos, Vec2};
use crate::validation::{Diagnostic, LogSink};

/// Extension of blueprint files.
pub const BLUEPRINT_EXTENSION: &str = "islandblueprint";

/// One placed sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub sprite_path: String,
    pub position: Vec2,
}

/// Sprite path encoded in a layout layer name.
///
/// Everything after the first `#` is ignored and `&` stands for `/`.
pub fn sprite_path_from_layer(name: &str) -> Option<String> {
    let tokens = split_tokens(name, '#');
    let first = tokens.first()?.trim();
    if first.is_empty() {
        return None;
    }
    Some(first.replace('&', "/"))
}

/// Place every visible raster layer under `layout` that names a known sprite.
pub fn build_blueprint(
    doc: &Document,
    index: &[IndexEntry],
    log: &mut dyn LogSink,
) -> Result<Vec<Placement>> {
    doc.check_format()?;

    let metadata = scan_metadata(doc, log);
    let origin_unit = pixel_pos_to_unit_pos(metadata.origin, metadata.ppdu);
    let pivots: HashMap<&str, Vec2> = index
        .iter()
        .map(|e| (e.sprite_path.as_str(), e.pivot))
        .collect();

    let mut placements = Vec::new();
    for id in doc.ids() {
        let layer = doc.layer(id);
        if layer.kind != LayerKind::Raster
            || !is_or_under_layer(doc, id, LAYOUT_FOLDER)
            || !visible_in_hierarchy(doc, id)
        {
            continue;
        }

        let Some(sprite_path) = sprite_path_from_layer(&layer.name) else {
            continue;
        };
        let Some(&pivot) = pivots.get(sprite_path.as_str()) else {
            log.append(
                Diagnostic::warning(
                    "psdpack::blueprint::unknown-sprite",
                    format!("layer '{}' names sprite '{}', which is not in the index", layer.name, sprite_path),
                )
                .with_help("Re-run psdpack gather so the index covers every placed sprite"),
            );
            continue;
        };

        let anchor = Vec2::new(
            layer.left as f32 + layer.width() as f32 * pivot.x,
            layer.bottom as f32 - layer.height() as f32 * pivot.y,
        );
        placements.push(Placement {
            sprite_path,
            position: pixel_pos_to_unit_pos(anchor, metadata.ppdu) - origin_unit,
        });
    }

    Ok(placements)
}

/// Write placements to `<stem>.islandblueprint`.
pub fn write_blueprint(placements: &[Placement], stem: &Path) -> Result<PathBuf> {
    let path = stem.with_extension(BLUEPRINT_EXTENSION);
    let json = serde_json::to_string_pretty(placements).map_err(|e| PackError::Export {
        message: format!("Failed to serialize blueprint: {}", e),
        help: None,
    })?;

    std::fs::write(&path, json).map_err(|e| PackError::Io {
        path: path.clone(),
        message: format!("Failed to write blueprint: {}", e),
        help: Some(WRITE_HELP.to_string()),
    })?;

    Ok(path)
}
