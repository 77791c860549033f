//! Document-wide markers: origin, ruler and the list of sprite folders.

use crate::classify::{
    name_is, parent_is, split_tokens, visible_in_hierarchy, EXPORT_FOLDER, META_FOLDER,
    ORIGIN_LAYER, RULER_TOKEN,
};
use crate::psd::{Document, LayerId};
use crate::types::{Vec2, STANDARD_PPDU};
use crate::validation::{Diagnostic, LogSink};

/// Result of the metadata pass.
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Centre of `meta/origin`, or the canvas corner when absent.
    pub origin: Vec2,
    /// From `meta/ruler N`: the ruler layer's width spans `N` diagonal units.
    pub ppdu: f32,
    /// Visible folders directly under `export`, in file order.
    pub sprite_folders: Vec<LayerId>,
}

/// Scan every layer once for calibration markers and sprite folders.
pub fn scan_metadata(doc: &Document, log: &mut dyn LogSink) -> DocumentMetadata {
    let mut metadata = DocumentMetadata {
        origin: Vec2::ZERO,
        ppdu: STANDARD_PPDU,
        sprite_folders: Vec::new(),
    };

    for id in doc.ids() {
        let layer = doc.layer(id);

        if parent_is(doc, id, META_FOLDER) {
            if name_is(&layer.name, ORIGIN_LAYER) {
                metadata.origin = layer.center();
                continue;
            }
            let tokens = split_tokens(&layer.name, ' ');
            if tokens.len() == 2 && name_is(&tokens[0], RULER_TOKEN) {
                match tokens[1].parse::<f32>() {
                    Ok(units) if units > 0.0 && layer.width() > 0 => {
                        metadata.ppdu = layer.width() as f32 / units;
                    }
                    _ => log.append(
                        Diagnostic::warning(
                            "psdpack::meta::ruler",
                            format!(
                                "ruler layer '{}' could not be read; using the standard scale",
                                layer.name
                            ),
                        )
                        .with_help("Name the ruler 'ruler N' where N is the number of units its width spans"),
                    ),
                }
            }
        } else if layer.kind.is_folder()
            && parent_is(doc, id, EXPORT_FOLDER)
            && !name_is(&layer.name, META_FOLDER)
            && visible_in_hierarchy(doc, id)
        {
            if layer.has_mask {
                log.append(Diagnostic::warning(
                    "psdpack::sprite::folder-mask",
                    format!(
                        "folder for sprite '{}' has a layer mask, which will be ignored during export",
                        layer.name
                    ),
                ));
            }
            if metadata
                .sprite_folders
                .iter()
                .any(|&other| doc.layer(other).name == layer.name)
            {
                log.append(
                    Diagnostic::warning(
                        "psdpack::sprite::duplicate",
                        format!("more than one sprite folder is named '{}'", layer.name),
                    )
                    .with_help("Sprite folders share one namespace; rename one of them"),
                );
            }
            metadata.sprite_folders.push(id);
        }
    }

    metadata
}
