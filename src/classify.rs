//! Layer naming and hierarchy conventions.
//!
//! The document marks sprite structure purely through folder nesting and
//! layer names. The predicates here answer questions about one layer and its
//! ancestor chain; [`classify`] turns them into a [`LayerRole`] once per layer
//! so the assembly pass can match on roles instead of names.

use crate::psd::{Document, LayerId, LayerKind};

/// Root folder holding one sub-folder per sprite.
pub const EXPORT_FOLDER: &str = "export";
/// Folder holding document calibration markers.
pub const META_FOLDER: &str = "meta";
/// Root folder of layout documents.
pub const LAYOUT_FOLDER: &str = "layout";
pub const ORIGIN_LAYER: &str = "origin";
pub const RULER_TOKEN: &str = "ruler";
pub const CORNER_LAYER: &str = "corner";
pub const EMISSION_LAYER: &str = "emission";

/// Case-insensitive name comparison used for every convention name.
pub fn name_is(name: &str, expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected)
}

/// True if the layer itself or any ancestor is named `name`.
pub fn is_or_under_layer(doc: &Document, id: LayerId, name: &str) -> bool {
    doc.ancestors(id).any(|layer| name_is(&layer.name, name))
}

/// True only if the layer and every ancestor are visible.
pub fn visible_in_hierarchy(doc: &Document, id: LayerId) -> bool {
    doc.ancestors(id).all(|layer| layer.visible)
}

/// True if the layer's parent exists and is named `name`.
pub fn parent_is(doc: &Document, id: LayerId, name: &str) -> bool {
    doc.parent(id)
        .is_some_and(|parent| name_is(&doc.layer(parent).name, name))
}

/// Split on `separator`, dropping empty tokens.
pub fn split_tokens(s: &str, separator: char) -> Vec<String> {
    s.split(separator)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Capitalize the first letter of each token and concatenate.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut result = String::new();
    for token in tokens {
        let mut chars = token.as_ref().chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Position of the content scan inside the current sprite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteCursor {
    /// Folder of the sprite being populated.
    pub sprite_folder: Option<LayerId>,
    /// Divider that opened that folder.
    pub sprite_divider: Option<LayerId>,
    /// Last layer the scan did not skip.
    pub prev: Option<LayerId>,
}

impl SpriteCursor {
    /// Whether the scan has not yet seen any content since the sprite opened.
    pub fn at_sprite_start(&self) -> bool {
        self.sprite_divider.is_some() && self.prev == self.sprite_divider
    }
}

/// What a layer contributes to the sprite being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    /// Outside `export`, or hidden.
    Skip,
    /// The divider that opens a registered sprite folder.
    SpriteStart,
    /// A folder directly inside the sprite whose name carries position/size.
    MetadataFolder,
    /// A raster layer inside the metadata folder; one per base part.
    BasePart,
    /// The first raster child of the sprite: metadata name and base pixels.
    SingleBase,
    /// Marks the sprite's corner when only the size was given.
    Corner,
    /// Self-illumination mask.
    Emission,
    /// Any other raster child of the sprite.
    Light,
    /// Under `export` but not part of any sprite's content.
    Other,
}

/// Classify one layer against the current scan position.
///
/// `is_sprite` reports whether a folder name was registered as a sprite by
/// the metadata pass.
pub fn classify(
    doc: &Document,
    id: LayerId,
    cursor: &SpriteCursor,
    is_sprite: impl Fn(&str) -> bool,
) -> LayerRole {
    let layer = doc.layer(id);

    if !is_or_under_layer(doc, id, EXPORT_FOLDER) {
        return LayerRole::Skip;
    }
    // Dividers carry no pixels, so visibility never hides them
    if layer.kind != LayerKind::SectionDivider && !visible_in_hierarchy(doc, id) {
        return LayerRole::Skip;
    }

    let parent = doc.parent(id);

    if layer.kind == LayerKind::SectionDivider {
        let starts_sprite = match (parent, doc.grandparent(id)) {
            (Some(folder), Some(root)) => {
                name_is(&doc.layer(root).name, EXPORT_FOLDER) && is_sprite(&doc.layer(folder).name)
            }
            _ => false,
        };
        return if starts_sprite {
            LayerRole::SpriteStart
        } else {
            LayerRole::Other
        };
    }

    let Some(sprite_folder) = cursor.sprite_folder else {
        return LayerRole::Other;
    };

    if layer.kind.is_folder() {
        return if parent == Some(sprite_folder) {
            LayerRole::MetadataFolder
        } else {
            LayerRole::Other
        };
    }

    if doc.grandparent(id) == Some(sprite_folder) {
        return LayerRole::BasePart;
    }

    if parent != Some(sprite_folder) {
        return LayerRole::Other;
    }

    if cursor.at_sprite_start() {
        LayerRole::SingleBase
    } else if name_is(&layer.name, CORNER_LAYER) {
        LayerRole::Corner
    } else if name_is(&layer.name, EMISSION_LAYER) {
        LayerRole::Emission
    } else {
        LayerRole::Light
    }
}
