//! Validation checks for an assembled asset pack.
//!
//! Each check takes an `&AssetPack` and returns a `ValidationResult`.

use crate::types::AssetPack;

use super::warning::{Diagnostic, ValidationResult};

/// Every sprite needs at least one base layer; a single miss invalidates the pack.
pub fn check_base_layers(pack: &AssetPack) -> ValidationResult {
    let mut result = ValidationResult::new();

    for sprite in pack.sprites_without_base() {
        let mut name = sprite.base_name();
        if name.is_empty() {
            name = "(unknown)".to_string();
        }
        result.push(
            Diagnostic::error(
                "psdpack::sprite::no-base",
                format!("sprite '{}' doesn't have a base layer", name),
            )
            .with_help("Put a raster layer named 'x y width height' directly inside the sprite folder"),
        );
    }

    result
}

/// Warn about sprites whose base pixels all fall outside the canvas.
pub fn check_crop_regions(pack: &AssetPack) -> ValidationResult {
    let mut result = ValidationResult::new();

    for sprite in pack.sprites.values() {
        if !sprite.base_layers.is_empty() && sprite.bounds.is_empty() {
            result.push(
                Diagnostic::warning(
                    "psdpack::sprite::empty-region",
                    format!("sprite '{}' has no pixels inside the canvas", sprite.name),
                )
                .with_help("Move the sprite's base layers onto the canvas"),
            );
        }
    }

    result
}
