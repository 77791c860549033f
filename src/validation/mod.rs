//! Validation and diagnostics for assembled asset packs.
//!
//! Assembly reports recoverable problems through a [`LogSink`] while it
//! runs; [`validate_pack`] then checks the finished pack. Used by both
//! `psdpack export` and `psdpack validate`.

mod checks;
mod warning;

pub use warning::{Diagnostic, LogSink, Severity, ValidationResult};

use crate::output::Printer;
use crate::types::AssetPack;

/// Run all validation checks against an assembled pack.
pub fn validate_pack(pack: &AssetPack) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_base_layers(pack));
    result.merge(checks::check_crop_regions(pack));

    result
}

/// Print each diagnostic to stderr, with help text when present.
pub fn print_diagnostic_list(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        printer.diagnostic(d);
    }
}

/// Print diagnostics to stderr, followed by a summary line.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    print_diagnostic_list(result, printer);

    let errors = result.error_count();
    let warnings = result.warning_count();

    if errors > 0 {
        eprintln!(
            "Validation failed: {} error(s), {} warning(s)",
            errors, warnings
        );
    } else if warnings > 0 {
        eprintln!("Validation passed ({} warning(s))", warnings);
    } else {
        eprintln!("Validation passed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IVec2, SpriteSet};

    #[test]
    fn test_validate_empty_pack() {
        let pack = AssetPack::new(16, 16);
        assert!(validate_pack(&pack).is_ok());
    }

    #[test]
    fn test_validate_valid_sprite() {
        let mut pack = AssetPack::new(16, 16);
        let mut sprite = SpriteSet::new("Gem");
        sprite.base_layers.push(vec![0; 16 * 16 * 4]);
        sprite.bounds.min = IVec2::new(0, 0);
        sprite.bounds.size = IVec2::new(4, 4);
        pack.sprites.insert("Gem".into(), sprite);

        assert!(validate_pack(&pack).is_ok());
    }

    #[test]
    fn test_validate_catches_missing_base() {
        let mut pack = AssetPack::new(16, 16);
        pack.sprites.insert("Gem".into(), SpriteSet::new("Gem"));

        let result = validate_pack(&pack);
        assert!(result.has_errors());
        assert!(!pack.is_valid());
    }
}
