//! Validate command implementation.
//!
//! Assembles a PSD and reports problems without writing anything.

use std::path::PathBuf;

use clap::Args;

use crate::assemble::read_asset_pack;
use crate::error::{PackError, Result};
use crate::output::{display_path, plural, Printer};
use crate::psd::Document;
use crate::types::SpriteSet;
use crate::validation::{print_diagnostics, validate_pack, ValidationResult};

/// Check PSD documents without exporting
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// PSD documents to validate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    let mut invalid = Vec::new();

    for file in &args.files {
        printer.status("Checking", &display_path(file));
        let doc = Document::open(file)?;

        let mut log = ValidationResult::new();
        let pack = read_asset_pack(&doc, &mut log)?;
        log.merge(validate_pack(&pack));

        for sprite in pack.sprites.values() {
            printer.info("Sprite", &describe(sprite));
        }
        print_diagnostics(&log, printer);

        if log.has_errors() {
            invalid.push(display_path(file));
        }
    }

    if !invalid.is_empty() {
        return Err(PackError::Validation {
            message: format!("{} failed validation", invalid.join(", ")),
            help: Some("Fix the errors above, then export again".to_string()),
        });
    }

    Ok(())
}

/// One-line summary, e.g. "RedGem (1 part) (2 lights)".
fn describe(sprite: &SpriteSet) -> String {
    let mut line = format!(
        "{} ({}) ({})",
        sprite.base_name(),
        plural(sprite.part_count(), "part", "parts"),
        plural(sprite.light_layers.len(), "light", "lights")
    );
    if sprite.emission_mask.is_some() {
        line.push_str(" (emission)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psd::{encode_document, DocumentBuilder};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_describe() {
        let mut sprite = SpriteSet::new("red gem");
        sprite.base_layers.push(Vec::new());
        sprite.light_layers.push(Vec::new());
        sprite.light_layers.push(Vec::new());
        insta::assert_snapshot!(describe(&sprite), @"RedGem (1 part) (2 lights)");

        sprite.emission_mask = Some(Vec::new());
        insta::assert_snapshot!(describe(&sprite), @"RedGem (1 part) (2 lights) (emission)");
    }

    #[test]
    fn test_validate_valid_document() {
        let dir = tempdir().unwrap();
        let mut b = DocumentBuilder::new(32, 32);
        b.group("export", |b| {
            b.group("gem", |b| {
                b.raster("0 0 1 1", (8, 8, 24, 24), [255; 4]);
            });
        });
        let path = dir.path().join("gem.psd");
        fs::write(&path, encode_document(&b.build())).unwrap();

        let args = ValidateArgs { files: vec![path] };
        run(args, &Printer::plain()).unwrap();

        let written: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn test_validate_missing_base_fails() {
        let dir = tempdir().unwrap();
        let mut b = DocumentBuilder::new(32, 32);
        b.group("export", |b| {
            b.group("gem", |b| {
                b.group("ghost", |b| {
                    b.group("deeper", |b| {
                        b.raster("pixels", (8, 8, 24, 24), [255; 4]);
                    });
                });
            });
        });
        let path = dir.path().join("gem.psd");
        fs::write(&path, encode_document(&b.build())).unwrap();

        let err = run(ValidateArgs { files: vec![path] }, &Printer::plain()).unwrap_err();
        assert!(matches!(err, PackError::Validation { .. }));
    }
}
