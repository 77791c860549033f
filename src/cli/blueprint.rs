//! Blueprint command implementation.
//!
//! Reads sprite placements from a layout PSD and writes an
//! `.islandblueprint` file.

use std::path::PathBuf;

use clap::Args;

use crate::blueprint::{build_blueprint, write_blueprint};
use crate::error::Result;
use crate::gather::load_index;
use crate::output::{display_path, plural, Printer};
use crate::psd::Document;
use crate::validation::{print_diagnostic_list, ValidationResult};

/// Build an island blueprint from a layout document
#[derive(Args, Debug)]
pub struct BlueprintArgs {
    /// Index written by `psdpack gather`
    #[arg(long, required = true)]
    pub index: PathBuf,

    /// Layout PSD with placed sprites under a "layout" folder
    #[arg(long, required = true)]
    pub layout: PathBuf,

    /// Output path without extension; writes <output>.islandblueprint
    #[arg(long, short, required = true)]
    pub output: PathBuf,
}

pub fn run(args: BlueprintArgs, printer: &Printer) -> Result<()> {
    let index = load_index(&args.index)?;

    printer.status("Reading", &display_path(&args.layout));
    let doc = Document::open(&args.layout)?;

    let mut log = ValidationResult::new();
    let placements = build_blueprint(&doc, &index, &mut log)?;
    print_diagnostic_list(&log, printer);

    let path = write_blueprint(&placements, &args.output)?;
    printer.success(
        "Wrote",
        &format!(
            "{} ({})",
            display_path(&path),
            plural(placements.len(), "placement", "placements")
        ),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Placement;
    use crate::gather::IndexEntry;
    use crate::psd::{encode_document, DocumentBuilder};
    use crate::types::Vec2;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_blueprint_command() {
        let dir = tempdir().unwrap();

        let index = vec![IndexEntry {
            sprite_path: "Island/Gem".to_string(),
            pivot: Vec2::new(0.5, 0.0),
            frame: None,
        }];
        let index_path = dir.path().join("gathered.index");
        fs::write(&index_path, serde_json::to_string(&index).unwrap()).unwrap();

        let mut b = DocumentBuilder::new(100, 100);
        b.group("meta", |b| {
            b.raster("origin", (49, 49, 51, 51), [0, 0, 0, 255]);
        });
        b.group("layout", |b| {
            b.raster("Island&Gem#", (40, 40, 60, 50), [255; 4]);
        });
        let layout_path = dir.path().join("layout.psd");
        fs::write(&layout_path, encode_document(&b.build())).unwrap();

        let args = BlueprintArgs {
            index: index_path,
            layout: layout_path,
            output: dir.path().join("island"),
        };
        run(args, &Printer::plain()).unwrap();

        let written = fs::read_to_string(dir.path().join("island.islandblueprint")).unwrap();
        let placements: Vec<Placement> = serde_json::from_str(&written).unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].sprite_path, "Island/Gem");
        assert!(placements[0].position.x.abs() < 1e-4);
        assert!(placements[0].position.y.abs() < 1e-4);
    }
}
