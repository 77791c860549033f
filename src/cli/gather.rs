//! Gather command implementation.
//!
//! Collects the base textures of every exported asset pack under a
//! directory into one sprite sheet plus index.

use std::path::PathBuf;

use clap::Args;

use crate::discovery::{load_config, PatternList, SpriteFilter};
use crate::error::Result;
use crate::gather::{collect_entries, pack_sheet, write_sheet};
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostic_list, ValidationResult};

/// Gather exported sprites into one sheet and index
#[derive(Args, Debug)]
pub struct GatherArgs {
    /// Directory to scan for .assetpack files
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Output path without extension; writes <output>.png and <output>.index
    #[arg(long, short, default_value = "gathered")]
    pub output: PathBuf,

    /// File of regular expressions for sprite paths to leave out
    #[arg(long)]
    pub ignore: Option<PathBuf>,

    /// File of regular expressions for sprite paths to keep even if ignored
    #[arg(long)]
    pub include: Option<PathBuf>,

    /// Only list the sprites that would be gathered
    #[arg(long, short)]
    pub list_only: bool,

    /// Largest texture size to gather (overrides psdpack.yaml)
    #[arg(long)]
    pub max_size: Option<u32>,

    /// Configuration file (default: ./psdpack.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: GatherArgs, printer: &Printer) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let filter = SpriteFilter {
        ignore: load_patterns(args.ignore.as_ref())?,
        include: load_patterns(args.include.as_ref())?,
    };

    printer.status("Scanning", &display_path(&args.dir));
    let mut log = ValidationResult::new();
    let entries = collect_entries(&args.dir, &filter, &mut log)?;
    let kept = entries.iter().filter(|e| !e.ignored).count();

    if args.list_only {
        for entry in &entries {
            if entry.ignored {
                println!("{} {}", printer.dim("[ignored]"), entry.sprite_path);
            } else {
                println!("{}", entry.sprite_path);
            }
        }
        print_diagnostic_list(&log, printer);
        printer.info(
            "Found",
            &format!("{} ({} ignored)", plural(kept, "sprite", "sprites"), entries.len() - kept),
        );
        return Ok(());
    }

    let max_size = args.max_size.unwrap_or(config.gather.max_sprite_size);
    let sheet = pack_sheet(&entries, max_size, config.gather.padding, &mut log)?;
    print_diagnostic_list(&log, printer);

    let (png, index) = write_sheet(&sheet, &args.output)?;
    printer.success(
        "Gathered",
        &format!(
            "{} into {} ({}x{}) and {}",
            plural(sheet.index.len(), "sprite", "sprites"),
            display_path(&png),
            sheet.image.width(),
            sheet.image.height(),
            display_path(&index)
        ),
    );

    Ok(())
}

fn load_patterns(path: Option<&PathBuf>) -> Result<PatternList> {
    match path {
        Some(path) => PatternList::load(path),
        None => Ok(PatternList::new()),
    }
}
