//! Export command implementation.
//!
//! Reads a PSD, assembles its sprites and writes textures plus the
//! `.assetpack` manifest (or layout textures with `--layout`).

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Args;
use notify::{Config as WatchConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::assemble::read_asset_pack;
use crate::discovery::{load_config, ResizeFilter};
use crate::error::{PackError, Result};
use crate::export::{export_asset_pack, ExportMode, ExportOptions};
use crate::output::{display_path, plural, Printer};
use crate::psd::Document;
use crate::validation::{print_diagnostic_list, validate_pack, ValidationResult};

/// Minimum time between two exports triggered by file changes.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Export sprites from a PSD as an asset pack
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// PSD document to export
    #[arg(required = true)]
    pub input: PathBuf,

    /// Destination directory; the pack is written to a folder inside it
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// Output folder name (default: input file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Remove the output folder before exporting
    #[arg(long)]
    pub clean: bool,

    /// Write base textures for a layout document instead of an asset pack
    #[arg(long)]
    pub layout: bool,

    /// Export resolution in pixels per unit (overrides psdpack.yaml)
    #[arg(long)]
    pub ppu: Option<f32>,

    /// Resampling filter (overrides psdpack.yaml)
    #[arg(long, value_enum)]
    pub filter: Option<ResizeFilter>,

    /// Configuration file (default: ./psdpack.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Export again whenever the input changes
    #[arg(long)]
    pub watch: bool,
}

impl ExportArgs {
    /// Merge flags over the loaded configuration.
    fn options(&self) -> Result<ExportOptions> {
        let config = load_config(self.config.as_deref())?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None => pack_name(&self.input)?,
        };

        let export_ppu = self.ppu.unwrap_or(config.export_ppu);
        if !(export_ppu > 0.0) {
            return Err(PackError::Parse {
                message: format!("--ppu must be positive, got {}", export_ppu),
                help: None,
            });
        }

        let mut options = ExportOptions::new(&self.output, name);
        options.clean = self.clean || config.clean;
        options.mode = if self.layout {
            ExportMode::Layout
        } else {
            ExportMode::AssetPack
        };
        options.export_ppu = export_ppu;
        options.filter = self.filter.unwrap_or(config.resize_filter).filter_type();
        Ok(options)
    }
}

/// Default pack name: the document's file stem.
pub fn pack_name(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PackError::Parse {
            message: format!("Cannot derive a pack name from {}", input.display()),
            help: Some("Pass --name".to_string()),
        })
}

pub fn run(args: ExportArgs, printer: &Printer) -> Result<()> {
    let options = args.options()?;

    if !args.watch {
        return export_once(&args.input, &options, printer);
    }

    // A failed export is reported and the watch goes on
    if let Err(e) = export_once(&args.input, &options, printer) {
        printer.error("Failed", &e.to_string());
    }
    watch(&args.input, &options, printer)
}

/// Read, assemble and export one document.
pub fn export_once(input: &Path, options: &ExportOptions, printer: &Printer) -> Result<()> {
    printer.status("Reading", &display_path(input));
    let doc = Document::open(input)?;

    let mut log = ValidationResult::new();
    let pack = read_asset_pack(&doc, &mut log)?;
    log.merge(validate_pack(&pack));
    print_diagnostic_list(&log, printer);

    printer.status(
        "Exporting",
        &format!(
            "{} to {}",
            plural(pack.sprites.len(), "sprite", "sprites"),
            display_path(&options.output_dir())
        ),
    );

    let mut export_log = ValidationResult::new();
    let summary = export_asset_pack(&pack, options, &mut export_log)?;
    print_diagnostic_list(&export_log, printer);

    let written = plural(summary.textures.len(), "texture", "textures");
    match &summary.manifest {
        Some(manifest) => printer.success(
            "Finished",
            &format!("{} and {}", written, display_path(manifest)),
        ),
        None => printer.success("Finished", &written),
    }

    Ok(())
}

/// Re-export whenever the input document is written.
fn watch(input: &Path, options: &ExportOptions, printer: &Printer) -> Result<()> {
    let watched = input
        .canonicalize()
        .map_err(|e| PackError::io(input, format!("Failed to resolve input: {}", e)))?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        WatchConfig::default().with_poll_interval(Duration::from_millis(250)),
    )
    .map_err(|e| PackError::io(&watched, format!("Failed to start watcher: {}", e)))?;

    // Editors save by replacing the file, so watch its directory
    let dir = watched.parent().unwrap_or(&watched);
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| PackError::io(dir, format!("Failed to watch directory: {}", e)))?;

    printer.info("Watching", &display_path(input));

    let mut last_export = Instant::now();
    while let Ok(event) = rx.recv() {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            continue;
        }
        if !event.paths.iter().any(|p| p == &watched) {
            continue;
        }
        if last_export.elapsed() < WATCH_DEBOUNCE {
            continue;
        }

        // Let the editor finish writing before reading
        std::thread::sleep(WATCH_DEBOUNCE);
        while rx.try_recv().is_ok() {}

        if let Err(e) = export_once(input, options, printer) {
            printer.error("Failed", &e.to_string());
        }
        last_export = Instant::now();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psd::{encode_document, DocumentBuilder};
    use std::fs;
    use tempfile::tempdir;

    fn args(input: PathBuf, output: PathBuf) -> ExportArgs {
        ExportArgs {
            input,
            output,
            name: None,
            clean: false,
            layout: false,
            ppu: None,
            filter: None,
            config: None,
            watch: false,
        }
    }

    fn write_island(dir: &Path) -> PathBuf {
        let mut b = DocumentBuilder::new(64, 64);
        b.group("export", |b| {
            b.group("meta", |b| {
                b.raster("origin", (31, 31, 33, 33), [0, 0, 0, 255]);
            });
            b.group("gem", |b| {
                b.raster("-0.5 -0.5 1 1", (24, 24, 40, 40), [0, 200, 255, 255]);
            });
        });
        let path = dir.join("island.psd");
        fs::write(&path, encode_document(&b.build())).unwrap();
        path
    }

    #[test]
    fn test_pack_name() {
        assert_eq!(pack_name(Path::new("art/island.psd")).unwrap(), "island");
        assert!(pack_name(Path::new("")).is_err());
    }

    #[test]
    fn test_export_command() {
        let dir = tempdir().unwrap();
        let input = write_island(dir.path());

        run(args(input, dir.path().join("out")), &Printer::plain()).unwrap();

        let out = dir.path().join("out/island");
        assert!(out.join("island.assetpack").exists());
        assert!(out.join("Gem_base0.png").exists());
    }

    #[test]
    fn test_export_command_layout_with_name() {
        let dir = tempdir().unwrap();
        let input = write_island(dir.path());

        let mut a = args(input, dir.path().to_path_buf());
        a.layout = true;
        a.name = Some("Beach".to_string());
        run(a, &Printer::plain()).unwrap();

        assert!(dir.path().join("Beach (layout)/Beach&Gem#.png").exists());
        assert!(!dir.path().join("Beach (layout)/Beach.assetpack").exists());
    }

    #[test]
    fn test_export_command_config_ppu() {
        let dir = tempdir().unwrap();
        let input = write_island(dir.path());
        let config = dir.path().join("psdpack.yaml");
        fs::write(&config, "export_ppu: 50\nresize_filter: nearest\n").unwrap();

        let mut a = args(input, dir.path().join("out"));
        a.config = Some(config);
        run(a, &Printer::plain()).unwrap();

        let base = image::open(dir.path().join("out/island/Gem_base0.png")).unwrap();
        assert_eq!((base.width(), base.height()), (8, 8));
    }

    #[test]
    fn test_export_command_rejects_bad_ppu() {
        let dir = tempdir().unwrap();
        let input = write_island(dir.path());

        let mut a = args(input, dir.path().join("out"));
        a.ppu = Some(0.0);
        assert!(run(a, &Printer::plain()).is_err());
    }

    #[test]
    fn test_export_command_missing_input() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.psd");
        let err = run(args(missing.clone(), dir.path().to_path_buf()), &Printer::plain()).unwrap_err();
        match err {
            PackError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
