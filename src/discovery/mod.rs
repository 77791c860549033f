//! Configuration and file discovery for psdpack.
//!
//! Finds the project configuration (`psdpack.yaml`), scans directories for
//! exported asset packs and filters gathered sprite paths.
//!
//! # Example
//!
//! ```ignore
//! use psdpack::discovery::{load_config, scan_asset_packs};
//!
//! let config = load_config(None)?;
//! for manifest in scan_asset_packs(Path::new("packs"))? {
//!     println!("{}", manifest.display());
//! }
//! ```

mod config;
mod filter;
mod scanner;

use std::path::Path;

use crate::error::Result;

pub use config::{Config, GatherConfig, ResizeFilter};
pub use filter::{PatternList, SpriteFilter};
pub use scanner::{is_asset_pack, relative_dir, scan_asset_packs, ASSET_PACK_EXTENSION};

/// The name of the configuration file.
pub const CONFIG_FILENAME: &str = "psdpack.yaml";

/// Load configuration.
///
/// An explicit path must exist. Otherwise `psdpack.yaml` in the current
/// directory is used when present, and defaults when it is not.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    load_config_from(Path::new("."))
}

/// Load `psdpack.yaml` from `dir`, falling back to defaults.
pub fn load_config_from(dir: &Path) -> Result<Config> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
        Config::load(&path)
    } else {
        Ok(Config::default())
    }
}
