//! File system scanner for exported asset packs.
//!
//! Recursively scans a directory for `.assetpack` manifests written by
//! `psdpack export`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PackError, Result};

/// Extension of asset pack manifests.
pub const ASSET_PACK_EXTENSION: &str = "assetpack";

/// Check whether a path names an asset pack manifest.
pub fn is_asset_pack(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == ASSET_PACK_EXTENSION)
}

/// Scan a directory for asset pack manifests.
///
/// Results are sorted so the gathered order does not depend on the file
/// system. A root that is not a directory is an error.
pub fn scan_asset_packs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PackError::Io {
            path: root.to_path_buf(),
            message: "No such directory".to_string(),
            help: Some("Point gather at the folder psdpack export wrote to".to_string()),
        });
    }

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_asset_pack(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    Ok(found)
}

/// Directory of `manifest` relative to `root`, with `/` separators.
///
/// Empty when the manifest sits directly in `root`.
pub fn relative_dir(root: &Path, manifest: &Path) -> String {
    let dir = manifest.parent().unwrap_or(manifest);
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
