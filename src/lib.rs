//! psdpack - PSD to isometric sprite asset pack exporter
//!
//! A library for reading layered Photoshop documents, assembling the sprites
//! described by their layer structure, and writing cropped textures plus the
//! `.assetpack` manifest a game engine loads them from.

pub mod assemble;
pub mod blueprint;
pub mod classify;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod export;
pub mod gather;
pub mod output;
pub mod psd;
pub mod render;
pub mod types;
pub mod validation;

pub use assemble::{read_asset_pack, scan_metadata, DocumentMetadata};
pub use discovery::{load_config, Config};
pub use error::{PackError, Result};
pub use export::{build_manifest, export_asset_pack, AssetPackManifest, ExportMode, ExportOptions};
pub use psd::{read_document, Document, DocumentBuilder, Layer, LayerId, LayerKind};
pub use types::{AssetPack, PixelBounds, PositionStatus, SpriteSet, Vec2};
pub use validation::{validate_pack, Diagnostic, LogSink, Severity, ValidationResult};
