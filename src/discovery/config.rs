//! Project configuration (psdpack.yaml) parsing.
//!
//! Every key is optional; command-line flags override what the file says.

use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// Resampling filter used when textures are scaled to the export resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Settings for `psdpack gather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    /// Textures wider or taller than this are left off the sheet.
    pub max_sprite_size: u32,

    /// Gap between packed sprites, in pixels.
    pub padding: u32,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            max_sprite_size: 1024,
            padding: 0,
        }
    }
}

/// Project configuration loaded from psdpack.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output resolution in pixels per unit.
    #[serde(default = "default_export_ppu")]
    pub export_ppu: f32,

    pub resize_filter: ResizeFilter,

    /// Remove the output directory before exporting.
    pub clean: bool,

    pub gather: GatherConfig,
}

fn default_export_ppu() -> f32 {
    100.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_ppu: default_export_ppu(),
            resize_filter: ResizeFilter::default(),
            clean: false,
            gather: GatherConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a psdpack.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PackError::io(path, format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| PackError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some("Check psdpack.yaml syntax".to_string()),
        })?;

        if !(config.export_ppu > 0.0) {
            return Err(PackError::Parse {
                message: format!("export_ppu must be positive, got {}", config.export_ppu),
                help: Some("The default export resolution is 100 pixels per unit".to_string()),
            });
        }

        Ok(config)
    }
}
