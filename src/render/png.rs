//! PNG output for sprite textures.
//!
//! Cropping works on raw canvas buffers; resizing and encoding go through
//! the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbaImage};

use crate::error::{PackError, Result};
use crate::types::PixelBounds;

/// Help shown whenever a texture or manifest cannot be written.
pub const WRITE_HELP: &str =
    "If you are updating existing sprites, make sure the files are writable (e.g. checked out from version control)";

/// Copy the `bounds` region out of a canvas-sized buffer, row by row.
///
/// `canvas_width` is in pixels; `channels` is 4 for RGBA and 1 for masks.
pub fn crop(data: &[u8], canvas_width: u32, channels: usize, bounds: &PixelBounds) -> Vec<u8> {
    let width = bounds.size.x.max(0) as usize;
    let height = bounds.size.y.max(0) as usize;
    let src_stride = canvas_width as usize * channels;
    let dst_stride = width * channels;

    let mut out = Vec::with_capacity(dst_stride * height);
    for row in 0..height {
        let start = (bounds.min.y as usize + row) * src_stride + bounds.min.x as usize * channels;
        out.extend_from_slice(&data[start..start + dst_stride]);
    }
    out
}

/// Wrap a cropped RGBA buffer.
pub fn rgba_image(data: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage> {
    RgbaImage::from_raw(width, height, data)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| PackError::Export {
            message: format!("RGBA buffer does not match {}x{}", width, height),
            help: None,
        })
}

/// Wrap a cropped single-channel buffer.
pub fn gray_image(data: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage> {
    GrayImage::from_raw(width, height, data)
        .map(DynamicImage::ImageLuma8)
        .ok_or_else(|| PackError::Export {
            message: format!("mask buffer does not match {}x{}", width, height),
            help: None,
        })
}

/// Scale by `ratio`, rounding the new size up. A ratio that keeps the size
/// returns the image untouched.
pub fn resize(image: DynamicImage, ratio: f32, filter: FilterType) -> DynamicImage {
    let width = (image.width() as f32 * ratio).ceil().max(1.0) as u32;
    let height = (image.height() as f32 * ratio).ceil().max(1.0) as u32;
    if width == image.width() && height == image.height() {
        return image;
    }
    image.resize_exact(width, height, filter)
}

/// Write an image to a PNG file.
pub fn write_png(image: &DynamicImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|e| PackError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
        help: Some(WRITE_HELP.to_string()),
    })?;

    Ok(())
}
