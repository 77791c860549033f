//! Pixel output: texture cropping, resizing, PNG encoding and sheet packing.

mod png;
mod sheet;

pub use png::{crop, gray_image, resize, rgba_image, write_png, WRITE_HELP};
pub use sheet::{Frame, SheetPacker, SheetSprite};
