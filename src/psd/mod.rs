//! Layered PSD documents.
//!
//! A decoded document is a flat arena of layers in file order (bottom of the
//! layer stack first). The group structure is not stored as child lists:
//! every layer carries an optional parent index, and helpers walk that chain
//! upward. Folder records appear *after* their contents, and each folder is
//! opened by a section-divider record whose parent is the folder itself.
//!
//! Only 8-bit RGB documents are supported.

mod builder;
mod reader;

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::error::PackError;
use crate::types::Vec2;

pub use builder::DocumentBuilder;
pub use reader::read_document;
#[cfg(test)]
pub(crate) use reader::encode::encode_document;

/// Errors produced while decoding a PSD file.
#[derive(Error, Debug)]
pub enum PsdError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("not a PSD document (bad signature)")]
    InvalidSignature,

    #[error("unsupported PSD version {0} (large documents are not supported)")]
    UnsupportedVersion(u16),

    #[error("document is in {0} color mode, expected RGB")]
    UnsupportedColorMode(ColorMode),

    #[error("document has {0} bits per channel, expected 8")]
    UnsupportedDepth(u16),

    #[error("document has no layer and mask information section")]
    MissingLayerSection,

    #[error("unsupported channel compression {0}")]
    UnsupportedCompression(u16),

    #[error("layer '{layer}' is missing its {channel} channel")]
    MissingChannel { layer: String, channel: ChannelKind },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Document color mode as stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Bitmap,
    Grayscale,
    Indexed,
    Rgb,
    Cmyk,
    Multichannel,
    Duotone,
    Lab,
    Unknown(u16),
}

impl ColorMode {
    pub fn from_id(id: u16) -> Self {
        match id {
            0 => ColorMode::Bitmap,
            1 => ColorMode::Grayscale,
            2 => ColorMode::Indexed,
            3 => ColorMode::Rgb,
            4 => ColorMode::Cmyk,
            7 => ColorMode::Multichannel,
            8 => ColorMode::Duotone,
            9 => ColorMode::Lab,
            other => ColorMode::Unknown(other),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Bitmap => write!(f, "bitmap"),
            ColorMode::Grayscale => write!(f, "grayscale"),
            ColorMode::Indexed => write!(f, "indexed"),
            ColorMode::Rgb => write!(f, "RGB"),
            ColorMode::Cmyk => write!(f, "CMYK"),
            ColorMode::Multichannel => write!(f, "multichannel"),
            ColorMode::Duotone => write!(f, "duotone"),
            ColorMode::Lab => write!(f, "Lab"),
            ColorMode::Unknown(id) => write!(f, "unknown ({})", id),
        }
    }
}

/// Structural type of a layer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// An ordinary pixel layer.
    Raster,
    /// A group shown expanded in the layers panel.
    OpenFolder,
    /// A group shown collapsed in the layers panel.
    ClosedFolder,
    /// The hidden marker record that opens a group.
    SectionDivider,
}

impl LayerKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, LayerKind::OpenFolder | LayerKind::ClosedFolder)
    }
}

/// Blend mode key of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    PassThrough,
    Other([u8; 4]),
}

impl BlendMode {
    pub fn from_key(key: [u8; 4]) -> Self {
        match &key {
            b"norm" => BlendMode::Normal,
            b"pass" => BlendMode::PassThrough,
            _ => BlendMode::Other(key),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendMode::Normal => write!(f, "normal"),
            BlendMode::PassThrough => write!(f, "pass through"),
            BlendMode::Other(key) => write!(f, "'{}'", String::from_utf8_lossy(key).trim_end()),
        }
    }
}

/// Role of a pixel channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Red,
    Green,
    Blue,
    Transparency,
    Other(i16),
}

impl ChannelKind {
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => ChannelKind::Red,
            1 => ChannelKind::Green,
            2 => ChannelKind::Blue,
            -1 => ChannelKind::Transparency,
            other => ChannelKind::Other(other),
        }
    }

    /// Whether this channel contributes to the layer's RGBA pixels.
    pub fn is_color(&self) -> bool {
        !matches!(self, ChannelKind::Other(_))
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Red => write!(f, "red"),
            ChannelKind::Green => write!(f, "green"),
            ChannelKind::Blue => write!(f, "blue"),
            ChannelKind::Transparency => write!(f, "transparency"),
            ChannelKind::Other(id) => write!(f, "#{}", id),
        }
    }
}

/// Decoded pixel data of one channel, sized to the layer's own rectangle.
#[derive(Debug, Clone)]
pub struct Channel {
    pub kind: ChannelKind,
    pub data: Vec<u8>,
}

/// Index of a layer inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// A single layer record.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub parent: Option<LayerId>,
    pub kind: LayerKind,
    /// Layer-local visibility; see `classify::visible_in_hierarchy`.
    pub visible: bool,
    /// Only presence matters, mask pixels are never applied.
    pub has_mask: bool,
    pub blend_mode: BlendMode,
    pub channels: Vec<Channel>,
}

impl Layer {
    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// Centre of the layer's bounding box in canvas pixels.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) as f32 * 0.5,
            (self.top + self.bottom) as f32 * 0.5,
        )
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.iter().find(|c| c.kind == kind)
    }

    fn require_channel(&self, kind: ChannelKind) -> Result<&[u8], PsdError> {
        let channel = self.channel(kind).ok_or_else(|| PsdError::MissingChannel {
            layer: self.name.clone(),
            channel: kind,
        })?;
        let expected = self.width() as usize * self.height() as usize;
        if channel.data.len() != expected {
            return Err(PsdError::InvalidInput(format!(
                "layer '{}' {} channel holds {} bytes, expected {}",
                self.name,
                kind,
                channel.data.len(),
                expected
            )));
        }
        Ok(&channel.data)
    }

    /// Expand this layer's channels into a canvas-sized RGBA buffer.
    ///
    /// Pixels outside the canvas are dropped, canvas pixels outside the layer
    /// are transparent black. Fails if any of the four colour channels is
    /// missing.
    pub fn canvas_rgba(&self, canvas_width: u32, canvas_height: u32) -> Result<Vec<u8>, PsdError> {
        let r = self.require_channel(ChannelKind::Red)?;
        let g = self.require_channel(ChannelKind::Green)?;
        let b = self.require_channel(ChannelKind::Blue)?;
        let a = self.require_channel(ChannelKind::Transparency)?;

        let cw = canvas_width as i32;
        let ch = canvas_height as i32;
        let lw = self.width() as usize;
        let mut out = vec![0u8; canvas_width as usize * canvas_height as usize * 4];

        for y in self.top.max(0)..self.bottom.min(ch) {
            let src_row = (y - self.top) as usize * lw;
            let dst_row = y as usize * canvas_width as usize;
            for x in self.left.max(0)..self.right.min(cw) {
                let src = src_row + (x - self.left) as usize;
                let dst = (dst_row + x as usize) * 4;
                out[dst] = r[src];
                out[dst + 1] = g[src];
                out[dst + 2] = b[src];
                out[dst + 3] = a[src];
            }
        }

        Ok(out)
    }
}

/// A decoded document: canvas properties plus the layer arena.
#[derive(Debug, Clone)]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    pub depth: u16,
    layers: Vec<Layer>,
}

impl Document {
    /// Create an 8-bit RGB document. Parent links are recomputed from the
    /// layer order and kinds.
    pub fn new(width: u32, height: u32, mut layers: Vec<Layer>) -> Self {
        link_parents(&mut layers);
        Self {
            width,
            height,
            color_mode: ColorMode::Rgb,
            depth: 8,
            layers,
        }
    }

    /// Read and decode a PSD file from disk.
    ///
    /// A file that cannot be read is reported with its path; decoding
    /// failures come back as [`PackError::Psd`].
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| PackError::io(path, format!("Failed to read document: {}", e)))?;
        Ok(read_document(&bytes)?)
    }

    /// Reject anything but 8-bit RGB.
    pub fn check_format(&self) -> Result<(), PsdError> {
        if self.color_mode != ColorMode::Rgb {
            return Err(PsdError::UnsupportedColorMode(self.color_mode));
        }
        if self.depth != 8 {
            return Err(PsdError::UnsupportedDepth(self.depth));
        }
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    /// Layer ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = LayerId> {
        (0..self.layers.len()).map(LayerId)
    }

    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.layers[id.0].parent
    }

    /// The layer's parent's parent, if both exist.
    pub fn grandparent(&self, id: LayerId) -> Option<LayerId> {
        self.parent(id).and_then(|p| self.parent(p))
    }

    /// Walk from `id` up to the root, starting with `id` itself.
    pub fn ancestors(&self, id: LayerId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: Some(id),
        }
    }
}

/// Iterator over a layer and its ancestors.
pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<LayerId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let layer = self.document.layer(id);
        self.next = layer.parent;
        Some(layer)
    }
}

/// Derive parent links from file order.
///
/// Walking from the top of the stack down, a folder record opens a group
/// and its section divider closes it. The divider itself is parented to the
/// folder it closes.
pub(crate) fn link_parents(layers: &mut [Layer]) {
    let mut open: Vec<LayerId> = Vec::new();
    for i in (0..layers.len()).rev() {
        layers[i].parent = open.last().copied();
        match layers[i].kind {
            LayerKind::OpenFolder | LayerKind::ClosedFolder => open.push(LayerId(i)),
            LayerKind::SectionDivider => {
                open.pop();
            }
            LayerKind::Raster => {}
        }
    }
}
