//! In-memory document construction.
//!
//! Layers are pushed in file order: inside `group`, children are added
//! bottom of the stack first, wrapped by the group's divider and folder
//! records the same way a decoded file lays them out.

use super::{BlendMode, Channel, ChannelKind, Document, Layer, LayerKind};

/// Builds synthetic documents for tests and benchmarks.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl DocumentBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Add a raster layer filled with a single colour.
    ///
    /// `rect` is `(left, top, right, bottom)` in canvas pixels.
    pub fn raster(&mut self, name: &str, rect: (i32, i32, i32, i32), rgba: [u8; 4]) -> &mut Self {
        let (left, top, right, bottom) = rect;
        let area = ((right - left).max(0) * (bottom - top).max(0)) as usize;
        let channels = [
            ChannelKind::Red,
            ChannelKind::Green,
            ChannelKind::Blue,
            ChannelKind::Transparency,
        ]
        .into_iter()
        .zip(rgba)
        .map(|(kind, value)| Channel {
            kind,
            data: vec![value; area],
        })
        .collect();

        self.layers.push(Layer {
            name: name.to_string(),
            left,
            top,
            right,
            bottom,
            parent: None,
            kind: LayerKind::Raster,
            visible: true,
            has_mask: false,
            blend_mode: BlendMode::Normal,
            channels,
        });
        self
    }

    /// Add a group. The folder record is pushed after its contents.
    pub fn group(&mut self, name: &str, contents: impl FnOnce(&mut Self)) -> &mut Self {
        self.layers.push(empty_layer("</Layer group>", LayerKind::SectionDivider));
        contents(self);
        self.layers.push(empty_layer(name, LayerKind::OpenFolder));
        self
    }

    /// Hide the most recently pushed layer (for a group, the folder itself).
    pub fn hidden(&mut self) -> &mut Self {
        self.edit_last(|layer| layer.visible = false)
    }

    /// Mark the most recently pushed layer as carrying a layer mask.
    pub fn with_mask(&mut self) -> &mut Self {
        self.edit_last(|layer| layer.has_mask = true)
    }

    pub fn blend(&mut self, mode: BlendMode) -> &mut Self {
        self.edit_last(|layer| layer.blend_mode = mode)
    }

    /// Turn the most recently pushed folder into a collapsed one.
    pub fn closed(&mut self) -> &mut Self {
        self.edit_last(|layer| {
            if layer.kind.is_folder() {
                layer.kind = LayerKind::ClosedFolder;
            }
        })
    }

    /// Drop a channel from the most recently pushed layer.
    pub fn without_channel(&mut self, kind: ChannelKind) -> &mut Self {
        self.edit_last(|layer| layer.channels.retain(|c| c.kind != kind))
    }

    pub fn build(self) -> Document {
        Document::new(self.width, self.height, self.layers)
    }

    fn edit_last(&mut self, edit: impl FnOnce(&mut Layer)) -> &mut Self {
        if let Some(layer) = self.layers.last_mut() {
            edit(layer);
        }
        self
    }
}

fn empty_layer(name: &str, kind: LayerKind) -> Layer {
    Layer {
        name: name.to_string(),
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
        parent: None,
        kind,
        visible: true,
        has_mask: false,
        blend_mode: BlendMode::PassThrough,
        channels: Vec::new(),
    }
}
