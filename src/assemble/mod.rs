//! Sprite assembly: turn a decoded layer stack into an [`AssetPack`].
//!
//! Two passes over the layers in file order. The first ([`scan_metadata`])
//! finds calibration markers and registers one empty sprite per visible
//! folder under `export`. The second walks the stack again and, driven by
//! [`classify`], routes each layer's pixels into the sprite opened by the
//! most recent section divider.
//!
//! Recoverable problems go to the [`LogSink`]; only unreadable layer data and
//! an over-full light list abort the read. Whether every sprite ended up with
//! a base layer is checked afterwards by [`crate::validation::validate_pack`].

mod metadata;

pub use metadata::{scan_metadata, DocumentMetadata};

use crate::classify::{classify, split_tokens, LayerRole, SpriteCursor};
use crate::error::{PackError, Result};
use crate::psd::{BlendMode, Document, Layer, LayerId};
use crate::types::{pixel_pos_to_unit_pos, AssetPack, PixelBounds, PositionStatus, SpriteSet, Vec2};
use crate::validation::{Diagnostic, LogSink};

/// Content-scan state carried from one layer to the next.
struct ScanState {
    cursor: SpriteCursor,
    /// Key of the sprite being populated.
    current: Option<String>,
    position: PositionStatus,
}

impl ScanState {
    fn new() -> Self {
        Self {
            cursor: SpriteCursor::default(),
            current: None,
            position: PositionStatus::ParseDone,
        }
    }

    /// Open the sprite whose folder `divider` belongs to.
    fn enter_sprite(&mut self, divider: LayerId, folder: LayerId, name: &str) {
        self.cursor.sprite_folder = Some(folder);
        self.cursor.sprite_divider = Some(divider);
        self.current = Some(name.to_string());
        self.position = PositionStatus::NotParsed;
    }

    /// Fall back to a unit square at the origin if the sprite's position was
    /// never fully read.
    fn finish_sprite(&mut self, pack: &mut AssetPack, log: &mut dyn LogSink) {
        let status = std::mem::replace(&mut self.position, PositionStatus::ParseDone);
        let Some(sprite) = current_sprite(&self.current, pack) else {
            return;
        };

        match status {
            PositionStatus::ParseDone => return,
            PositionStatus::NotParsed => log.append(
                Diagnostic::warning(
                    "psdpack::sprite::position",
                    format!(
                        "failed to parse position and size for sprite '{}'; its pivot will be incorrect in the engine",
                        sprite.name
                    ),
                )
                .with_help("Name the base layer 'x y width height' in units, e.g. '0 0 1 1'"),
            ),
            PositionStatus::ParsedSizeOnly => log.append(
                Diagnostic::warning(
                    "psdpack::sprite::missing-corner",
                    format!(
                        "didn't find position information for sprite '{}'; its pivot will be incorrect in the engine",
                        sprite.name
                    ),
                )
                .with_help("Add a 'corner' layer marking the sprite's corner, or give the base layer 4 numbers"),
            ),
        }

        sprite.min_unit = Vec2::ZERO;
        sprite.size_unit = Vec2::ONE;
    }
}

/// Build the asset pack for a decoded document.
pub fn read_asset_pack(doc: &Document, log: &mut dyn LogSink) -> Result<AssetPack> {
    doc.check_format()?;

    let metadata = scan_metadata(doc, log);
    let mut pack = AssetPack::new(doc.width, doc.height);
    pack.origin = metadata.origin;
    pack.ppdu = metadata.ppdu;
    for &folder in &metadata.sprite_folders {
        let name = &doc.layer(folder).name;
        pack.sprites.insert(name.clone(), SpriteSet::new(name.as_str()));
    }

    let canvas = pack.canvas();
    let origin = pack.origin;
    let ppdu = pack.ppdu;
    let mut state = ScanState::new();

    for id in doc.ids() {
        let role = classify(doc, id, &state.cursor, |name| pack.sprites.contains_key(name));
        if role == LayerRole::Skip {
            continue;
        }
        let layer = doc.layer(id);

        if role == LayerRole::SpriteStart {
            state.finish_sprite(&mut pack, log);
            if let Some(folder) = doc.parent(id) {
                let name = &doc.layer(folder).name;
                state.enter_sprite(id, folder, name);
                if let Some(sprite) = pack.sprites.get_mut(name) {
                    sprite.bounds = PixelBounds::empty(canvas);
                }
            }
            state.cursor.prev = Some(id);
            continue;
        }

        let Some(sprite) = current_sprite(&state.current, &mut pack) else {
            state.cursor.prev = Some(id);
            continue;
        };

        match role {
            LayerRole::MetadataFolder => {
                parse_position(layer, sprite, &mut state.position, log);
            }
            LayerRole::BasePart => {
                sprite.base_layers.push(layer.canvas_rgba(doc.width, doc.height)?);
                sprite.bounds.expand(rect(layer), canvas);
            }
            LayerRole::SingleBase => {
                parse_position(layer, sprite, &mut state.position, log);
                sprite.base_layers.push(layer.canvas_rgba(doc.width, doc.height)?);
                sprite.bounds.expand(rect(layer), canvas);
            }
            LayerRole::Corner => {
                // Only completes a size-only position; otherwise ignored
                if state.position == PositionStatus::ParsedSizeOnly {
                    sprite.min_unit = pixel_pos_to_unit_pos(layer.center() - origin, ppdu);
                    state.position = PositionStatus::ParseDone;
                }
            }
            LayerRole::Emission => {
                if sprite.emission_mask.is_some() {
                    log.append(Diagnostic::warning(
                        "psdpack::sprite::emission",
                        format!(
                            "sprite '{}' has more than one emission layer; only the topmost is used",
                            sprite.name
                        ),
                    ));
                }
                let rgba = layer.canvas_rgba(doc.width, doc.height)?;
                sprite.emission_mask = Some(rgba.chunks_exact(4).map(|px| px[3]).collect());
            }
            LayerRole::Light => {
                if sprite.light_layers.len() >= SpriteSet::MAX_LIGHTS {
                    return Err(PackError::Validation {
                        message: format!(
                            "sprite '{}' has more than {} light layers ('{}' is one too many)",
                            sprite.name,
                            SpriteSet::MAX_LIGHTS,
                            layer.name
                        ),
                        help: Some("Merge or remove light layers; each material has 4 light slots".to_string()),
                    });
                }
                sprite.light_layers.push(layer.canvas_rgba(doc.width, doc.height)?);
                sprite.light_names.push(layer.name.clone());
            }
            LayerRole::Skip | LayerRole::SpriteStart | LayerRole::Other => {}
        }

        state.cursor.prev = Some(id);
    }

    state.finish_sprite(&mut pack, log);

    Ok(pack)
}

fn current_sprite<'p>(current: &Option<String>, pack: &'p mut AssetPack) -> Option<&'p mut SpriteSet> {
    pack.sprites.get_mut(current.as_deref()?)
}

fn rect(layer: &Layer) -> (i32, i32, i32, i32) {
    (layer.left, layer.top, layer.right, layer.bottom)
}

/// Read unit position and size from a base layer or metadata folder name.
///
/// Four numbers give `x y width height`, two give only `width height` and
/// leave the position to a later `corner` layer.
fn parse_position(
    layer: &Layer,
    sprite: &mut SpriteSet,
    status: &mut PositionStatus,
    log: &mut dyn LogSink,
) {
    if layer.has_mask {
        log.append(Diagnostic::warning(
            "psdpack::sprite::base-mask",
            format!(
                "base layer(s) of '{}' have a layer mask, which will be ignored during export",
                sprite.name
            ),
        ));
    }
    let folder_default = layer.kind.is_folder() && layer.blend_mode == BlendMode::PassThrough;
    if layer.blend_mode != BlendMode::Normal && !folder_default {
        log.append(Diagnostic::warning(
            "psdpack::sprite::blend-mode",
            format!(
                "base layer of '{}' uses the {} blend mode instead of normal; the result might look different",
                sprite.name, layer.blend_mode
            ),
        ));
    }

    let tokens = split_tokens(&layer.name, ' ');
    if tokens.len() != 2 && tokens.len() != 4 {
        return;
    }
    let numbers: std::result::Result<Vec<f32>, _> = tokens.iter().map(|t| t.parse::<f32>()).collect();
    match numbers.as_deref() {
        Ok([x, y, w, h]) => {
            sprite.min_unit = Vec2::new(*x, *y);
            sprite.size_unit = Vec2::new(*w, *h);
            *status = PositionStatus::ParseDone;
        }
        Ok([w, h]) => {
            sprite.size_unit = Vec2::new(*w, *h);
            *status = PositionStatus::ParsedSizeOnly;
        }
        Ok(_) => {}
        Err(e) => log.append(
            Diagnostic::warning(
                "psdpack::sprite::position",
                format!(
                    "failed to parse position and size for sprite '{}' from '{}': {}",
                    sprite.name, layer.name, e
                ),
            )
            .with_help("Did you name the base layer with 2 or 4 numbers?"),
        ),
    }
}
