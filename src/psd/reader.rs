//! Binary PSD decoding.
//!
//! Reads the file header, skips colour mode data and image resources, then
//! decodes the layer info block: layer records followed by per-channel image
//! data. The merged composite at the end of the file is never read.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use flate2::read::ZlibDecoder;

use super::{BlendMode, Channel, ChannelKind, ColorMode, Document, Layer, LayerKind, PsdError};

type Result<T> = std::result::Result<T, PsdError>;

struct PsdReader<'a> {
    input: Cursor<&'a [u8]>,
}

impl<'a> PsdReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            input: Cursor::new(data),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.input.read_u8()?)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(self.input.read_u16::<BigEndian>()?)
    }

    fn i16(&mut self) -> Result<i16> {
        Ok(self.input.read_i16::<BigEndian>()?)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(self.input.read_u32::<BigEndian>()?)
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(self.input.read_i32::<BigEndian>()?)
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buffer = [0u8; N];
        self.input.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn remaining(&self) -> usize {
        self.input.get_ref().len().saturating_sub(self.input.position() as usize)
    }

    /// Borrow the next `len` bytes without copying.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.input.get_ref();
        let start = self.input.position() as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| PsdError::InvalidInput("unexpected end of data".to_string()))?;
        self.input.set_position(end as u64);
        Ok(&data[start..end])
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }
}

/// Decode a PSD file held in memory.
pub fn read_document(data: &[u8]) -> Result<Document> {
    let mut reader = PsdReader::new(data);

    if &reader.bytes::<4>()? != b"8BPS" {
        return Err(PsdError::InvalidSignature);
    }
    let version = reader.u16()?;
    if version != 1 {
        return Err(PsdError::UnsupportedVersion(version));
    }
    reader.skip(6)?;
    let _channels = reader.u16()?;
    let height = reader.u32()?;
    let width = reader.u32()?;
    let depth = reader.u16()?;
    let color_mode = ColorMode::from_id(reader.u16()?);

    if color_mode != ColorMode::Rgb {
        return Err(PsdError::UnsupportedColorMode(color_mode));
    }
    if depth != 8 {
        return Err(PsdError::UnsupportedDepth(depth));
    }

    // Colour mode data, then image resources
    let len = reader.u32()? as usize;
    reader.skip(len)?;
    let len = reader.u32()? as usize;
    reader.skip(len)?;

    let section_len = reader.u32()? as usize;
    if section_len == 0 {
        return Err(PsdError::MissingLayerSection);
    }
    let info_len = reader.u32()? as usize;
    if info_len == 0 {
        return Err(PsdError::MissingLayerSection);
    }
    let info = reader.take(info_len)?;
    let layers = read_layer_info(info)?;

    Ok(Document::new(width, height, layers))
}

struct LayerRecord {
    name: String,
    top: i32,
    left: i32,
    bottom: i32,
    right: i32,
    channel_table: Vec<(i16, u32)>,
    blend_mode: BlendMode,
    hidden: bool,
    has_mask: bool,
    kind: LayerKind,
}

impl LayerRecord {
    fn width(&self) -> usize {
        (self.right - self.left).max(0) as usize
    }

    fn height(&self) -> usize {
        (self.bottom - self.top).max(0) as usize
    }

    fn into_layer(self, channels: Vec<Channel>) -> Layer {
        Layer {
            name: self.name,
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            parent: None,
            kind: self.kind,
            visible: !self.hidden,
            has_mask: self.has_mask,
            blend_mode: self.blend_mode,
            channels,
        }
    }
}

fn read_layer_info(data: &[u8]) -> Result<Vec<Layer>> {
    let mut reader = PsdReader::new(data);

    // A negative count only says the first alpha channel holds the merged
    // transparency.
    let count = reader.i16()?.unsigned_abs() as usize;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(read_layer_record(&mut reader)?);
    }

    let mut layers = Vec::with_capacity(count);
    for record in records {
        let mut channels = Vec::new();
        for &(id, len) in &record.channel_table {
            let bytes = reader.take(len as usize)?;
            let kind = ChannelKind::from_id(id);
            if !kind.is_color() {
                continue;
            }
            let data = decode_channel(bytes, record.width(), record.height()).map_err(|e| {
                PsdError::InvalidInput(format!("layer '{}' {} channel: {}", record.name, kind, e))
            })?;
            channels.push(Channel { kind, data });
        }
        layers.push(record.into_layer(channels));
    }

    Ok(layers)
}

fn read_layer_record(reader: &mut PsdReader<'_>) -> Result<LayerRecord> {
    let top = reader.i32()?;
    let left = reader.i32()?;
    let bottom = reader.i32()?;
    let right = reader.i32()?;

    let channel_count = reader.u16()?;
    let mut channel_table = Vec::with_capacity(channel_count as usize);
    for _ in 0..channel_count {
        let id = reader.i16()?;
        let len = reader.u32()?;
        channel_table.push((id, len));
    }

    if &reader.bytes::<4>()? != b"8BIM" {
        return Err(PsdError::InvalidInput(
            "bad blend mode signature in layer record".to_string(),
        ));
    }
    let blend_mode = BlendMode::from_key(reader.bytes::<4>()?);
    let _opacity = reader.u8()?;
    let _clipping = reader.u8()?;
    let flags = reader.u8()?;
    let _filler = reader.u8()?;

    let extra_len = reader.u32()? as usize;
    let mut extra = PsdReader::new(reader.take(extra_len)?);

    let mask_len = extra.u32()? as usize;
    extra.skip(mask_len)?;
    let ranges_len = extra.u32()? as usize;
    extra.skip(ranges_len)?;

    // Pascal string padded to a multiple of four bytes
    let name_len = extra.u8()? as usize;
    let mut name = String::from_utf8_lossy(extra.take(name_len)?).into_owned();
    let padding = ((1 + name_len + 3) & !3) - 1 - name_len;
    extra.skip(padding.min(extra.remaining()))?;

    let mut kind = LayerKind::Raster;
    while extra.remaining() >= 12 {
        let signature = extra.bytes::<4>()?;
        if &signature != b"8BIM" && &signature != b"8B64" {
            break;
        }
        let key = extra.bytes::<4>()?;
        let len = extra.u32()? as usize;
        let block = extra.take(len.min(extra.remaining()))?;
        match &key {
            b"lsct" | b"lsdk" if block.len() >= 4 => {
                kind = section_kind(BigEndian::read_u32(&block[..4]));
            }
            b"luni" => {
                if let Some(unicode) = read_unicode_name(block) {
                    name = unicode;
                }
            }
            _ => {}
        }
    }

    Ok(LayerRecord {
        name,
        top,
        left,
        bottom,
        right,
        channel_table,
        blend_mode,
        hidden: flags & 0x02 != 0,
        has_mask: mask_len > 0,
        kind,
    })
}

fn section_kind(value: u32) -> LayerKind {
    match value {
        1 => LayerKind::OpenFolder,
        2 => LayerKind::ClosedFolder,
        3 => LayerKind::SectionDivider,
        _ => LayerKind::Raster,
    }
}

fn read_unicode_name(block: &[u8]) -> Option<String> {
    if block.len() < 4 {
        return None;
    }
    let count = BigEndian::read_u32(&block[..4]) as usize;
    let units = block.get(4..4 + count * 2)?;
    let utf16: Vec<u16> = units.chunks_exact(2).map(BigEndian::read_u16).collect();
    Some(String::from_utf16_lossy(&utf16).trim_end_matches('\0').to_string())
}

fn decode_channel(bytes: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let size = width * height;
    if size == 0 {
        return Ok(Vec::new());
    }
    if bytes.len() < 2 {
        return Err(PsdError::InvalidInput("channel data is truncated".to_string()));
    }

    let compression = BigEndian::read_u16(&bytes[..2]);
    let payload = &bytes[2..];
    match compression {
        0 => payload
            .get(..size)
            .map(|raw| raw.to_vec())
            .ok_or_else(|| PsdError::InvalidInput("raw channel data is truncated".to_string())),
        1 => unpack_rle(payload, width, height),
        2 => inflate(payload, size),
        3 => {
            let mut data = inflate(payload, size)?;
            for row in data.chunks_mut(width) {
                for x in 1..row.len() {
                    row[x] = row[x].wrapping_add(row[x - 1]);
                }
            }
            Ok(data)
        }
        other => Err(PsdError::UnsupportedCompression(other)),
    }
}

/// Decode RLE channel data: a table of per-row byte counts, then PackBits rows.
fn unpack_rle(payload: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let table_len = height * 2;
    if payload.len() < table_len {
        return Err(PsdError::InvalidInput("RLE row table is truncated".to_string()));
    }

    let mut out = Vec::with_capacity(width * height);
    let mut offset = table_len;
    for row in 0..height {
        let count = BigEndian::read_u16(&payload[row * 2..row * 2 + 2]) as usize;
        let end = offset + count;
        let packed = payload
            .get(offset..end)
            .ok_or_else(|| PsdError::InvalidInput("RLE row is truncated".to_string()))?;
        unpack_bits(packed, width, &mut out)?;
        offset = end;
    }

    Ok(out)
}

fn unpack_bits(src: &[u8], width: usize, out: &mut Vec<u8>) -> Result<()> {
    let target = out.len() + width;
    let mut i = 0;
    while out.len() < target && i < src.len() {
        let header = src[i] as i8;
        i += 1;
        if header >= 0 {
            let count = header as usize + 1;
            let literal = src
                .get(i..i + count)
                .ok_or_else(|| PsdError::InvalidInput("PackBits literal overruns row".to_string()))?;
            out.extend_from_slice(literal);
            i += count;
        } else if header != -128 {
            let count = 1 - header as isize;
            let value = *src
                .get(i)
                .ok_or_else(|| PsdError::InvalidInput("PackBits run overruns row".to_string()))?;
            out.extend(std::iter::repeat(value).take(count as usize));
            i += 1;
        }
    }

    if out.len() != target {
        return Err(PsdError::InvalidInput(format!(
            "RLE row decoded to {} bytes, expected {}",
            out.len() + width - target,
            width
        )));
    }
    Ok(())
}

fn inflate(payload: &[u8], size: usize) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(size);
    ZlibDecoder::new(payload).read_to_end(&mut data)?;
    if data.len() != size {
        return Err(PsdError::InvalidInput(format!(
            "zip channel inflated to {} bytes, expected {}",
            data.len(),
            size
        )));
    }
    Ok(data)
}
