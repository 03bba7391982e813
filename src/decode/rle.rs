//! Run-length encoded animation container.
//!
//! Layout (all integers little-endian): signature, frame count, flags, optional 256-entry global
//! palette, then per frame a 16-byte header whose last word is the layer count, followed by the
//! layer records and their RLE payloads.

use crate::decode::builder::AnimBuilder;
use crate::decode::format::RLE_SIGNATURE;
use crate::decode::reader::{ByteSource, FieldReader};
use crate::foundation::core::Argb32;
use crate::foundation::error::{SpriteError, SpriteResult};

/// Paletted payload, one index byte per pixel.
pub const RLE_PALETTED: u32 = 0x0400_12F9;
/// Paletted payload variant sharing the same pixel encoding.
pub const RLE_PALETTED_ALT: u32 = 0x0400_12FB;
/// Direct-color payload, one little-endian `0xAARRGGBB` word per pixel.
pub const RLE_DIRECT: u32 = 0x0C00_12F9;

const FLAG_HAS_PALETTE: u32 = 1;
const LAYER_NAME_FIELD: usize = 0x39;
const CODEC_TAG: &[u8; 4] = b"rle\0";

const OP_MASK: u8 = 0xC0;
const OP_TRANSPARENT: u8 = 0xC0;
const OP_REPEAT: u8 = 0x80;
const MAX_RUN: u64 = 64;

type Palette = [Argb32; 256];

/// Decode a run-length animation from `src` into `builder`.
pub(crate) fn decode<R: ByteSource + ?Sized>(
    src: &mut R,
    builder: &mut AnimBuilder<'_>,
) -> SpriteResult<()> {
    src.expect_signature(&RLE_SIGNATURE, "rle")?;

    let frames_count = src.le_u32("frame count")?;
    let flags = src.le_u32("header flags")?;
    let global: Palette = if flags & FLAG_HAS_PALETTE != 0 {
        src.le_palette("global palette")?
    } else {
        [0; 256]
    };

    for frame_index in 0..frames_count {
        builder.push_frame()?;
        let header: [u8; 16] = src.array("frame header")?;
        let layers_count = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);
        tracing::trace!(frame_index, layers_count, "rle frame");

        for _ in 0..layers_count {
            let id = builder.push_layer()?;
            let record = read_layer_record(src)?;
            let palette = record.palette.as_ref().unwrap_or(&global);
            let pixels = decode_payload(
                src,
                record.payload_len,
                record.width,
                record.height,
                record.format,
                palette,
            )?;

            let layer = builder.layer_mut(id)?;
            layer.x = record.x;
            layer.y = record.y;
            layer.mask = record.mask;
            layer.name = record.name;
            layer.w = record.width;
            layer.h = record.height;
            layer.rgba = Some(pixels);
            layer.visible = true;
        }
    }
    Ok(())
}

#[derive(Debug)]
struct LayerRecord {
    x: i32,
    y: i32,
    mask: u32,
    name: String,
    format: u32,
    width: u32,
    height: u32,
    payload_len: u32,
    palette: Option<Palette>,
}

fn read_layer_record<R: ByteSource + ?Sized>(src: &mut R) -> SpriteResult<LayerRecord> {
    // Positions are stored as floats; truncate toward zero.
    let x = src.le_f32("layer x")? as i32;
    let y = src.le_f32("layer y")? as i32;
    src.skip(4)?;
    let mask = src.le_u32("layer mask")?;
    let raw_name: [u8; LAYER_NAME_FIELD] = src.array("layer name")?;
    let codec: [u8; 4] = src.array("codec tag")?;
    if &codec != CODEC_TAG {
        return Err(SpriteError::malformed(format!(
            "layer codec tag {codec:02x?} is not \"rle\\0\""
        )));
    }
    let format = src.le_u32("layer format")?;
    src.skip(3)?;
    let width = src.le_u32("layer width")?;
    let height = src.le_u32("layer height")?;
    let layer_flags = src.le_u32("layer flags")?;
    src.skip(4)?;
    let planes = src.le_u32("layer plane count")?;
    if planes != 1 {
        return Err(SpriteError::malformed(format!(
            "layer plane count {planes}, expected 1"
        )));
    }
    let payload_len = src.le_u32("layer payload size")?;
    let palette = if layer_flags & FLAG_HAS_PALETTE != 0 {
        Some(src.le_palette("layer palette")?)
    } else {
        None
    };

    let end = raw_name
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(raw_name.len());
    Ok(LayerRecord {
        x,
        y,
        mask,
        name: String::from_utf8_lossy(&raw_name[..end]).into_owned(),
        format,
        width,
        height,
        payload_len,
        palette,
    })
}

/// How one pixel value is stored in the payload.
#[derive(Clone, Copy, Debug)]
enum PixelCoding<'p> {
    Indexed(&'p Palette),
    Direct,
}

impl PixelCoding<'_> {
    fn value_size(self) -> i64 {
        match self {
            Self::Indexed(_) => 1,
            Self::Direct => 4,
        }
    }

    fn read<R: ByteSource + ?Sized>(self, src: &mut R) -> SpriteResult<Argb32> {
        match self {
            Self::Indexed(pal) => Ok(pal[usize::from(src.byte("palette index")?)]),
            Self::Direct => src.le_u32("pixel color"),
        }
    }
}

/// Expand one RLE payload of exactly `size` bytes into a zeroed `width * height` buffer.
///
/// Unknown `format` codes skip the payload and return the blank buffer. A layer larger than
/// the payload could describe is rejected before anything is allocated.
pub(crate) fn decode_payload<R: ByteSource + ?Sized>(
    src: &mut R,
    size: u32,
    width: u32,
    height: u32,
    format: u32,
    palette: &Palette,
) -> SpriteResult<Vec<Argb32>> {
    let pixels = u64::from(width) * u64::from(height);
    // One opcode byte covers at most `MAX_RUN` pixels.
    if pixels > u64::from(size) * MAX_RUN {
        return Err(SpriteError::malformed(format!(
            "layer size {width}x{height} cannot be covered by a {size}-byte payload"
        )));
    }
    let pixels = usize::try_from(pixels)
        .map_err(|_| SpriteError::malformed(format!("layer size {width}x{height} overflows")))?;
    let mut out = Vec::new();
    out.try_reserve_exact(pixels).map_err(|e| {
        SpriteError::malformed(format!("layer size {width}x{height}: {e}"))
    })?;
    out.resize(pixels, 0);

    let coding = match format {
        RLE_PALETTED | RLE_PALETTED_ALT => PixelCoding::Indexed(palette),
        RLE_DIRECT => PixelCoding::Direct,
        other => {
            let err = SpriteError::unsupported(format!("rle format {other:#x}"));
            tracing::warn!(error = %err, "layer bitmap left blank");
            src.skip(u64::from(size))?;
            return Ok(out);
        }
    };

    let mut remaining = i64::from(size);
    let mut offset = 0usize;
    while remaining > 0 {
        let code = src.byte("rle opcode")?;
        remaining -= 1;
        let count = usize::from(code & 0x3F) + 1;
        let run = out.get_mut(offset..offset + count).ok_or_else(|| {
            SpriteError::malformed(format!(
                "rle run of {count} at pixel {offset} overflows {pixels} pixels"
            ))
        })?;
        match code & OP_MASK {
            OP_TRANSPARENT => {}
            OP_REPEAT => {
                run.fill(coding.read(src)?);
                remaining -= coding.value_size();
            }
            _ => {
                for px in run.iter_mut() {
                    *px = coding.read(src)?;
                }
                remaining -= coding.value_size() * count as i64;
            }
        }
        offset += count;
    }
    if remaining != 0 {
        return Err(SpriteError::malformed(format!(
            "rle payload overran its declared {size} bytes by {}",
            -remaining
        )));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/decode/rle.rs"]
mod tests;
