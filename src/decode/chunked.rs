//! Chunked, zlib-compressed animation container (MNG subset).
//!
//! The stream is the 8-byte signature followed by `[len: u32 BE][tag: 4][payload][crc: u32 BE]`
//! records up to `MEND`. A 10-byte `FRAM` opens the frame sequence and every following non-empty
//! `FRAM` starts a new frame. `DEFI` opens a layer; `tEXt`, `flAG`, and the embedded
//! `IHDR`/`IDAT`/`IEND` image describe it. CRCs are read and ignored.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::decode::builder::AnimBuilder;
use crate::decode::format::MNG_SIGNATURE;
use crate::decode::reader::{ByteSource, FieldReader};
use crate::foundation::core::Argb32;
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::model::anim::LAYER_NAME_MAX;

const fn tag(name: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*name)
}

const TAG_PLTE: u32 = tag(b"PLTE");
const TAG_TRNS: u32 = tag(b"tRNS");
const TAG_FRAM: u32 = tag(b"FRAM");
const TAG_DEFI: u32 = tag(b"DEFI");
const TAG_TEXT: u32 = tag(b"tEXt");
const TAG_FLAG: u32 = tag(b"flAG");
const TAG_IHDR: u32 = tag(b"IHDR");
const TAG_IDAT: u32 = tag(b"IDAT");
const TAG_IEND: u32 = tag(b"IEND");
const TAG_MEND: u32 = tag(b"MEND");

const TEXT_MAX: u32 = 256;
const TEXT_KEYWORD: &[u8; 5] = b"LAYER";

/// PNG color types the decoder accepts.
const COLOR_RGB: u8 = 2;
const COLOR_INDEXED: u8 = 3;
const COLOR_RGBA: u8 = 6;

/// Inflated size of the malformed 2x2 indexed images handled by [`is_short_indexed_2x2`].
const QUIRK_2X2_INFLATED: usize = 18;

type Palette = [Argb32; 256];

/// Image header plus the compressed payload gathered from `IDAT` chunks.
#[derive(Debug, Default)]
pub(crate) struct PendingImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) depth: u8,
    pub(crate) color: u8,
    pub(crate) modes: [u8; 3],
    pub(crate) zdata: Vec<u8>,
}

/// Decode a chunked animation from `src` into `builder`.
pub(crate) fn decode<R: ByteSource + ?Sized>(
    src: &mut R,
    builder: &mut AnimBuilder<'_>,
) -> SpriteResult<()> {
    src.expect_signature(&MNG_SIGNATURE, "mng")?;

    let mut global: Palette = [0xFF00_0000; 256];
    let mut frame_palette: Palette = global;
    let mut has_plte = false;
    let mut fram_open = false;
    let mut image: Option<PendingImage> = None;

    loop {
        let Some(size) = src.be_u32_or_eof("chunk length")? else {
            tracing::debug!("stream ended before MEND");
            break;
        };
        let tag = src.be_u32("chunk tag")?;
        tracing::trace!(tag = %tag_name(tag), size, "chunk");

        match tag {
            TAG_TRNS => {
                let target = if fram_open {
                    &mut frame_palette
                } else {
                    &mut global
                };
                match size {
                    256 => read_trns(src, target)?,
                    0 => {}
                    _ => return Err(bad_size("tRNS", size)),
                }
            }
            TAG_PLTE => {
                let target = if fram_open {
                    &mut frame_palette
                } else {
                    &mut global
                };
                match size {
                    768 => {
                        read_plte(src, target)?;
                        has_plte = true;
                    }
                    0 => {}
                    _ => return Err(bad_size("PLTE", size)),
                }
            }
            TAG_FRAM => {
                match size {
                    10 => {
                        src.skip(10)?;
                        if fram_open {
                            return Err(SpriteError::malformed(
                                "frame sequence opened twice",
                            ));
                        }
                        fram_open = true;
                    }
                    0 => {
                        if !fram_open {
                            return Err(SpriteError::malformed(
                                "frame boundary before frame sequence",
                            ));
                        }
                    }
                    _ => return Err(bad_size("FRAM", size)),
                }
                let empty_marker = size == 0 && builder.current_frame_layers() == 0;
                if !empty_marker {
                    builder.push_frame()?;
                    frame_palette = global;
                }
            }
            TAG_DEFI => {
                if size != 12 {
                    return Err(bad_size("DEFI", size));
                }
                let id = builder.push_layer()?;
                src.skip(4)?;
                let x = src.be_i32("layer x")?;
                let y = src.be_i32("layer y")?;
                let layer = builder.layer_mut(id)?;
                layer.x = x;
                layer.y = y;
                layer.visible = true;
            }
            TAG_TEXT => {
                if size > TEXT_MAX {
                    return Err(bad_size("tEXt", size));
                }
                let text = src.bytes_exact(size as usize, "tEXt payload")?;
                let name = parse_layer_name(&text)?;
                builder.current_layer("tEXt")?.name = name;
            }
            TAG_FLAG => {
                if size != 4 {
                    return Err(bad_size("flAG", size));
                }
                let mask = src.le_u32("layer mask")?;
                builder.current_layer("flAG")?.mask = mask;
            }
            TAG_IHDR => {
                if size != 13 {
                    return Err(bad_size("IHDR", size));
                }
                image = Some(PendingImage {
                    width: src.be_u32("image width")?,
                    height: src.be_u32("image height")?,
                    depth: src.byte("bit depth")?,
                    color: src.byte("color type")?,
                    modes: src.array("compression/filter/interlace")?,
                    zdata: Vec::new(),
                });
            }
            TAG_IDAT => {
                let pending = image
                    .as_mut()
                    .ok_or_else(|| SpriteError::malformed("IDAT before IHDR"))?;
                src.append(&mut pending.zdata, size as usize, "IDAT payload")?;
            }
            TAG_IEND => {
                if size != 0 {
                    return Err(bad_size("IEND", size));
                }
                let pending = image
                    .take()
                    .ok_or_else(|| SpriteError::malformed("IEND before IHDR"))?;
                let palette = if fram_open { &frame_palette } else { &global };
                let layer = builder.current_layer("IEND")?;
                layer.w = pending.width;
                layer.h = pending.height;
                layer.rgba = match decode_image(&pending, has_plte.then_some(palette)) {
                    Ok(pixels) => Some(pixels),
                    Err(err) => {
                        tracing::warn!(
                            layer = %layer.name,
                            width = pending.width,
                            height = pending.height,
                            color = pending.color,
                            error = %err,
                            "layer bitmap left empty"
                        );
                        None
                    }
                };
            }
            TAG_MEND => {
                src.skip(u64::from(size))?;
                let _crc = src.be_u32_or_eof("MEND crc")?;
                break;
            }
            _ => src.skip(u64::from(size))?,
        }
        let _crc = src.be_u32("chunk crc")?;
    }
    Ok(())
}

/// Decode one embedded image to `0xAARRGGBB` pixels.
///
/// `palette` is `None` when the stream carried no `PLTE`, which rules out indexed images
/// outside the 2x2 compatibility case.
pub(crate) fn decode_image(
    image: &PendingImage,
    palette: Option<&Palette>,
) -> SpriteResult<Vec<Argb32>> {
    if image.depth != 8 {
        return Err(SpriteError::unsupported(format!(
            "bit depth {} (only 8 is supported)",
            image.depth
        )));
    }
    if image.modes != [0, 0, 0] {
        return Err(SpriteError::unsupported(format!(
            "compression/filter/interlace modes {:?}",
            image.modes
        )));
    }
    let bpp = match image.color {
        COLOR_RGB => 3,
        COLOR_INDEXED => 1,
        COLOR_RGBA => 4,
        other => {
            return Err(SpriteError::unsupported(format!("color type {other}")));
        }
    };
    let width = image.width as usize;
    let height = image.height as usize;
    let expected = width
        .checked_mul(bpp)
        .and_then(|row| row.checked_add(1))
        .and_then(|row| row.checked_mul(height))
        .ok_or_else(|| SpriteError::unsupported("image dimensions overflow"))?;

    let raw = if image.zdata.len() == expected {
        None
    } else {
        Some(inflate_bounded(&image.zdata, expected)?)
    };
    let data = raw.as_deref().unwrap_or(image.zdata.as_slice());
    if data.len() == expected {
        if bpp == 1 && palette.is_none() {
            return Err(SpriteError::unsupported("indexed image without a palette"));
        }
        return Ok(unpack_scanlines(data, width, height, bpp, palette));
    }
    if is_short_indexed_2x2(image, data.len()) {
        tracing::warn!("2x2 indexed image inflated to 18 bytes; reading it as RGBA");
        return Ok(unpack_scanlines(data, width, height, 4, None));
    }
    Err(SpriteError::inflate(format!(
        "inflated {} bytes, expected {expected} for {}x{} color type {}",
        data.len(),
        image.width,
        image.height,
        image.color
    )))
}

/// Compatibility quirk: some assets store a 2x2 "indexed" image whose payload is really
/// 4 bytes per pixel (2 rows of filter byte + 8 bytes).
fn is_short_indexed_2x2(image: &PendingImage, inflated: usize) -> bool {
    image.width == 2
        && image.height == 2
        && image.color == COLOR_INDEXED
        && inflated == QUIRK_2X2_INFLATED
}

/// Inflate just past `expected` bytes (or past the 2x2 quirk size) so oversized payloads are
/// detected without reading them fully.
fn inflate_bounded(zdata: &[u8], expected: usize) -> SpriteResult<Vec<u8>> {
    let limit = expected.max(QUIRK_2X2_INFLATED) as u64 + 1;
    // `expected` comes from an unchecked header; let the buffer grow with the real data.
    let mut out = Vec::new();
    ZlibDecoder::new(zdata)
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| SpriteError::inflate(e.to_string()))?;
    Ok(out)
}

fn unpack_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bpp: usize,
    palette: Option<&Palette>,
) -> Vec<Argb32> {
    let mut out = Vec::with_capacity(width * height);
    for row in data.chunks_exact(1 + width * bpp).take(height) {
        // Leading filter-type byte is ignored.
        let pixels = &row[1..];
        match (bpp, palette) {
            (1, Some(pal)) => out.extend(pixels.iter().map(|&i| pal[usize::from(i)])),
            (3, _) => out.extend(pixels.chunks_exact(3).map(|p| {
                0xFF00_0000 | u32::from(p[0]) << 16 | u32::from(p[1]) << 8 | u32::from(p[2])
            })),
            (4, _) => out.extend(pixels.chunks_exact(4).map(|p| {
                u32::from(p[3]) << 24
                    | u32::from(p[0]) << 16
                    | u32::from(p[1]) << 8
                    | u32::from(p[2])
            })),
            // Indexed without a palette is rejected before unpacking.
            _ => {}
        }
    }
    out
}

fn read_plte<R: ByteSource + ?Sized>(src: &mut R, dst: &mut Palette) -> SpriteResult<()> {
    for entry in dst.iter_mut() {
        let [r, g, b]: [u8; 3] = src.array("palette entry")?;
        *entry = (*entry & 0xFF00_0000) | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b);
    }
    Ok(())
}

fn read_trns<R: ByteSource + ?Sized>(src: &mut R, dst: &mut Palette) -> SpriteResult<()> {
    for entry in dst.iter_mut() {
        let a = src.byte("transparency entry")?;
        *entry = (*entry & 0x00FF_FFFF) | u32::from(a) << 24;
    }
    Ok(())
}

/// `LAYER` keyword, one separator byte, then the name.
fn parse_layer_name(text: &[u8]) -> SpriteResult<String> {
    if !text.starts_with(TEXT_KEYWORD) || text.len() < TEXT_KEYWORD.len() + 1 {
        return Err(SpriteError::malformed("tEXt chunk is not a LAYER name"));
    }
    let name = &text[TEXT_KEYWORD.len() + 1..];
    if name.len() > LAYER_NAME_MAX {
        return Err(SpriteError::malformed(format!(
            "layer name of {} bytes exceeds {LAYER_NAME_MAX}",
            name.len()
        )));
    }
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    Ok(String::from_utf8_lossy(&name[..end]).into_owned())
}

fn bad_size(chunk: &str, size: u32) -> SpriteError {
    SpriteError::malformed(format!("unexpected {chunk} chunk size {size}"))
}

fn tag_name(tag: u32) -> String {
    String::from_utf8_lossy(&tag.to_be_bytes()).into_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/decode/chunked.rs"]
mod tests;
