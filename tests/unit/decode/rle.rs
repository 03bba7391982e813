use std::io::Cursor;

use super::*;
use crate::arena::store::ObjectArena;
use crate::foundation::config::RuntimeConfig;
use crate::model::anim::{FrameId, Layer};

struct LayerSpec<'a> {
    x: f32,
    y: f32,
    mask: u32,
    name: &'a str,
    tag: &'a [u8; 4],
    format: u32,
    w: u32,
    h: u32,
    planes: u32,
    palette: Option<&'a Palette>,
    payload: &'a [u8],
}

impl Default for LayerSpec<'_> {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            mask: 0,
            name: "",
            tag: CODEC_TAG,
            format: RLE_PALETTED,
            w: 1,
            h: 1,
            planes: 1,
            palette: None,
            payload: &[],
        }
    }
}

fn palette_bytes(pal: &Palette) -> Vec<u8> {
    pal.iter().flat_map(|c| c.to_le_bytes()).collect()
}

fn layer_record(spec: &LayerSpec<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&spec.x.to_le_bytes());
    out.extend_from_slice(&spec.y.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&spec.mask.to_le_bytes());
    let mut name = [0u8; LAYER_NAME_FIELD];
    name[..spec.name.len()].copy_from_slice(spec.name.as_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(spec.tag);
    out.extend_from_slice(&spec.format.to_le_bytes());
    out.extend_from_slice(&[0; 3]);
    out.extend_from_slice(&spec.w.to_le_bytes());
    out.extend_from_slice(&spec.h.to_le_bytes());
    out.extend_from_slice(&u32::from(spec.palette.is_some()).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&spec.planes.to_le_bytes());
    out.extend_from_slice(&(spec.payload.len() as u32).to_le_bytes());
    if let Some(pal) = spec.palette {
        out.extend_from_slice(&palette_bytes(pal));
    }
    out.extend_from_slice(spec.payload);
    out
}

fn container(global: Option<&Palette>, frames: &[Vec<LayerSpec<'_>>]) -> Vec<u8> {
    let mut out = RLE_SIGNATURE.to_vec();
    out.extend_from_slice(&(frames.len() as u32).to_le_bytes());
    out.extend_from_slice(&u32::from(global.is_some()).to_le_bytes());
    if let Some(pal) = global {
        out.extend_from_slice(&palette_bytes(pal));
    }
    for layers in frames {
        out.extend_from_slice(&[0; 12]);
        out.extend_from_slice(&(layers.len() as u32).to_le_bytes());
        for spec in layers {
            out.extend_from_slice(&layer_record(spec));
        }
    }
    out
}

fn decode_frames(bytes: Vec<u8>) -> SpriteResult<Vec<Vec<Layer>>> {
    let mut arena = ObjectArena::new(&RuntimeConfig::default());
    let built = {
        let mut builder = AnimBuilder::new(&mut arena);
        decode(&mut Cursor::new(bytes), &mut builder)?;
        builder.finish()
    };
    let mut frames = Vec::new();
    let mut next: Option<FrameId> = built.first_frame;
    while let Some(id) = next {
        frames.push(arena.frame_layers(id).map(|(_, l)| l.clone()).collect());
        next = arena.frame(id).and_then(|f| f.next_frame);
    }
    Ok(frames)
}

fn test_palette() -> Palette {
    let mut pal = [0; 256];
    pal[7] = 0xFF11_2233;
    pal[9] = 0x8044_5566;
    pal
}

#[test]
fn opcodes_expand_to_transparent_repeat_and_literal_runs() {
    let pal = test_palette();
    // 1 transparent, 1 repeat of index 7, 6 literal indices.
    let payload = [0xC0, 0x80, 7, 0x05, 9, 9, 7, 7, 9, 7];
    let frames = decode_frames(container(
        Some(&pal),
        &[vec![LayerSpec {
            w: 8,
            h: 1,
            payload: &payload,
            ..LayerSpec::default()
        }]],
    ))
    .unwrap();

    let px = frames[0][0].bitmap().unwrap();
    assert_eq!(
        px,
        &[
            0,
            0xFF11_2233,
            0x8044_5566,
            0x8044_5566,
            0xFF11_2233,
            0xFF11_2233,
            0x8044_5566,
            0xFF11_2233,
        ]
    );
}

#[test]
fn direct_color_runs_read_full_words() {
    let mut payload = vec![0x81];
    payload.extend_from_slice(&0xFFAB_CDEFu32.to_le_bytes());
    payload.push(0x00);
    payload.extend_from_slice(&0x0102_0304u32.to_le_bytes());
    payload.push(0xC0);
    let frames = decode_frames(container(
        None,
        &[vec![LayerSpec {
            format: RLE_DIRECT,
            w: 2,
            h: 2,
            payload: &payload,
            ..LayerSpec::default()
        }]],
    ))
    .unwrap();
    assert_eq!(
        frames[0][0].bitmap().unwrap(),
        &[0xFFAB_CDEF, 0xFFAB_CDEF, 0x0102_0304, 0]
    );
}

#[test]
fn layer_fields_are_decoded() {
    let frames = decode_frames(container(
        None,
        &[
            vec![
                LayerSpec {
                    x: -2.75,
                    y: 14.9,
                    mask: 0b0110,
                    name: "mouth_open",
                    payload: &[0xC0],
                    ..LayerSpec::default()
                },
                LayerSpec {
                    name: "eyes",
                    payload: &[0xC0],
                    ..LayerSpec::default()
                },
            ],
            vec![],
        ],
    ))
    .unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].len(), 2);
    assert!(frames[1].is_empty());
    let l = &frames[0][0];
    assert_eq!((l.x, l.y), (-2, 14));
    assert_eq!(l.mask, 0b0110);
    assert_eq!(l.name, "mouth_open");
    assert!(l.visible);
    assert_eq!(frames[0][1].name, "eyes");
}

#[test]
fn layer_palette_overrides_global() {
    let global = test_palette();
    let mut local = [0; 256];
    local[7] = 0xFF00_FF00;
    let frames = decode_frames(container(
        Some(&global),
        &[vec![
            LayerSpec {
                palette: Some(&local),
                payload: &[0x80, 7],
                ..LayerSpec::default()
            },
            LayerSpec {
                payload: &[0x80, 7],
                ..LayerSpec::default()
            },
        ]],
    ))
    .unwrap();
    assert_eq!(frames[0][0].bitmap().unwrap(), &[0xFF00_FF00]);
    assert_eq!(frames[0][1].bitmap().unwrap(), &[0xFF11_2233]);
}

#[test]
fn unknown_pixel_format_yields_blank_bitmap_and_continues() {
    let frames = decode_frames(container(
        None,
        &[vec![
            LayerSpec {
                format: 0x1234,
                w: 2,
                h: 1,
                payload: &[0xAA, 0xBB, 0xCC],
                ..LayerSpec::default()
            },
            LayerSpec {
                format: RLE_PALETTED_ALT,
                name: "after",
                payload: &[0xC0],
                ..LayerSpec::default()
            },
        ]],
    ))
    .unwrap();
    assert_eq!(frames[0][0].bitmap().unwrap(), &[0, 0]);
    assert_eq!(frames[0][1].name, "after");
}

#[test]
fn payload_size_mismatch_is_malformed() {
    // Declared 2 bytes, but the repeat opcode consumes 1 + 4.
    let payload = [0x80, 0, 0, 0, 0];
    let bytes = {
        let mut b = container(
            None,
            &[vec![LayerSpec {
                format: RLE_DIRECT,
                payload: &payload,
                ..LayerSpec::default()
            }]],
        );
        // Patch the declared size (last u32 before the payload).
        let at = b.len() - payload.len() - 4;
        b[at..at + 4].copy_from_slice(&2u32.to_le_bytes());
        b
    };
    assert!(matches!(
        decode_frames(bytes).unwrap_err(),
        SpriteError::MalformedContainer(_)
    ));
}

#[test]
fn run_past_bitmap_end_is_malformed() {
    let err = decode_frames(container(
        None,
        &[vec![LayerSpec {
            w: 2,
            h: 1,
            payload: &[0xC2],
            ..LayerSpec::default()
        }]],
    ))
    .unwrap_err();
    assert!(matches!(err, SpriteError::MalformedContainer(_)));
}

#[test]
fn layer_larger_than_its_payload_is_malformed() {
    for (w, h) in [(u32::MAX, u32::MAX), (0x1_0000, 0x1_0000), (65, 1)] {
        let err = decode_frames(container(
            None,
            &[vec![LayerSpec {
                w,
                h,
                payload: &[0xC0],
                ..LayerSpec::default()
            }]],
        ))
        .unwrap_err();
        assert!(matches!(err, SpriteError::MalformedContainer(_)), "{w}x{h}");
    }

    // A single transparent run of 64 is the most one opcode byte can cover.
    let frames = decode_frames(container(
        None,
        &[vec![LayerSpec {
            w: 64,
            h: 1,
            payload: &[0xFF],
            ..LayerSpec::default()
        }]],
    ))
    .unwrap();
    assert_eq!(frames[0][0].bitmap().unwrap(), &[0; 64]);
}

#[test]
fn codec_tag_and_plane_count_are_checked() {
    let bad_tag = container(
        None,
        &[vec![LayerSpec {
            tag: b"zip\0",
            payload: &[0xC0],
            ..LayerSpec::default()
        }]],
    );
    assert!(matches!(
        decode_frames(bad_tag).unwrap_err(),
        SpriteError::MalformedContainer(_)
    ));

    let bad_planes = container(
        None,
        &[vec![LayerSpec {
            planes: 2,
            payload: &[0xC0],
            ..LayerSpec::default()
        }]],
    );
    assert!(matches!(
        decode_frames(bad_planes).unwrap_err(),
        SpriteError::MalformedContainer(_)
    ));
}

#[test]
fn truncation_and_bad_signature_are_malformed() {
    let mut bytes = container(
        None,
        &[vec![LayerSpec {
            payload: &[0xC0],
            ..LayerSpec::default()
        }]],
    );
    bytes.truncate(bytes.len() - 10);
    assert!(matches!(
        decode_frames(bytes).unwrap_err(),
        SpriteError::MalformedContainer(_)
    ));

    let mut bytes = container(None, &[]);
    bytes[0] ^= 0xFF;
    assert!(matches!(
        decode_frames(bytes).unwrap_err(),
        SpriteError::MalformedContainer(_)
    ));
}

#[test]
fn failed_decode_returns_slots_to_the_arena() {
    let mut arena = ObjectArena::new(&RuntimeConfig::default());
    let bytes = container(
        None,
        &[
            vec![LayerSpec {
                payload: &[0xC0],
                ..LayerSpec::default()
            }],
            vec![LayerSpec {
                tag: b"bad\0",
                ..LayerSpec::default()
            }],
        ],
    );
    {
        let mut builder = AnimBuilder::new(&mut arena);
        assert!(decode(&mut Cursor::new(bytes), &mut builder).is_err());
    }
    assert!(arena.stats().is_idle());
}
