use serde::Serialize;

use crate::arena::store::ObjectArena;
use crate::decode::format::Format;
use crate::foundation::core::Rect;
use crate::model::anim::{AnimHandle, Animation};
use crate::runtime::animations::frame_bounds;

/// Inspection view of a loaded animation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimationSummary {
    /// Container the animation came from.
    pub format: Option<Format>,
    /// Number of frames.
    pub frames_count: usize,
    /// Cursor position.
    pub current_frame: usize,
    /// Per-frame detail, in order.
    pub frames: Vec<FrameSummary>,
}

/// Inspection view of one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSummary {
    /// Zero-based frame index.
    pub index: usize,
    /// Number of layers.
    pub layers_count: usize,
    /// Union of all layer rectangles.
    pub bounding_box: Rect,
    /// Per-layer detail, in draw order.
    pub layers: Vec<LayerSummary>,
}

/// Inspection view of one layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerSummary {
    /// Layer name.
    pub name: String,
    /// Placement within the frame.
    pub rect: Rect,
    /// Phoneme/variant mask.
    pub mask: u32,
    /// Visibility flag.
    pub visible: bool,
    /// Whether the bitmap decoded.
    pub has_bitmap: bool,
}

impl AnimationSummary {
    pub(crate) fn collect(arena: &ObjectArena, handle: AnimHandle, anim: &Animation) -> Self {
        let frames = arena
            .animation_frames(handle)
            .enumerate()
            .map(|(index, (frame_id, frame))| FrameSummary {
                index,
                layers_count: frame.layers_count,
                bounding_box: frame_bounds(arena, frame_id),
                layers: arena
                    .frame_layers(frame_id)
                    .map(|(_, l)| LayerSummary {
                        name: l.name.clone(),
                        rect: l.rect(),
                        mask: l.mask,
                        visible: l.visible,
                        has_bitmap: l.rgba.is_some(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            format: anim.format,
            frames_count: anim.frames_count,
            current_frame: anim.current_index,
            frames,
        }
    }
}
