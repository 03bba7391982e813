use crate::arena::pool::Handle;
use crate::decode::format::Format;
use crate::foundation::core::{Argb32, Rect};
use crate::render::blend;

/// Handle to a [`Layer`] slot.
pub type LayerId = Handle<Layer>;
/// Handle to a [`Frame`] slot.
pub type FrameId = Handle<Frame>;
/// Opaque handle to a loaded [`Animation`].
pub type AnimHandle = Handle<Animation>;

/// Longest layer name (in bytes) the chunked format accepts, terminator excluded.
pub const LAYER_NAME_MAX: usize = 63;

/// One decoded bitmap placed at an offset within a frame.
#[derive(Clone, Debug, Default)]
pub struct Layer {
    /// Horizontal placement.
    pub x: i32,
    /// Vertical placement.
    pub y: i32,
    /// Bitmap width in pixels.
    pub w: u32,
    /// Bitmap height in pixels.
    pub h: u32,
    /// Phoneme/variant selector; `0` means the layer is drawn regardless of the active mask.
    pub mask: u32,
    /// Whether the layer is drawn at all.
    pub visible: bool,
    /// Display name used by name-based visibility toggles.
    pub name: String,
    /// Row-major `w * h` pixels, or `None` when the bitmap failed to decode.
    pub rgba: Option<Vec<Argb32>>,
    pub(crate) next_layer: Option<LayerId>,
}

impl Layer {
    /// Placement rectangle within the frame.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            i32::try_from(self.w).unwrap_or(i32::MAX),
            i32::try_from(self.h).unwrap_or(i32::MAX),
        )
    }

    /// Decoded pixels, if any.
    pub fn bitmap(&self) -> Option<&[Argb32]> {
        self.rgba.as_deref()
    }

    /// Case-insensitive (ASCII) name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether the compositor should skip this layer for the given active phoneme mask.
    ///
    /// Layers with mask `0` are never suppressed; otherwise the layer is a variant that is only
    /// drawn when it shares a bit with `active_mask`.
    pub fn is_suppressed_variant(&self, active_mask: u32) -> bool {
        blend::is_suppressed_variant(self.mask, active_mask)
    }
}

/// Ordered chain of layers forming one pose.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Number of layers reachable from `first_layer`.
    pub layers_count: usize,
    pub(crate) first_layer: Option<LayerId>,
    pub(crate) next_frame: Option<FrameId>,
}

/// Ordered chain of frames plus the seek cursor.
#[derive(Clone, Debug, Default)]
pub struct Animation {
    /// Number of frames reachable from `first_frame`.
    pub frames_count: usize,
    /// Container format the animation was decoded from.
    pub format: Option<Format>,
    pub(crate) first_frame: Option<FrameId>,
    pub(crate) current_frame: Option<FrameId>,
    pub(crate) current_index: usize,
}

#[cfg(test)]
#[path = "../../tests/unit/model/anim.rs"]
mod tests;
