use crate::arena::pool::PoolKind;
use crate::arena::store::ObjectArena;
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::model::anim::{FrameId, Layer, LayerId};

/// Frame chain produced by a successful decode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BuiltFrames {
    pub(crate) first_frame: Option<FrameId>,
    pub(crate) frames_count: usize,
}

/// Appends frames and layers to the arena in decode order.
///
/// Decoders only see this type, never the pools. If the builder is dropped without
/// [`finish`](Self::finish), every frame and layer it allocated goes back to the arena.
#[derive(Debug)]
pub(crate) struct AnimBuilder<'a> {
    arena: &'a mut ObjectArena,
    first_frame: Option<FrameId>,
    last_frame: Option<FrameId>,
    last_layer: Option<LayerId>,
    frames_count: usize,
    committed: bool,
}

impl<'a> AnimBuilder<'a> {
    pub(crate) fn new(arena: &'a mut ObjectArena) -> Self {
        Self {
            arena,
            first_frame: None,
            last_frame: None,
            last_layer: None,
            frames_count: 0,
            committed: false,
        }
    }

    /// Allocate a frame and link it after the previous one.
    pub(crate) fn push_frame(&mut self) -> SpriteResult<FrameId> {
        let id = self.arena.allocate_frame().ok_or(SpriteError::PoolExhausted {
            pool: PoolKind::Frame,
        })?;
        match self.last_frame.and_then(|prev| self.arena.frame_mut(prev)) {
            Some(prev) => prev.next_frame = Some(id),
            None => self.first_frame = Some(id),
        }
        self.last_frame = Some(id);
        self.last_layer = None;
        self.frames_count += 1;
        Ok(id)
    }

    /// Allocate a layer and append it to the current frame.
    pub(crate) fn push_layer(&mut self) -> SpriteResult<LayerId> {
        let frame_id = self
            .last_frame
            .ok_or_else(|| SpriteError::malformed("layer defined before any frame"))?;
        let id = self.arena.allocate_layer().ok_or(SpriteError::PoolExhausted {
            pool: PoolKind::Layer,
        })?;
        if let Some(prev) = self.last_layer.and_then(|prev| self.arena.layer_mut(prev)) {
            prev.next_layer = Some(id);
        }
        if let Some(frame) = self.arena.frame_mut(frame_id) {
            if frame.first_layer.is_none() {
                frame.first_layer = Some(id);
            }
            frame.layers_count += 1;
        }
        self.last_layer = Some(id);
        Ok(id)
    }

    /// Number of layers appended to the current frame so far.
    pub(crate) fn current_frame_layers(&self) -> usize {
        self.last_frame
            .and_then(|id| self.arena.frame(id))
            .map_or(0, |f| f.layers_count)
    }

    /// The most recently appended layer.
    pub(crate) fn current_layer(&mut self, chunk: &str) -> SpriteResult<&mut Layer> {
        self.last_layer
            .and_then(|id| self.arena.layer_mut(id))
            .ok_or_else(|| SpriteError::malformed(format!("{chunk} without a current layer")))
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> SpriteResult<&mut Layer> {
        self.arena
            .layer_mut(id)
            .ok_or_else(|| SpriteError::malformed("layer slot vanished during decode"))
    }

    /// Keep everything built so far.
    pub(crate) fn finish(mut self) -> BuiltFrames {
        self.committed = true;
        BuiltFrames {
            first_frame: self.first_frame,
            frames_count: self.frames_count,
        }
    }
}

impl Drop for AnimBuilder<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let (frames, layers) = self.arena.release_frame_chain(self.first_frame);
        if frames > 0 || layers > 0 {
            tracing::debug!(frames, layers, "released partially decoded animation");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/builder.rs"]
mod tests;
