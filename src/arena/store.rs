use crate::arena::pool::{Pool, PoolKind};
use crate::foundation::config::RuntimeConfig;
use crate::model::anim::{AnimHandle, Animation, Frame, FrameId, Layer, LayerId};

/// Live/capacity counters for one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Occupied slots.
    pub live: u32,
    /// Total slots.
    pub capacity: u32,
}

/// Counters for all three pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ArenaStats {
    /// Layer pool.
    pub layers: PoolStats,
    /// Frame pool.
    pub frames: PoolStats,
    /// Animation pool.
    pub animations: PoolStats,
}

impl ArenaStats {
    /// True when nothing is allocated in any pool.
    pub fn is_idle(&self) -> bool {
        self.layers.live == 0 && self.frames.live == 0 && self.animations.live == 0
    }
}

/// The three fixed-capacity pools backing every loaded animation.
#[derive(Debug)]
pub struct ObjectArena {
    layers: Pool<Layer>,
    frames: Pool<Frame>,
    animations: Pool<Animation>,
}

impl ObjectArena {
    /// Build an arena sized by `config`.
    ///
    /// Capacities are taken as given; run [`RuntimeConfig::validate`] first for untrusted
    /// configs. `AnimationRuntime::new` does.
    ///
    /// # Panics
    ///
    /// Panics if any capacity is `u32::MAX`, which is reserved for the free-list sentinel.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            layers: Pool::with_capacity(PoolKind::Layer, config.max_layers),
            frames: Pool::with_capacity(PoolKind::Frame, config.max_frames),
            animations: Pool::with_capacity(PoolKind::Animation, config.max_animations),
        }
    }

    /// Take a blank layer slot.
    pub fn allocate_layer(&mut self) -> Option<LayerId> {
        self.layers.allocate(Layer::default())
    }

    /// Take a blank frame slot.
    pub fn allocate_frame(&mut self) -> Option<FrameId> {
        self.frames.allocate(Frame::default())
    }

    /// Take a blank animation slot.
    pub fn allocate_animation(&mut self) -> Option<AnimHandle> {
        self.animations.allocate(Animation::default())
    }

    /// Return a layer slot; its pixel buffer is dropped with it.
    pub fn release_layer(&mut self, id: LayerId) -> Option<Layer> {
        self.layers.release(id)
    }

    /// Return a frame slot without touching its layers.
    pub fn release_frame(&mut self, id: FrameId) -> Option<Frame> {
        self.frames.release(id)
    }

    /// Return an animation slot without touching its frames.
    pub fn release_animation(&mut self, id: AnimHandle) -> Option<Animation> {
        self.animations.release(id)
    }

    /// Release every frame reachable from `first`, each frame's layers before the frame itself.
    ///
    /// Returns `(frames, layers)` released.
    pub fn release_frame_chain(&mut self, first: Option<FrameId>) -> (usize, usize) {
        let (mut frames, mut layers) = (0, 0);
        let mut next_frame = first;
        while let Some(frame_id) = next_frame {
            let Some(frame) = self.frames.get(frame_id) else {
                break;
            };
            let mut next_layer = frame.first_layer;
            while let Some(layer_id) = next_layer {
                next_layer = self.release_layer(layer_id).and_then(|l| l.next_layer);
                layers += 1;
            }
            next_frame = self.release_frame(frame_id).and_then(|f| f.next_frame);
            frames += 1;
        }
        (frames, layers)
    }

    /// Borrow a layer.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Mutably borrow a layer.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// Borrow a frame.
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    /// Mutably borrow a frame.
    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id)
    }

    /// Borrow an animation.
    pub fn animation(&self, id: AnimHandle) -> Option<&Animation> {
        self.animations.get(id)
    }

    /// Mutably borrow an animation.
    pub fn animation_mut(&mut self, id: AnimHandle) -> Option<&mut Animation> {
        self.animations.get_mut(id)
    }

    /// Handles of every live animation.
    pub fn live_animations(&self) -> Vec<AnimHandle> {
        self.animations.live_handles().collect()
    }

    /// Layers of `frame` in list order.
    pub fn frame_layers(&self, frame: FrameId) -> LayerIter<'_> {
        LayerIter {
            arena: self,
            next: self.frames.get(frame).and_then(|f| f.first_layer),
        }
    }

    /// Frames of `anim` in list order.
    pub fn animation_frames(&self, anim: AnimHandle) -> FrameIter<'_> {
        FrameIter {
            arena: self,
            next: self.animations.get(anim).and_then(|a| a.first_frame),
        }
    }

    /// Live counters for diagnostics.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            layers: PoolStats {
                live: self.layers.live(),
                capacity: self.layers.capacity(),
            },
            frames: PoolStats {
                live: self.frames.live(),
                capacity: self.frames.capacity(),
            },
            animations: PoolStats {
                live: self.animations.live(),
                capacity: self.animations.capacity(),
            },
        }
    }
}

/// Iterator over a frame's layer chain.
#[derive(Debug)]
pub struct LayerIter<'a> {
    arena: &'a ObjectArena,
    next: Option<LayerId>,
}

impl<'a> Iterator for LayerIter<'a> {
    type Item = (LayerId, &'a Layer);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let layer = self.arena.layers.get(id)?;
        self.next = layer.next_layer;
        Some((id, layer))
    }
}

/// Iterator over an animation's frame chain.
#[derive(Debug)]
pub struct FrameIter<'a> {
    arena: &'a ObjectArena,
    next: Option<FrameId>,
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = (FrameId, &'a Frame);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let frame = self.arena.frames.get(id)?;
        self.next = frame.next_frame;
        Some((id, frame))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/arena/store.rs"]
mod tests;
