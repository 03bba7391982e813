use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::Context;

use crate::arena::pool::PoolKind;
use crate::arena::store::{ArenaStats, ObjectArena};
use crate::decode::builder::{AnimBuilder, BuiltFrames};
use crate::decode::format::{Format, FormatHint};
use crate::decode::reader::ByteSource;
use crate::decode::{chunked, rle};
use crate::foundation::config::RuntimeConfig;
use crate::foundation::core::{Argb32, Rect};
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::model::anim::{AnimHandle, Animation, FrameId, Layer, LayerId};
use crate::render::compositor::draw_frame_layers;
use crate::render::surface::Surface;
use crate::runtime::summary::AnimationSummary;

/// Frame targeted by [`AnimationRuntime::set_layer_visibility`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSel {
    /// The frame under the seek cursor.
    Current,
    /// A zero-based frame index.
    Index(usize),
}

/// Owns the layer, frame and animation pools and exposes the animation API over handles.
///
/// All capacity is reserved up front from the [`RuntimeConfig`]. Every accessor validates its
/// handle, so a freed handle yields [`SpriteError::StaleHandle`] instead of another animation's
/// data.
#[derive(Debug)]
pub struct AnimationRuntime {
    config: RuntimeConfig,
    arena: ObjectArena,
}

impl Default for AnimationRuntime {
    fn default() -> Self {
        let config = RuntimeConfig::default();
        Self {
            arena: ObjectArena::new(&config),
            config,
        }
    }
}

impl AnimationRuntime {
    /// Build a runtime with the given pool capacities.
    pub fn new(config: RuntimeConfig) -> SpriteResult<Self> {
        config.validate()?;
        Ok(Self {
            arena: ObjectArena::new(&config),
            config,
        })
    }

    /// Capacities this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read-only view of the pools.
    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    /// Decode an animation from `reader`.
    ///
    /// On any decode error every slot allocated for the animation is released before the error
    /// is returned.
    #[tracing::instrument(skip(self, reader))]
    pub fn load<R: Read + Seek>(
        &mut self,
        mut reader: R,
        hint: FormatHint<'_>,
    ) -> SpriteResult<AnimHandle> {
        let format = hint.resolve(&mut reader)?;
        let handle = self
            .arena
            .allocate_animation()
            .ok_or(SpriteError::PoolExhausted {
                pool: PoolKind::Animation,
            })?;

        let built = match decode_frames(&mut self.arena, &mut reader, format) {
            Ok(built) => built,
            Err(err) => {
                self.arena.release_animation(handle);
                tracing::warn!(format = format.extension(), error = %err, "animation load failed");
                return Err(err);
            }
        };

        if let Some(anim) = self.arena.animation_mut(handle) {
            *anim = Animation {
                frames_count: built.frames_count,
                format: Some(format),
                first_frame: built.first_frame,
                current_frame: built.first_frame,
                current_index: 0,
            };
        }
        tracing::debug!(
            ?handle,
            frames = built.frames_count,
            layers = self.arena.stats().layers.live,
            "animation loaded"
        );
        Ok(handle)
    }

    /// Open `path` and decode it, picking the decoder from the file extension.
    #[tracing::instrument(skip(self))]
    pub fn load_path(&mut self, path: &Path) -> SpriteResult<AnimHandle> {
        let format = Format::from_path(path).ok_or_else(|| {
            SpriteError::unknown_format(format!("no decoder for '{}'", path.display()))
        })?;
        let file =
            File::open(path).with_context(|| format!("open animation '{}'", path.display()))?;
        self.load(BufReader::new(file), FormatHint::Format(format))
    }

    /// Release an animation with all of its frames and layers.
    pub fn free(&mut self, handle: AnimHandle) -> SpriteResult<()> {
        let first = self.animation(handle)?.first_frame;
        let (frames, layers) = self.arena.release_frame_chain(first);
        self.arena.release_animation(handle);
        tracing::debug!(?handle, frames, layers, "animation freed");
        Ok(())
    }

    /// Number of frames.
    pub fn frame_count(&self, handle: AnimHandle) -> SpriteResult<usize> {
        Ok(self.animation(handle)?.frames_count)
    }

    /// Number of layers in frame `frame`.
    pub fn frame_layer_count(&self, handle: AnimHandle, frame: usize) -> SpriteResult<usize> {
        let id = self.frame_id(handle, frame)?;
        Ok(self.arena.frame(id).map_or(0, |f| f.layers_count))
    }

    /// Bounding box of every layer in frame `frame`, regardless of visibility.
    ///
    /// A frame without layers yields the empty rectangle at the origin.
    pub fn frame_bounding_box(&self, handle: AnimHandle, frame: usize) -> SpriteResult<Rect> {
        let id = self.frame_id(handle, frame)?;
        Ok(frame_bounds(&self.arena, id))
    }

    /// Layer `layer` of frame `frame`, both zero-based.
    pub fn get_layer(&self, handle: AnimHandle, frame: usize, layer: usize) -> SpriteResult<&Layer> {
        let frame_id = self.frame_id(handle, frame)?;
        self.arena
            .frame_layers(frame_id)
            .nth(layer)
            .map(|(_, l)| l)
            .ok_or_else(|| {
                SpriteError::out_of_range(format!("layer {layer} of frame {frame} does not exist"))
            })
    }

    /// Pixels of the first layer of the first frame, for animations used as a plain bitmap
    /// (cursors, font sheets). `None` when that layer is missing or has no bitmap.
    pub fn first_bitmap(&self, handle: AnimHandle) -> SpriteResult<Option<&[Argb32]>> {
        let anim = self.animation(handle)?;
        Ok(anim
            .first_frame
            .and_then(|id| self.arena.frame_layers(id).next())
            .and_then(|(_, layer)| layer.bitmap()))
    }

    /// Placement rectangle of one layer.
    pub fn layer_rect(&self, handle: AnimHandle, frame: usize, layer: usize) -> SpriteResult<Rect> {
        Ok(self.get_layer(handle, frame, layer)?.rect())
    }

    /// Move the cursor to frame `frame`.
    pub fn seek(&mut self, handle: AnimHandle, frame: usize) -> SpriteResult<()> {
        let id = self.frame_id(handle, frame)?;
        let anim = self.animation_mut(handle)?;
        anim.current_frame = Some(id);
        anim.current_index = frame;
        Ok(())
    }

    /// Index of the frame under the cursor.
    pub fn current_frame(&self, handle: AnimHandle) -> SpriteResult<usize> {
        Ok(self.animation(handle)?.current_index)
    }

    /// Show or hide the first layer named `name` (ASCII case-insensitive) in the selected frame.
    ///
    /// Returns whether a layer matched; no match is not an error.
    pub fn set_layer_visibility(
        &mut self,
        handle: AnimHandle,
        frame: FrameSel,
        name: &str,
        enabled: bool,
    ) -> SpriteResult<bool> {
        let frame_id = match frame {
            FrameSel::Index(index) => self.frame_id(handle, index)?,
            FrameSel::Current => match self.animation(handle)?.current_frame {
                Some(id) => id,
                None => return Ok(false),
            },
        };
        let found: Option<LayerId> = self
            .arena
            .frame_layers(frame_id)
            .find(|(_, l)| l.name_matches(name))
            .map(|(id, _)| id);
        match found.and_then(|id| self.arena.layer_mut(id)) {
            Some(layer) => {
                layer.visible = enabled;
                Ok(true)
            }
            None => {
                tracing::trace!(name, "no layer to toggle");
                Ok(false)
            }
        }
    }

    /// Composite the current frame into `surface` and return the dirty rectangle.
    ///
    /// Layers whose nonzero mask shares no bit with `phoneme_mask` are skipped, as are hidden
    /// layers. `alpha` is the global opacity with `256` meaning opaque.
    pub fn draw(
        &self,
        handle: AnimHandle,
        surface: &mut Surface<'_>,
        offset_x: i32,
        offset_y: i32,
        phoneme_mask: u32,
        alpha: u32,
    ) -> SpriteResult<Rect> {
        let frame = self
            .animation(handle)?
            .current_frame
            .ok_or_else(|| SpriteError::out_of_range("animation has no frames to draw"))?;
        Ok(draw_frame_layers(
            &self.arena,
            frame,
            surface,
            offset_x,
            offset_y,
            phoneme_mask,
            alpha,
        ))
    }

    /// [`seek`](Self::seek) to `frame`, then [`draw`](Self::draw).
    #[allow(clippy::too_many_arguments)]
    pub fn draw_frame(
        &mut self,
        handle: AnimHandle,
        frame: usize,
        surface: &mut Surface<'_>,
        offset_x: i32,
        offset_y: i32,
        phoneme_mask: u32,
        alpha: u32,
    ) -> SpriteResult<Rect> {
        self.seek(handle, frame)?;
        self.draw(handle, surface, offset_x, offset_y, phoneme_mask, alpha)
    }

    /// Serializable description of the whole animation.
    pub fn summary(&self, handle: AnimHandle) -> SpriteResult<AnimationSummary> {
        let anim = self.animation(handle)?;
        Ok(AnimationSummary::collect(&self.arena, handle, anim))
    }

    /// Live and total slot counts per pool.
    pub fn stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Free every remaining animation and return the counts that were still live.
    pub fn shutdown(mut self) -> ArenaStats {
        let stats = self.arena.stats();
        if !stats.is_idle() {
            tracing::warn!(
                animations = stats.animations.live,
                frames = stats.frames.live,
                layers = stats.layers.live,
                "runtime shut down with live animations"
            );
        }
        for handle in self.arena.live_animations() {
            let first = self.arena.animation(handle).and_then(|a| a.first_frame);
            self.arena.release_frame_chain(first);
            self.arena.release_animation(handle);
        }
        stats
    }

    fn animation(&self, handle: AnimHandle) -> SpriteResult<&Animation> {
        self.arena
            .animation(handle)
            .ok_or_else(|| SpriteError::stale(format!("{handle:?}")))
    }

    fn animation_mut(&mut self, handle: AnimHandle) -> SpriteResult<&mut Animation> {
        self.arena
            .animation_mut(handle)
            .ok_or_else(|| SpriteError::stale(format!("{handle:?}")))
    }

    fn frame_id(&self, handle: AnimHandle, frame: usize) -> SpriteResult<FrameId> {
        let count = self.animation(handle)?.frames_count;
        if frame >= count {
            return Err(SpriteError::out_of_range(format!(
                "frame {frame} of an animation with {count} frames"
            )));
        }
        self.arena
            .animation_frames(handle)
            .nth(frame)
            .map(|(id, _)| id)
            .ok_or_else(|| SpriteError::out_of_range(format!("frame {frame} is not linked")))
    }
}

fn decode_frames<R: ByteSource + ?Sized>(
    arena: &mut ObjectArena,
    src: &mut R,
    format: Format,
) -> SpriteResult<BuiltFrames> {
    let mut builder = AnimBuilder::new(arena);
    match format {
        Format::Mng => chunked::decode(src, &mut builder)?,
        Format::Rle => rle::decode(src, &mut builder)?,
    }
    Ok(builder.finish())
}

/// Min/max over every layer rectangle of `frame`.
pub(crate) fn frame_bounds(arena: &ObjectArena, frame: FrameId) -> Rect {
    arena
        .frame_layers(frame)
        .map(|(_, l)| l.rect())
        .reduce(|acc, r| {
            Rect::from_edges(
                acc.x.min(r.x),
                acc.y.min(r.y),
                acc.right().max(r.right()),
                acc.bottom().max(r.bottom()),
            )
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/animations.rs"]
mod tests;
