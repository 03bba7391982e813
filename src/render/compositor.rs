use crate::arena::store::ObjectArena;
use crate::foundation::core::Rect;
use crate::model::anim::{FrameId, Layer};
use crate::render::blend::blend;
use crate::render::surface::Surface;

/// Bounding box of every pixel written during one draw call.
///
/// Starts inverted at the surface extent, so a draw that touches nothing finishes as an empty
/// rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRegion {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl DirtyRegion {
    /// Seed for a `width x height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        Self {
            x1: w - 1,
            y1: h - 1,
            x2: 0,
            y2: 0,
        }
    }

    /// Grow to cover `[x1, x2) x [y1, y2)`.
    pub fn include(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.x1 = self.x1.min(x1);
        self.y1 = self.y1.min(y1);
        self.x2 = self.x2.max(x2);
        self.y2 = self.y2.max(y2);
    }

    /// The accumulated rectangle; width and height never go negative.
    pub fn finish(self) -> Rect {
        Rect::from_edges(self.x1, self.y1, self.x2, self.y2)
    }
}

/// Blend `layer` into `surface` with its top-left corner at `(x, y)`, clipped to the surface.
///
/// Returns `false` when nothing was written: the layer has no usable bitmap or lies entirely
/// outside the surface. Visibility and mask gating are the caller's job.
pub fn draw_layer(
    layer: &Layer,
    surface: &mut Surface<'_>,
    x: i32,
    y: i32,
    alpha: u32,
    dirty: &mut DirtyRegion,
) -> bool {
    let Some(bitmap) = layer.bitmap() else {
        return false;
    };
    let stride = layer.w as usize;
    if (bitmap.len() as u64) < u64::from(layer.w) * u64::from(layer.h) {
        tracing::warn!(
            name = %layer.name,
            len = bitmap.len(),
            w = layer.w,
            h = layer.h,
            "layer bitmap shorter than its size; skipped"
        );
        return false;
    }

    let Some((src_x, dst_x, w)) = clip_span(x, layer.w, surface.width()) else {
        return false;
    };
    let Some((src_y, dst_y, h)) = clip_span(y, layer.h, surface.height()) else {
        return false;
    };

    for row in 0..h {
        let src_start = (src_y + row) as usize * stride + src_x as usize;
        let src = &bitmap[src_start..src_start + w as usize];
        let Some(dst_row) = surface.row_mut((dst_y + row) as u32) else {
            break;
        };
        let dst = &mut dst_row[dst_x as usize..(dst_x + w) as usize];
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = blend(*d, s, alpha);
        }
    }

    dirty.include(dst_x as i32, dst_y as i32, (dst_x + w) as i32, (dst_y + h) as i32);
    true
}

/// Clip a span of `len` pixels placed at `pos` against `[0, limit)`.
///
/// Returns `(source offset, destination offset, clipped length)`, or `None` if nothing remains.
fn clip_span(pos: i32, len: u32, limit: u32) -> Option<(i64, i64, i64)> {
    let mut dst = i64::from(pos);
    let mut src = 0i64;
    let mut len = i64::from(len);
    if dst < 0 {
        src -= dst;
        len += dst;
        dst = 0;
    }
    if dst + len > i64::from(limit) {
        len = i64::from(limit) - dst;
    }
    (len > 0).then_some((src, dst, len))
}

/// Draw every eligible layer of `frame`, offset by `(dx, dy)`, and return the dirty rectangle.
#[tracing::instrument(level = "trace", skip(arena, surface))]
pub(crate) fn draw_frame_layers(
    arena: &ObjectArena,
    frame: FrameId,
    surface: &mut Surface<'_>,
    dx: i32,
    dy: i32,
    active_mask: u32,
    alpha: u32,
) -> Rect {
    let mut dirty = DirtyRegion::new(surface.width(), surface.height());
    for (_, layer) in arena.frame_layers(frame) {
        if !layer.visible || layer.is_suppressed_variant(active_mask) {
            continue;
        }
        draw_layer(
            layer,
            surface,
            layer.x.saturating_add(dx),
            layer.y.saturating_add(dy),
            alpha,
            &mut dirty,
        );
    }
    dirty.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
