use crate::foundation::core::Argb32;
use crate::foundation::error::{SpriteError, SpriteResult};

/// Caller-owned, row-major pixel buffer the compositor draws into.
#[derive(Debug)]
pub struct Surface<'a> {
    pixels: &'a mut [Argb32],
    width: u32,
    height: u32,
}

impl<'a> Surface<'a> {
    /// Wrap `pixels` as a `width x height` surface.
    ///
    /// The slice length must equal `width * height` exactly.
    pub fn new(pixels: &'a mut [Argb32], width: u32, height: u32) -> SpriteResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| SpriteError::invalid_surface("surface size overflow"))?;
        if pixels.len() != expected {
            return Err(SpriteError::invalid_surface(format!(
                "{width}x{height} surface needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(SpriteError::invalid_surface(format!(
                "{width}x{height} exceeds the addressable range"
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[Argb32] {
        self.pixels
    }

    /// Mutable view of row `y`, or `None` past the bottom edge.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [Argb32]> {
        if y >= self.height {
            return None;
        }
        let w = self.width as usize;
        let start = y as usize * w;
        self.pixels.get_mut(start..start + w)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
