/// One pixel in `0xAARRGGBB` layout (straight alpha).
pub type Argb32 = u32;

/// Global alpha meaning "fully opaque"; blend scales layer alpha by `alpha / 256`.
pub const ALPHA_OPAQUE: u32 = 256;

/// Integer rectangle in surface coordinates, top-left origin.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels, never negative.
    pub w: i32,
    /// Height in pixels, never negative.
    pub h: i32,
}

impl Rect {
    /// Build a rectangle; negative sizes are clamped to zero.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Build a rectangle from inclusive top-left and exclusive bottom-right edges.
    pub fn from_edges(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    /// True when the rectangle covers no pixel.
    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Exclusive right edge.
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Whether the pixel at `(px, py)` lies inside the rectangle.
    pub fn contains(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Smallest rectangle covering both; an empty side is ignored.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }
}

/// Convert a host-side opacity in `[0, 1]` to the integer global alpha used by the compositor.
///
/// Matches the `(int)(opacity * 256)` conversion of the scripting host, clamped to `0..=256`.
pub fn alpha_from_opacity(opacity: f32) -> u32 {
    if !opacity.is_finite() {
        return 0;
    }
    ((opacity * 256.0) as i32).clamp(0, ALPHA_OPAQUE as i32) as u32
}

/// Split an [`Argb32`] pixel into `[r, g, b, a]` bytes.
pub fn argb_to_rgba8(px: Argb32) -> [u8; 4] {
    let [a, r, g, b] = px.to_be_bytes();
    [r, g, b, a]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
