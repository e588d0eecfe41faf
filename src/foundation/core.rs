use crate::foundation::error::{SeneraError, SeneraResult};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Build a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> SeneraResult<Self> {
        if width == 0 || height == 0 {
            return Err(SeneraError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by this size.
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

/// Integer pixel rectangle, top-left anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Construct a rectangle from its top-left corner and size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrink every side by `by` pixels, collapsing to an empty rect at the center if needed.
    pub fn inset(self, by: u32) -> Self {
        let dx = by.min(self.width / 2);
        let dy = by.min(self.height / 2);
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width - 2 * dx,
            height: self.height - 2 * dy,
        }
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(self, other: Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True when `other` lies fully inside `self`.
    pub fn contains_rect(self, other: Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Center point, rounded down.
    pub fn center(self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Opaque sRGB color used for fills and text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// White.
    pub const WHITE: Color = Color::from_hex(0xffffff);
    /// Black.
    pub const BLACK: Color = Color::from_hex(0x000000);
    /// Mid gray used for secondary text.
    pub const GRAY: Color = Color::from_hex(0x808080);
    /// Red used for error text.
    pub const RED: Color = Color::from_hex(0xff0000);

    /// Build a color from a `0xRRGGBB` literal.
    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Opaque RGBA8 bytes (premultiplied and straight are identical at alpha 255).
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// CSS/SVG hex notation, e.g. `#f0f0f0`.
    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
