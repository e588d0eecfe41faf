use std::io::Cursor;

use anyhow::Context as _;

use crate::{
    foundation::core::{CanvasSize, Color, Rect},
    foundation::error::{SeneraError, SeneraResult},
};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Raster the collage is painted into.
///
/// Pixels are premultiplied RGBA8, row-major and tightly packed. The canvas is created once per
/// request, painted, handed to an [`crate::ImageStore`] and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    size: CanvasSize,
    data: Vec<u8>,
}

/// Decoded image ready to be drawn onto a [`Canvas`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PremulImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

impl PremulImage {
    /// Convert a straight-alpha RGBA image.
    pub fn from_rgba(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul,
        }
    }
}

impl Canvas {
    /// New canvas filled with an opaque background.
    pub fn new(size: CanvasSize, background: Color) -> Self {
        let data = background.to_rgba8().repeat(size.area());
        Self { size, data }
    }

    /// Canvas dimensions.
    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Raw premultiplied bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = self.index(x, y);
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * 4
    }

    fn clip(&self, rect: Rect) -> Rect {
        let x = rect.x.min(self.size.width);
        let y = rect.y.min(self.size.height);
        let right = rect.right().min(self.size.width);
        let bottom = rect.bottom().min(self.size.height);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Fill `rect` (clipped to the canvas) with an opaque color.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.clip(rect);
        let px = color.to_rgba8();
        for y in rect.y..rect.bottom() {
            let start = self.index(rect.x, y);
            let end = start + rect.width as usize * 4;
            for chunk in self.data[start..end].chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    /// Draw a one-pixel outline along the inside of `rect`.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - 1, rect.width, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.height), color);
        self.fill_rect(Rect::new(rect.right() - 1, rect.y, 1, rect.height), color);
    }

    /// Composite `img` with its top-left corner at `(x, y)` using source-over.
    ///
    /// Transparent source pixels keep whatever the canvas already holds.
    pub fn draw_image(&mut self, img: &PremulImage, x: u32, y: u32) -> SeneraResult<()> {
        let expected = img.width as usize * img.height as usize * 4;
        if img.rgba8_premul.len() != expected {
            return Err(SeneraError::validation(
                "image byte length does not match width*height*4",
            ));
        }
        let target = self.clip(Rect::new(x, y, img.width, img.height));
        let src_stride = img.width as usize * 4;
        for row in 0..target.height {
            let src_start = row as usize * src_stride;
            let src = &img.rgba8_premul[src_start..src_start + target.width as usize * 4];
            let dst_start = self.index(target.x, target.y + row);
            let dst = &mut self.data[dst_start..dst_start + target.width as usize * 4];
            over_in_place(dst, src)?;
        }
        Ok(())
    }

    /// Composite a full-canvas premultiplied layer (same size as the canvas) on top.
    pub fn draw_layer(&mut self, layer: &[u8]) -> SeneraResult<()> {
        over_in_place(&mut self.data, layer)
    }

    /// Straight-alpha copy suitable for encoding.
    pub fn to_rgba_image(&self) -> SeneraResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.size.width, self.size.height, straight)
            .ok_or_else(|| SeneraError::validation("canvas buffer size mismatch"))
    }

    /// Encode the canvas as PNG bytes.
    pub fn encode_png(&self) -> SeneraResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode canvas as png")?;
        Ok(buf)
    }
}

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Apply [`over`] pixel by pixel to equal-length RGBA8 buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> SeneraResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(SeneraError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Convert straight-alpha RGBA8 to premultiplied in place.
pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255(u16::from(px[0]), a);
        px[1] = mul_div255(u16::from(px[1]), a);
        px[2] = mul_div255(u16::from(px[2]), a);
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/collage/canvas.rs"]
mod tests;
