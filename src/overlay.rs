use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::types::{DrawablePoint, Size};

/// A 2D target the trail is painted onto.
pub trait Surface {
    fn size(&self) -> Size;
    /// Resizing discards the current contents.
    fn resize(&mut self, size: Size);
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: &DrawablePoint);
}

/// Live display-area dimensions, polled once per tick.
pub trait Viewport {
    fn size(&self) -> Size;
}

impl Viewport for Size {
    fn size(&self) -> Size {
        *self
    }
}

/// Viewport whose size can be changed from another handle (window resize
/// callbacks, tests).
#[derive(Debug, Clone)]
pub struct SharedViewport {
    packed: Arc<AtomicU64>,
}

impl SharedViewport {
    pub fn new(size: Size) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack(size))),
        }
    }

    pub fn set(&self, size: Size) {
        self.packed.store(pack(size), Ordering::Relaxed);
    }
}

impl Viewport for SharedViewport {
    fn size(&self) -> Size {
        let v = self.packed.load(Ordering::Relaxed);
        Size::new((v >> 32) as u32, v as u32)
    }
}

fn pack(size: Size) -> u64 {
    ((size.width as u64) << 32) | size.height as u64
}

/// In-memory RGBA overlay. Off-surface parts of a rectangle are clipped.
pub struct RasterSurface {
    image: RgbaImage,
    color: Rgba<u8>,
    background: Rgba<u8>,
}

impl RasterSurface {
    pub fn new(size: Size, color: Rgba<u8>, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, background),
            color,
            background,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.image.width() && y < self.image.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Number of pixels currently painted in the dot colour.
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|p| **p == self.color).count()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save(path)
            .with_context(|| format!("Failed to write overlay image to {}", path.display()))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    fn resize(&mut self, size: Size) {
        if size != Surface::size(self) {
            self.image = RgbaImage::from_pixel(size.width, size.height, self.background);
        }
    }

    fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = self.background;
        }
    }

    fn fill_rect(&mut self, rect: &DrawablePoint) {
        if ![rect.x, rect.y, rect.width, rect.height].iter().all(|v| v.is_finite()) {
            return;
        }
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = (rect.x.floor() as i64).clamp(0, w);
        let y0 = (rect.y.floor() as i64).clamp(0, h);
        let x1 = ((rect.x + rect.width).ceil() as i64).clamp(0, w);
        let y1 = ((rect.y + rect.height).ceil() as i64).clamp(0, h);

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px as u32, py as u32, self.color);
            }
        }
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA`. Anything else falls back to `fallback`.
pub fn parse_hex(hex: &str, fallback: Rgba<u8>) -> Rgba<u8> {
    let digits = match hex.strip_prefix('#') {
        Some(d) if (d.len() == 6 || d.len() == 8) && d.is_ascii() => d,
        _ => return fallback,
    };
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let alpha = if digits.len() == 8 { channel(6) } else { Some(255) };
    match (channel(0), channel(2), channel(4), alpha) {
        (Some(r), Some(g), Some(b), Some(a)) => Rgba([r, g, b, a]),
        _ => fallback,
    }
}
