//! Parallax scrolling layers.
//!
//! One layer is a repeating texture band advancing at its own rate. The
//! scroll offset is re-modulated into `[0, width)` every update, so it
//! never drifts no matter how long the scene runs, and rendering draws up
//! to three copies so the viewport is covered at any offset without a
//! visible seam.

use crate::gfx::texture_cache::TextureCache;
use raylib::prelude::{Color, RaylibDraw, Rectangle, Vector2};

#[derive(Debug, Clone)]
pub struct ParallaxLayer {
    /// Texture cache key for the current variant.
    pub texture_id: String,
    /// Source texture size; zero until the texture is resident.
    pub width: f32,
    pub height: f32,
    /// Scroll offset in `[0, width)`.
    pub offset: f32,
    /// Scroll rate in pixels per second.
    pub speed: f32,
}

impl ParallaxLayer {
    pub fn new(texture_id: impl Into<String>, speed: f32) -> Self {
        Self {
            texture_id: texture_id.into(),
            width: 0.0,
            height: 0.0,
            offset: 0.0,
            speed,
        }
    }

    /// Resume a layer at a previously captured offset. Used when a scene
    /// inherits another scene's backgrounds for visual continuity.
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Pick up the texture dimensions once the cache has them.
    pub fn sync_size(&mut self, cache: &TextureCache) {
        if self.width <= 0.0 {
            if let Some((w, h)) = cache.dimensions(&self.texture_id) {
                self.width = w;
                self.height = h;
            }
        }
    }

    /// Advance the scroll offset by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.width <= 0.0 {
            return;
        }
        self.offset = wrap_offset(self.offset - self.speed * dt, self.width);
    }

    /// Draw the band, tiled to cover `viewport_w`, vertically centered in
    /// `viewport_h`.
    pub fn render<D: RaylibDraw>(&self, d: &mut D, cache: &TextureCache, viewport_w: f32, viewport_h: f32) {
        let Some(texture) = cache.get(&self.texture_id) else {
            return;
        };
        let w = texture.width as f32;
        let h = texture.height as f32;
        if w <= 0.0 {
            return;
        }
        let y = (viewport_h - h) / 2.0;
        let base = -self.offset.floor();
        let src = Rectangle {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        };
        for copy in 0..3 {
            let x = base + w * copy as f32;
            // Two copies always suffice for offsets in [0, w); a third is
            // needed only when the band is narrower than the viewport.
            if copy == 2 && x >= viewport_w {
                break;
            }
            let dest = Rectangle {
                x,
                y,
                width: w,
                height: h,
            };
            d.draw_texture_pro(texture, src, dest, Vector2::zero(), 0.0, Color::WHITE);
        }
    }
}

/// Modulate `offset` into `[0, width)`.
pub fn wrap_offset(offset: f32, width: f32) -> f32 {
    ((offset % width) + width) % width
}
