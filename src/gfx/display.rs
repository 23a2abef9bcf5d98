//! Fixed-resolution display surface.
//!
//! Every scene draws into a framebuffer texture at the logical game
//! resolution, which is then scaled to the actual window with letterboxing
//! or pillarboxing as needed. Nearest-neighbor filtering keeps the pixels
//! sharp when upscaling.

use raylib::ffi::{self, TextureFilter};
use raylib::prelude::*;

/// Texture filtering mode for scaling the render target.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum RenderFilter {
    /// Point/nearest-neighbor filtering - sharp pixels, no blur.
    #[default]
    Nearest,
    /// Bilinear filtering - smooth scaling with interpolation.
    Bilinear,
}

/// Render target for fixed-resolution rendering with scaling.
///
/// Holds a `RenderTexture2D` at the game's logical resolution. The frame
/// loop draws all scene content into this texture, then blits it to the
/// window.
pub struct RenderTarget {
    /// The underlying raylib render texture.
    pub texture: RenderTexture2D,
    /// Logical render width in pixels.
    pub game_width: u32,
    /// Logical render height in pixels.
    pub game_height: u32,
    /// Current texture filtering mode.
    pub filter: RenderFilter,
}

impl RenderTarget {
    /// Create a new render target at the logical game resolution.
    ///
    /// Initializes with nearest-neighbor filtering.
    pub fn new(
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        let texture = rl
            .load_render_texture(th, width, height)
            .map_err(|e| format!("Failed to create render texture: {}", e))?;

        let mut target = Self {
            texture,
            game_width: width,
            game_height: height,
            filter: RenderFilter::default(),
        };
        target.apply_filter();
        Ok(target)
    }

    /// Set the texture filtering mode. Takes effect immediately.
    pub fn set_filter(&mut self, filter: RenderFilter) {
        self.filter = filter;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let filter_value = match self.filter {
            RenderFilter::Nearest => TextureFilter::TEXTURE_FILTER_POINT as i32,
            RenderFilter::Bilinear => TextureFilter::TEXTURE_FILTER_BILINEAR as i32,
        };
        unsafe {
            ffi::SetTextureFilter(self.texture.texture, filter_value);
        }
    }

    /// Source rectangle for drawing this texture.
    ///
    /// Negative height flips the Y axis, compensating for OpenGL's inverted
    /// texture coordinates.
    pub fn source_rect(&self) -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: self.game_width as f32,
            height: -(self.game_height as f32),
        }
    }

    /// Destination rectangle that fits the logical resolution inside the
    /// window, preserving aspect ratio and centering.
    pub fn dest_rect(&self, window_w: i32, window_h: i32) -> Rectangle {
        letterbox(
            self.game_width as f32,
            self.game_height as f32,
            window_w as f32,
            window_h as f32,
        )
    }

    /// Blit the framebuffer to the window. Must be called inside a drawing
    /// scope; the draw-handle parameter enforces that.
    pub fn blit(&self, _d: &mut RaylibDrawHandle, window_w: i32, window_h: i32) {
        let src = self.source_rect();
        let dest = self.dest_rect(window_w, window_h);
        unsafe {
            ffi::DrawTexturePro(
                self.texture.texture,
                src.into(),
                dest.into(),
                ffi::Vector2 { x: 0.0, y: 0.0 },
                0.0,
                Color::WHITE.into(),
            );
        }
    }
}

/// Scale `(src_w, src_h)` to fit `(win_w, win_h)`, centered.
fn letterbox(src_w: f32, src_h: f32, win_w: f32, win_h: f32) -> Rectangle {
    let scale = (win_w / src_w).min(win_h / src_h);
    let out_w = src_w * scale;
    let out_h = src_h * scale;
    Rectangle {
        x: (win_w - out_w) / 2.0,
        y: (win_h - out_h) / 2.0,
        width: out_w,
        height: out_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_letterbox_wide_window_pillarboxes() {
        let r = letterbox(466.0, 466.0, 1920.0, 1080.0);
        assert!(approx_eq(r.height, 1080.0));
        assert!(approx_eq(r.width, 1080.0));
        assert!(approx_eq(r.x, (1920.0 - 1080.0) / 2.0));
        assert!(approx_eq(r.y, 0.0));
    }

    #[test]
    fn test_letterbox_tall_window_letterboxes() {
        let r = letterbox(466.0, 466.0, 500.0, 1000.0);
        assert!(approx_eq(r.width, 500.0));
        assert!(approx_eq(r.height, 500.0));
        assert!(approx_eq(r.x, 0.0));
        assert!(approx_eq(r.y, 250.0));
    }

    #[test]
    fn test_letterbox_exact_fit() {
        let r = letterbox(466.0, 466.0, 932.0, 932.0);
        assert!(approx_eq(r.width, 932.0));
        assert!(approx_eq(r.height, 932.0));
        assert!(approx_eq(r.x, 0.0));
        assert!(approx_eq(r.y, 0.0));
    }
}
