//! Procedural fallback textures.
//!
//! When a texture file is missing or fails to decode, the cache serves a
//! deterministic placeholder so the scene keeps running and the problem is
//! visible on screen. The placeholder style is picked by an id-prefix
//! heuristic and its colors are hashed from the id, so the same missing
//! asset always looks the same.

use raylib::prelude::*;

/// Placeholder size in pixels.
const FALLBACK_SIZE: i32 = 64;

/// Placeholder style selected from the asset id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FallbackKind {
    /// A large colored shape for creature sprites.
    Creature,
    /// A bordered gray rectangle for UI elements.
    Ui,
    /// A colored rectangle with a diagonal hatch for generic sprites.
    Sprite,
    /// Magenta-black checkerboard for everything else.
    Checker,
}

/// Classify an asset id into a placeholder style.
pub fn kind_for_id(id: &str) -> FallbackKind {
    let lower = id.to_ascii_lowercase();
    if lower.contains("digimon") {
        FallbackKind::Creature
    } else if lower.contains("ui") || lower.contains("menu") || lower.contains("button") {
        FallbackKind::Ui
    } else if lower.contains("sprite") {
        FallbackKind::Sprite
    } else {
        FallbackKind::Checker
    }
}

/// Hash an id into a stable, bright color.
pub fn color_from_id(id: &str) -> Color {
    let mut hash: u32 = 0;
    for b in id.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(b as u32);
    }
    let mut r = (hash & 0xFF) as u32;
    let mut g = ((hash >> 8) & 0xFF) as u32;
    let mut b = ((hash >> 16) & 0xFF) as u32;
    // Keep placeholders visible against dark scenes: lift toward white so
    // the average reaches the floor even when a channel saturates.
    let brightness = (r + g + b) / 3;
    if brightness < 200 {
        let t = (200 - brightness) as f32 / (255 - brightness) as f32;
        r = (r + ((255 - r) as f32 * t).ceil() as u32).min(255);
        g = (g + ((255 - g) as f32 * t).ceil() as u32).min(255);
        b = (b + ((255 - b) as f32 * t).ceil() as u32).min(255);
    }
    Color {
        r: r as u8,
        g: g as u8,
        b: b as u8,
        a: 255,
    }
}

/// Generate the placeholder image for `id`. CPU-side only; the caller
/// uploads it to a texture.
pub fn generate_image(id: &str) -> Image {
    let size = FALLBACK_SIZE;
    let color = color_from_id(id);
    match kind_for_id(id) {
        FallbackKind::Creature => {
            let mut img = Image::gen_image_color(size, size, Color::BLACK);
            // Blocky body shape filling most of the frame.
            img.draw_rectangle(8, 12, size - 16, size - 20, color);
            img.draw_rectangle(20, 4, size - 40, 12, color);
            img
        }
        FallbackKind::Ui => {
            let mut img = Image::gen_image_color(size, size, Color::GRAY);
            let border = Color::DARKGRAY;
            img.draw_rectangle(0, 0, size, 3, border);
            img.draw_rectangle(0, size - 3, size, 3, border);
            img.draw_rectangle(0, 0, 3, size, border);
            img.draw_rectangle(size - 3, 0, 3, size, border);
            img
        }
        FallbackKind::Sprite => {
            let mut img = Image::gen_image_color(size, size, color);
            let hatch = Color::BLACK;
            let mut offset = -size;
            while offset < size {
                for step in 0..size {
                    let x = offset + step;
                    if (0..size).contains(&x) {
                        img.draw_rectangle(x, step, 2, 2, hatch);
                    }
                }
                offset += 12;
            }
            img
        }
        FallbackKind::Checker => {
            Image::gen_image_checked(size, size, 8, 8, Color::MAGENTA, Color::BLACK)
        }
    }
}

/// Estimated GPU footprint of a placeholder, for the cache's budget math.
pub fn estimated_bytes() -> u64 {
    (FALLBACK_SIZE as u64) * (FALLBACK_SIZE as u64) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_heuristic() {
        assert_eq!(kind_for_id("digimon_agumon"), FallbackKind::Creature);
        assert_eq!(kind_for_id("ui_panel"), FallbackKind::Ui);
        assert_eq!(kind_for_id("main_menu_bg"), FallbackKind::Ui);
        assert_eq!(kind_for_id("start_button"), FallbackKind::Ui);
        assert_eq!(kind_for_id("boss_sprite_01"), FallbackKind::Sprite);
        assert_eq!(kind_for_id("tropicaljungle_fg_v1"), FallbackKind::Checker);
    }

    #[test]
    fn test_color_is_deterministic() {
        let a = color_from_id("agumon");
        let b = color_from_id("agumon");
        assert_eq!((a.r, a.g, a.b, a.a), (b.r, b.g, b.b, b.a));
    }

    #[test]
    fn test_distinct_ids_usually_differ() {
        let a = color_from_id("agumon");
        let b = color_from_id("gabumon");
        assert_ne!((a.r, a.g, a.b), (b.r, b.g, b.b));
    }

    #[test]
    fn test_color_brightness_floor() {
        // Sweep a batch of ids, including ones whose hash lands on a single
        // dominant channel; the floor must hold for all of them.
        let mut ids: Vec<String> = (0..256).map(|i| format!("asset_{}", i)).collect();
        ids.extend(["a", "zz", "assets/backgrounds/x.png", "agumon"].map(String::from));
        for id in &ids {
            let c = color_from_id(id);
            let brightness = (c.r as u32 + c.g as u32 + c.b as u32) / 3;
            assert!(brightness >= 200, "too dark for {:?}: {}", id, brightness);
        }
    }
}
