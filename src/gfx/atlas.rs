//! Frame-atlas registry.
//!
//! Sprite sheets ship with a JSON frame definition: a top-level `"frames"`
//! node, either an object keyed by `<name>_<index>` or an array indexed
//! positionally, each entry carrying a `frame` rect. Animations are not
//! named in the data; hard-coded sequence templates describe, per action,
//! the frame indices and durations, and the registry manufactures one
//! record per action named `<atlas_id>_<action>`.
//!
//! Font sheets use the same document shape with glyph keys: single
//! characters or symbolic names from a fixed alphabet.

use crate::gfx::texture_cache::TextureCache;
use log::warn;
use raylib::prelude::{Color, RaylibDraw, Rectangle, Vector2};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// A named, immutable frame sequence on an atlas texture.
#[derive(Debug, Clone)]
pub struct AnimationRecord {
    pub id: String,
    /// Texture cache key of the atlas.
    pub tex_key: Arc<str>,
    pub rects: Vec<Rectangle>,
    /// Per-frame durations in seconds, same length as `rects`.
    pub durations: Vec<f32>,
    pub looping: bool,
}

/// One hard-coded action sequence over atlas frame indices.
struct SequenceTemplate {
    action: &'static str,
    indices: &'static [usize],
    durations: &'static [f32],
    looping: bool,
}

const SEQUENCE_TEMPLATES: [SequenceTemplate; 2] = [
    SequenceTemplate {
        action: "idle",
        indices: &[0, 1],
        durations: &[0.8, 0.8],
        looping: true,
    },
    SequenceTemplate {
        action: "walk",
        indices: &[2, 3, 2, 3],
        durations: &[0.3, 0.3, 0.3, 0.3],
        looping: false,
    },
];

/// Total duration of one walk cycle, used as a pacing fallback when an
/// atlas failed to load.
pub fn walk_cycle_seconds() -> f32 {
    SEQUENCE_TEMPLATES[1].durations.iter().sum()
}

/// Compose the animation id for a creature action.
pub fn animation_id(base: &str, action: &str) -> String {
    format!("{}_{}", base, action)
}

#[derive(Deserialize)]
struct FrameDoc {
    frames: FramesNode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FramesNode {
    Named(FxHashMap<String, FrameEntry>),
    Indexed(Vec<FrameEntry>),
}

#[derive(Deserialize, Clone, Copy)]
struct FrameEntry {
    frame: FrameRect,
}

#[derive(Deserialize, Clone, Copy)]
struct FrameRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl FrameRect {
    fn to_rectangle(self) -> Option<Rectangle> {
        if self.w <= 0 || self.h <= 0 {
            return None;
        }
        Some(Rectangle {
            x: self.x as f32,
            y: self.y as f32,
            width: self.w as f32,
            height: self.h as f32,
        })
    }
}

/// Bitmap font: per-glyph source rects on a font texture.
pub struct FontSheet {
    pub tex_key: Arc<str>,
    pub glyphs: FxHashMap<char, Rectangle>,
    pub line_height: f32,
}

impl FontSheet {
    /// Pixel width of `text` at `scale`.
    pub fn measure(&self, text: &str, scale: f32) -> f32 {
        let mut w = 0.0;
        for ch in text.chars() {
            w += self.advance(ch) * scale;
        }
        w
    }

    fn advance(&self, ch: char) -> f32 {
        match self.glyphs.get(&ch) {
            Some(rect) => rect.width + 1.0,
            // Unmapped glyphs (and spaces) advance by roughly one cell.
            None => self.line_height * 0.6,
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw<D: RaylibDraw>(
        &self,
        d: &mut D,
        cache: &TextureCache,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        tint: Color,
    ) {
        let Some(texture) = cache.get(&self.tex_key) else {
            return;
        };
        let mut pen_x = x;
        for ch in text.chars() {
            if let Some(rect) = self.glyphs.get(&ch) {
                let dest = Rectangle {
                    x: pen_x,
                    y,
                    width: rect.width * scale,
                    height: rect.height * scale,
                };
                d.draw_texture_pro(texture, *rect, dest, Vector2::zero(), 0.0, tint);
            }
            pen_x += self.advance(ch) * scale;
        }
    }
}

/// Registry of animation records and font sheets, keyed by composed ids.
pub struct AtlasRegistry {
    animations: FxHashMap<String, Arc<AnimationRecord>>,
    fonts: FxHashMap<String, FontSheet>,
}

impl AtlasRegistry {
    pub fn new() -> Self {
        Self {
            animations: FxHashMap::default(),
            fonts: FxHashMap::default(),
        }
    }

    /// Parse a frame definition file and materialize one animation record
    /// per known action template, stored as `<atlas_id>_<action>`. The
    /// atlas texture is demanded from the cache under `atlas_id`.
    ///
    /// Returns false when the definition could not be read at all;
    /// individually malformed frames or unsatisfiable templates only skip
    /// the affected animation.
    pub fn load_atlas(
        &mut self,
        cache: &mut TextureCache,
        def_path: &Path,
        atlas_id: &str,
    ) -> bool {
        let text = match std::fs::read_to_string(def_path) {
            Ok(text) => text,
            Err(e) => {
                warn!("AtlasRegistry: cannot read {:?}: {}", def_path, e);
                return false;
            }
        };
        let frames = match parse_frame_map(&text) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("AtlasRegistry: bad frame definition {:?}: {}", def_path, e);
                return false;
            }
        };
        cache.request(atlas_id);
        self.materialize(atlas_id, &frames);
        true
    }

    /// Whether any record for `atlas_id` exists.
    pub fn has_atlas(&self, atlas_id: &str) -> bool {
        SEQUENCE_TEMPLATES
            .iter()
            .any(|t| self.animations.contains_key(&animation_id(atlas_id, t.action)))
    }

    pub fn get(&self, id: &str) -> Option<Arc<AnimationRecord>> {
        self.animations.get(id).cloned()
    }

    /// Parse a font definition file. Glyph rects are stored under the font
    /// texture id `font_id`; the texture itself is demanded from the cache.
    pub fn load_font(&mut self, cache: &mut TextureCache, def_path: &Path, font_id: &str) -> bool {
        let text = match std::fs::read_to_string(def_path) {
            Ok(text) => text,
            Err(e) => {
                warn!("AtlasRegistry: cannot read font def {:?}: {}", def_path, e);
                return false;
            }
        };
        match parse_font_map(&text) {
            Ok(glyphs) => {
                cache.request(font_id);
                let line_height = glyphs
                    .values()
                    .map(|r| r.height)
                    .fold(0.0_f32, f32::max);
                self.fonts.insert(
                    font_id.to_string(),
                    FontSheet {
                        tex_key: Arc::from(font_id),
                        glyphs,
                        line_height,
                    },
                );
                true
            }
            Err(e) => {
                warn!("AtlasRegistry: bad font definition {:?}: {}", def_path, e);
                false
            }
        }
    }

    pub fn font(&self, id: &str) -> Option<&FontSheet> {
        self.fonts.get(id)
    }

    fn materialize(&mut self, atlas_id: &str, frames: &FxHashMap<usize, Rectangle>) {
        for template in &SEQUENCE_TEMPLATES {
            let id = animation_id(atlas_id, template.action);
            let mut rects = Vec::with_capacity(template.indices.len());
            let mut satisfied = true;
            for &index in template.indices {
                match frames.get(&index) {
                    Some(rect) => rects.push(*rect),
                    None => {
                        warn!(
                            "AtlasRegistry: {} needs frame {} missing from atlas {:?}, skipping",
                            id, index, atlas_id
                        );
                        satisfied = false;
                        break;
                    }
                }
            }
            if !satisfied {
                continue;
            }
            self.animations.insert(
                id.clone(),
                Arc::new(AnimationRecord {
                    id,
                    tex_key: Arc::from(atlas_id),
                    rects,
                    durations: template.durations.to_vec(),
                    looping: template.looping,
                }),
            );
        }
    }
}

impl Default for AtlasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the trailing frame index from a key: either all digits, or a
/// name ending in `_<index>`.
fn frame_index_from_key(key: &str) -> Option<usize> {
    if let Ok(index) = key.parse::<usize>() {
        return Some(index);
    }
    let (_, tail) = key.rsplit_once('_')?;
    tail.parse().ok()
}

/// Parse a frame definition document into an index → rect map.
fn parse_frame_map(text: &str) -> Result<FxHashMap<usize, Rectangle>, String> {
    let doc: FrameDoc = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let mut out = FxHashMap::default();
    match doc.frames {
        FramesNode::Named(entries) => {
            for (key, entry) in entries {
                let Some(index) = frame_index_from_key(&key) else {
                    warn!("AtlasRegistry: frame key {:?} has no index, skipping", key);
                    continue;
                };
                match entry.frame.to_rectangle() {
                    Some(rect) => {
                        out.insert(index, rect);
                    }
                    None => warn!("AtlasRegistry: malformed rect for key {:?}, skipping", key),
                }
            }
        }
        FramesNode::Indexed(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                match entry.frame.to_rectangle() {
                    Some(rect) => {
                        out.insert(index, rect);
                    }
                    None => warn!("AtlasRegistry: malformed rect at index {}, skipping", index),
                }
            }
        }
    }
    Ok(out)
}

/// Symbolic glyph names accepted in font definitions.
fn glyph_for_name(name: &str) -> Option<char> {
    let ch = match name {
        "apostrophe" => '\'',
        "colon" => ':',
        "comma" => ',',
        "dash" => '-',
        "divide" => '÷',
        "equals" => '=',
        "exclamation" => '!',
        "forwardslash" => '/',
        "period" => '.',
        "plus" => '+',
        "roundbracketleft" => '(',
        "roundbracketright" => ')',
        "speech" => '"',
        "times" => '*',
        "weirdbracketleft" => '[',
        "weirdbracketright" => ']',
        "QUESTION" => '?',
        _ => return None,
    };
    Some(ch)
}

/// Parse a font definition document into a glyph → rect map.
fn parse_font_map(text: &str) -> Result<FxHashMap<char, Rectangle>, String> {
    let doc: FrameDoc = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let FramesNode::Named(entries) = doc.frames else {
        return Err("font definitions must use named keys".to_string());
    };
    let mut out = FxHashMap::default();
    for (key, entry) in entries {
        let glyph = if key.chars().count() == 1 {
            key.chars().next()
        } else {
            glyph_for_name(&key)
        };
        let Some(glyph) = glyph else {
            warn!("AtlasRegistry: unrecognized glyph key {:?}, skipping", key);
            continue;
        };
        match entry.frame.to_rectangle() {
            Some(rect) => {
                out.insert(glyph, rect);
            }
            None => warn!("AtlasRegistry: malformed rect for glyph {:?}, skipping", key),
        }
    }
    Ok(out)
}
