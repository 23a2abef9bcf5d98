//! Graphics subsystems: display surface, texture cache with procedural
//! fallbacks, frame-atlas registry, animation playback, parallax layers,
//! and background variant selection.

pub mod animator;
pub mod atlas;
pub mod display;
pub mod fallback;
pub mod parallax;
pub mod texture_cache;
pub mod variants;
