//! Digivice library.
//!
//! Exposes the game's scene stack, rendering services, input mapping, and
//! world data for use in integration tests and as a reusable library.

pub mod config;
pub mod context;
pub mod gfx;
pub mod input;
pub mod player;
pub mod report;
pub mod scenes;
pub mod world;
