//! Digivice main entry point.
//!
//! A retro virtual-pet adventure simulator using:
//! - **raylib** for windowing and graphics
//! - **configparser** for the INI configuration store
//! - **serde_json** for sprite-atlas and font definitions
//!
//! The game renders at a fixed 466x466 logical resolution into a render
//! texture, scaled to the window with nearest-neighbor filtering.
//!
//! # Project Structure
//!
//! - [`scenes`] – the pushdown scene stack and every game scene
//! - [`gfx`] – texture cache, atlas registry, animation, parallax, display
//! - [`input`] – action mapping and per-frame edge detection
//! - [`world`] – the hand-authored continent/node graph
//! - [`player`] – partner selection and step counters
//!
//! # Main Loop
//!
//! 1. Load configuration, open the window, create the render target
//! 2. Push the menu scene and loop:
//!    - snapshot input, apply deferred scene-stack mutations
//!    - route `handle_input` and `update` to the top scene
//!    - perform queued texture loads, enforce the memory budget
//!    - render the stack into the logical framebuffer and blit it
//!
//! # Running
//!
//! ```sh
//! cargo run --release
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod config;
mod context;
mod gfx;
mod input;
mod player;
mod report;
mod scenes;
mod world;

use crate::config::{GameConfig, LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::Services;
use crate::gfx::display::RenderTarget;
use crate::gfx::texture_cache::TextureCache;
use crate::gfx::variants::{self, LayerRole};
use crate::input::GameAction;
use crate::player::PARTNER_IDS;
use crate::scenes::menu::MenuScene;
use crate::scenes::SceneStack;
use crate::world::WorldGraph;
use clap::Parser;
use raylib::prelude::*;
use std::path::{Path, PathBuf};

/// Digivice
#[derive(Parser)]
#[command(version, about = "A retro virtual-pet adventure simulator")]
struct Cli {
    /// Path to the configuration file (default: ./config.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Audit all known asset paths and exit.
    #[arg(long)]
    validate_assets: bool,

    /// Start in fullscreen regardless of the configuration.
    #[arg(long)]
    fullscreen: bool,
}

/// Longest frame delta fed to updates; stalls beyond this are truncated
/// rather than teleporting animations and parallax.
const MAX_FRAME_DELTA: f32 = 0.1;

const UI_FONT_ID: &str = "ui_font";
const UI_FONT_TEXTURE: &str = "assets/fonts/ui_font.png";
const UI_FONT_DEF: &str = "assets/fonts/ui_font.json";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    config.load_from_file().ok(); // ignore errors, use defaults
    if cli.fullscreen {
        config.fullscreen = true;
    }

    let world = WorldGraph::file_island_prototype();

    // Early-exit: audit assets and quit (no window needed)
    if cli.validate_assets {
        let mut cache = TextureCache::new();
        register_known_assets(&mut cache, &world);
        let report = cache.validate_registered();
        println!("valid:      {}", report.valid.len());
        for id in &report.missing {
            println!("missing:    {}", id);
        }
        for id in &report.oversized {
            println!("oversized:  {}", id);
        }
        for id in &report.unreadable {
            println!("unreadable: {}", id);
        }
        if !report.is_clean() {
            std::process::exit(1);
        }
        return;
    }

    log::info!("Digivice starting");

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .resizable()
        .title(&config.title)
        .build();
    rl.set_target_fps(60);
    // Disable ESC to exit; Cancel is a game action.
    rl.set_exit_key(None);
    if config.fullscreen && !rl.is_window_fullscreen() {
        rl.toggle_fullscreen();
    }

    let mut render_target = RenderTarget::new(&mut rl, &thread, LOGICAL_WIDTH, LOGICAL_HEIGHT)
        .expect("Failed to create render target");

    let mut services = Services::new(config, world);
    register_known_assets(&mut services.textures, &services.world);
    services
        .atlas
        .load_font(&mut services.textures, Path::new(UI_FONT_DEF), UI_FONT_ID);
    services.textures.preload(UI_FONT_ID);

    let mut stack = SceneStack::new();
    services.requests.push(Box::new(MenuScene::new()));

    // --------------- Main loop ---------------
    while !rl.window_should_close() {
        let dt = rl.get_frame_time().min(MAX_FRAME_DELTA);

        services.input.begin_frame();
        services.input.poll(&rl);
        if services.input.just_pressed(GameAction::ToggleFullscreen) {
            rl.toggle_fullscreen();
        }

        {
            let mut ctx = services.ctx();
            stack.apply(&mut ctx);
            stack.handle_input(&mut ctx);
            stack.update(dt, &mut ctx);
        }
        if services.requests.quit_requested() || stack.is_empty() {
            break;
        }

        services.textures.load_pending(&mut rl, &thread);
        services.textures.enforce_budget();

        {
            let mut ctx = services.ctx();
            stack.prepare(&mut rl, &thread, &mut ctx);
        }

        let (window_w, window_h) = (rl.get_screen_width(), rl.get_screen_height());
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::BLACK);
        {
            let mut frame = d.begin_texture_mode(&thread, &mut render_target.texture);
            let ctx = services.ctx();
            stack.render(&mut frame, &ctx);
        }
        render_target.blit(&mut d, window_w, window_h);
    }

    log::info!("Digivice shutting down");
}

/// Register every asset path the prototype world can demand, so lazy
/// requests resolve and `--validate-assets` has a complete manifest.
fn register_known_assets(cache: &mut TextureCache, world: &WorldGraph) {
    cache.register_path(UI_FONT_ID, UI_FONT_TEXTURE);
    for id in PARTNER_IDS {
        cache.register_path(id, format!("assets/sprites/{}_sheet.png", id));
    }
    for continent in &world.continents {
        cache.register_path(&continent.map_image_id, &continent.map_image_id);
        for node in &continent.nodes {
            cache.register_path(&node.unlocked_sprite_id, &node.unlocked_sprite_id);
            cache.register_path(&node.boss_sprite_id, &node.boss_sprite_id);
            for role in [
                LayerRole::Foreground,
                LayerRole::Middleground,
                LayerRole::Background,
            ] {
                let id = format!("{}_{}", node.environment, role.suffix());
                cache.register_fallback_paths(&id, variants::candidates(&node.environment, role));
            }
        }
    }
}
