//! Settings scene: key rebinding.
//!
//! A list of rebindable actions with their current keys. Confirming an
//! entry arms capture mode; the next raw key press (read in `prepare`,
//! the only phase with window access) rebinds the action, writes the key
//! name into the configuration, and saves it to disk.

use crate::config::KeyConfig;
use crate::context::GameContext;
use crate::input::{key_name, GameAction};
use crate::scenes::Scene;
use log::{error, info};
use raylib::prelude::*;

/// Actions the settings screen exposes for rebinding, with the
/// configuration field each one persists to.
const REBINDABLE: [GameAction; 8] = [
    GameAction::NavUp,
    GameAction::NavDown,
    GameAction::NavLeft,
    GameAction::NavRight,
    GameAction::Confirm,
    GameAction::Cancel,
    GameAction::MenuToggle,
    GameAction::ToggleFullscreen,
];

fn config_slot(keys: &mut KeyConfig, action: GameAction) -> Option<&mut String> {
    match action {
        GameAction::NavUp => Some(&mut keys.move_up),
        GameAction::NavDown => Some(&mut keys.move_down),
        GameAction::NavLeft => Some(&mut keys.move_left),
        GameAction::NavRight => Some(&mut keys.move_right),
        GameAction::Confirm => Some(&mut keys.action),
        GameAction::Cancel => Some(&mut keys.back),
        GameAction::MenuToggle => Some(&mut keys.menu),
        GameAction::ToggleFullscreen => Some(&mut keys.toggle_screen),
        _ => None,
    }
}

pub struct SettingsScene {
    index: usize,
    awaiting_key: bool,
}

impl SettingsScene {
    pub fn new() -> Self {
        Self {
            index: 0,
            awaiting_key: false,
        }
    }

    pub fn awaiting_key(&self) -> bool {
        self.awaiting_key
    }

    pub fn selected_action(&self) -> GameAction {
        REBINDABLE[self.index]
    }

    /// Apply a captured key to the selected action: rebind the dispatcher,
    /// persist the name into the configuration, and save.
    fn apply_rebind(&mut self, ctx: &mut GameContext, key: KeyboardKey) {
        let action = self.selected_action();
        ctx.input.rebind(action, key);
        if let Some(slot) = config_slot(&mut ctx.config.keys, action) {
            *slot = key_name(key).to_string();
        }
        if let Err(e) = ctx.config.save_to_file() {
            error!("SettingsScene: {}", e);
        } else {
            info!(
                "SettingsScene: bound {} to {}",
                action.label(),
                key_name(key)
            );
        }
        self.awaiting_key = false;
    }
}

impl Default for SettingsScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for SettingsScene {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        // While armed, the next raw key belongs to the capture in prepare.
        if self.awaiting_key {
            return;
        }
        let count = REBINDABLE.len();
        if ctx.input.just_pressed(GameAction::NavUp) {
            self.index = (self.index + count - 1) % count;
        } else if ctx.input.just_pressed(GameAction::NavDown) {
            self.index = (self.index + 1) % count;
        }
        if ctx.input.just_pressed(GameAction::Confirm) {
            self.awaiting_key = true;
        } else if ctx.input.just_pressed(GameAction::Cancel) {
            ctx.requests.pop();
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) {}

    fn prepare(&mut self, rl: &mut RaylibHandle, _th: &RaylibThread, ctx: &mut GameContext) {
        if !self.awaiting_key {
            return;
        }
        if let Some(key) = rl.get_key_pressed() {
            if key == KeyboardKey::KEY_ESCAPE {
                self.awaiting_key = false;
            } else {
                self.apply_rebind(ctx, key);
            }
        }
    }

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::new(12, 16, 24, 255));
        let text_scale = ctx.config.text_scale * ctx.config.scaling.text;
        let line_step = 26.0 * text_scale;
        let mut y = 48.0;

        draw_line(d, ctx, "SETTINGS", 24.0, y, text_scale, Color::WHITE);
        y += line_step * 1.5;

        for (i, action) in REBINDABLE.iter().enumerate() {
            let selected = i == self.index;
            let key = ctx
                .input
                .key_for(*action)
                .map(key_name)
                .unwrap_or("?");
            let shown_key = if selected && self.awaiting_key {
                "PRESS A KEY"
            } else {
                key
            };
            let marker = if selected { ">" } else { " " };
            let line = format!("{} {:<12} {}", marker, action.label(), shown_key);
            let color = if selected { Color::YELLOW } else { Color::WHITE };
            draw_line(d, ctx, &line, 24.0, y, text_scale, color);
            y += line_step;
        }
    }
}

fn draw_line(
    d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>,
    ctx: &GameContext,
    text: &str,
    x: f32,
    y: f32,
    scale: f32,
    color: Color,
) {
    match ctx.atlas.font("ui_font") {
        Some(font) => font.draw(d, ctx.textures, text, x, y, scale, color),
        None => d.draw_text(text, x as i32, y as i32, (10.0 * scale) as i32, color),
    }
}
