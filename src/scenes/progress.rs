//! Progress overlay.
//!
//! Read-only summary of the player's journey: current node, steps toward
//! its goal, and the lifetime step count. Any of confirm or cancel pops
//! back to the caller.

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::input::GameAction;
use crate::scenes::Scene;
use raylib::prelude::*;

pub struct ProgressScene;

impl ProgressScene {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProgressScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for ProgressScene {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        if ctx.input.just_pressed(GameAction::Cancel)
            || ctx.input.just_pressed(GameAction::Confirm)
        {
            ctx.requests.pop();
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) {}

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::new(12, 16, 24, 255));
        let text_scale = ctx.config.text_scale * ctx.config.scaling.text;
        let line_step = 28.0 * text_scale;
        let mut y = LOGICAL_HEIGHT as f32 / 2.0 - 2.0 * line_step;

        let node_line = match &ctx.player.current_node {
            Some(node) => format!("LOCATION: {}", node.name),
            None => "LOCATION: -".to_string(),
        };
        let lines = [
            "PROGRESS".to_string(),
            node_line,
            format!(
                "STEPS: {}/{}",
                ctx.player.steps_this_chapter, ctx.player.step_goal
            ),
            format!("TOTAL STEPS: {}", ctx.player.total_steps),
            format!("PARTNER: {}", ctx.player.partner_id.to_ascii_uppercase()),
        ];
        for line in lines {
            draw_centered(d, ctx, &line, y, text_scale);
            y += line_step;
        }
    }
}

fn draw_centered(
    d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>,
    ctx: &GameContext,
    text: &str,
    y: f32,
    scale: f32,
) {
    let w = LOGICAL_WIDTH as f32;
    match ctx.atlas.font("ui_font") {
        Some(font) => {
            let tw = font.measure(text, scale);
            font.draw(d, ctx.textures, text, (w - tw) / 2.0, y, scale, Color::WHITE);
        }
        None => {
            let size = (10.0 * scale) as i32;
            let tw = d.measure_text(text, size);
            d.draw_text(text, (w as i32 - tw) / 2, y as i32, size, Color::WHITE);
        }
    }
}
