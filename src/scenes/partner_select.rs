//! Partner selection overlay.
//!
//! A horizontal carousel over the eight selectable partners. Confirming
//! writes the choice into player data and pops back to the caller.

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::input::GameAction;
use crate::player::PARTNER_IDS;
use crate::scenes::Scene;
use raylib::prelude::*;

pub struct PartnerSelectScene {
    index: usize,
}

impl PartnerSelectScene {
    pub fn new() -> Self {
        Self { index: 0 }
    }

    pub fn selected_partner(&self) -> &'static str {
        PARTNER_IDS[self.index]
    }
}

impl Default for PartnerSelectScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for PartnerSelectScene {
    fn name(&self) -> &'static str {
        "partner_select"
    }

    fn enter(&mut self, ctx: &mut GameContext) {
        self.index = PARTNER_IDS
            .iter()
            .position(|id| *id == ctx.player.partner_id)
            .unwrap_or(0);
        for id in PARTNER_IDS {
            ctx.textures
                .request_with_path(id, format!("assets/sprites/{}_sheet.png", id));
        }
    }

    fn exit(&mut self, ctx: &mut GameContext) {
        for id in PARTNER_IDS {
            ctx.textures.release(id);
        }
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        let count = PARTNER_IDS.len();
        if ctx.input.just_pressed(GameAction::NavLeft) {
            self.index = (self.index + count - 1) % count;
        } else if ctx.input.just_pressed(GameAction::NavRight) {
            self.index = (self.index + 1) % count;
        }
        if ctx.input.just_pressed(GameAction::Confirm) {
            ctx.player.partner_id = PARTNER_IDS[self.index].to_string();
            ctx.requests.pop();
        } else if ctx.input.just_pressed(GameAction::Cancel) {
            ctx.requests.pop();
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) {}

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::new(12, 16, 24, 255));
        let w = LOGICAL_WIDTH as f32;
        let h = LOGICAL_HEIGHT as f32;
        let text_scale = ctx.config.text_scale * ctx.config.scaling.text;

        let id = PARTNER_IDS[self.index];
        if let Some(texture) = ctx.textures.get(id) {
            let scale = ctx.config.scaling.sprites * ctx.config.asset_scale * 2.0;
            let tw = texture.width as f32 * scale;
            let th = texture.height as f32 * scale;
            let src = Rectangle {
                x: 0.0,
                y: 0.0,
                width: texture.width as f32,
                height: texture.height as f32,
            };
            let dest = Rectangle {
                x: (w - tw) / 2.0,
                y: (h - th) / 2.0,
                width: tw,
                height: th,
            };
            d.draw_texture_pro(texture, src, dest, Vector2::zero(), 0.0, Color::WHITE);
        }

        let name = id.to_ascii_uppercase();
        let label = format!("< {} >", name);
        match ctx.atlas.font("ui_font") {
            Some(font) => {
                let tw = font.measure(&label, text_scale);
                font.draw(
                    d,
                    ctx.textures,
                    &label,
                    (w - tw) / 2.0,
                    h - 64.0,
                    text_scale,
                    Color::WHITE,
                );
            }
            None => {
                let size = (10.0 * text_scale) as i32;
                let tw = d.measure_text(&label, size);
                d.draw_text(
                    &label,
                    (w as i32 - tw) / 2,
                    (h - 64.0) as i32,
                    size,
                    Color::WHITE,
                );
            }
        }
    }
}
