//! Main menu scene.
//!
//! Root of the scene stack and also pushed as an overlay from the
//! adventure and map scenes. A plain vertical list; confirming an entry
//! pushes the matching scene or requests quit.

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::input::GameAction;
use crate::scenes::map::MapScene;
use crate::scenes::partner_select::PartnerSelectScene;
use crate::scenes::progress::ProgressScene;
use crate::scenes::settings::SettingsScene;
use crate::scenes::Scene;
use raylib::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MenuEntry {
    Map,
    Partner,
    Progress,
    Settings,
    Quit,
}

const ENTRIES: [MenuEntry; 5] = [
    MenuEntry::Map,
    MenuEntry::Partner,
    MenuEntry::Progress,
    MenuEntry::Settings,
    MenuEntry::Quit,
];

impl MenuEntry {
    fn label(self) -> &'static str {
        match self {
            MenuEntry::Map => "WORLD MAP",
            MenuEntry::Partner => "PARTNER",
            MenuEntry::Progress => "PROGRESS",
            MenuEntry::Settings => "SETTINGS",
            MenuEntry::Quit => "QUIT",
        }
    }
}

pub struct MenuScene {
    index: usize,
}

impl MenuScene {
    pub fn new() -> Self {
        Self { index: 0 }
    }

    pub fn selected_index(&self) -> usize {
        self.index
    }
}

impl Default for MenuScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for MenuScene {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        let count = ENTRIES.len();
        if ctx.input.just_pressed(GameAction::NavUp) {
            self.index = (self.index + count - 1) % count;
        } else if ctx.input.just_pressed(GameAction::NavDown) {
            self.index = (self.index + 1) % count;
        }
        if ctx.input.just_pressed(GameAction::Confirm) {
            match ENTRIES[self.index] {
                MenuEntry::Map => ctx.requests.fade_to(Box::new(MapScene::new()), 0.5, false),
                MenuEntry::Partner => ctx.requests.push(Box::new(PartnerSelectScene::new())),
                MenuEntry::Progress => ctx.requests.push(Box::new(ProgressScene::new())),
                MenuEntry::Settings => ctx.requests.push(Box::new(SettingsScene::new())),
                MenuEntry::Quit => ctx.requests.quit(),
            }
        } else if ctx.input.just_pressed(GameAction::Cancel)
            || ctx.input.just_pressed(GameAction::MenuToggle)
        {
            ctx.requests.pop();
        }
    }

    fn update(&mut self, _dt: f32, _ctx: &mut GameContext) {}

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::new(12, 16, 24, 255));
        let w = LOGICAL_WIDTH as f32;
        let text_scale = ctx.config.text_scale * ctx.config.scaling.text;
        let title = "DIGIVICE";
        draw_menu_line(d, ctx, title, w / 2.0, 48.0, text_scale * 2.0, Color::WHITE);
        for (i, entry) in ENTRIES.iter().enumerate() {
            let selected = i == self.index;
            let label = if selected {
                format!("> {}", entry.label())
            } else {
                entry.label().to_string()
            };
            let color = if selected { Color::YELLOW } else { Color::WHITE };
            let y = LOGICAL_HEIGHT as f32 / 2.0 - 60.0 + i as f32 * 32.0 * text_scale;
            draw_menu_line(d, ctx, &label, w / 2.0, y, text_scale, color);
        }
    }
}

/// Draw a line of text horizontally centered on `center_x`.
fn draw_menu_line(
    d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>,
    ctx: &GameContext,
    text: &str,
    center_x: f32,
    y: f32,
    scale: f32,
    color: Color,
) {
    match ctx.atlas.font("ui_font") {
        Some(font) => {
            let tw = font.measure(text, scale);
            font.draw(d, ctx.textures, text, center_x - tw / 2.0, y, scale, color);
        }
        None => {
            let size = (10.0 * scale) as i32;
            let tw = d.measure_text(text, size);
            d.draw_text(text, center_x as i32 - tw / 2, y as i32, size, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::context::Services;
    use crate::world::WorldGraph;

    fn services() -> Services {
        Services::new(GameConfig::new(), WorldGraph::file_island_prototype())
    }

    fn press(services: &mut Services, scene: &mut MenuScene, action: GameAction) {
        services.input.begin_frame();
        services.input.set_raw(action, true);
        scene.handle_input(&mut services.ctx());
        services.input.begin_frame();
        services.input.set_raw(action, false);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut services = services();
        let mut scene = MenuScene::new();
        press(&mut services, &mut scene, GameAction::NavUp);
        assert_eq!(scene.selected_index(), ENTRIES.len() - 1);
        press(&mut services, &mut scene, GameAction::NavDown);
        assert_eq!(scene.selected_index(), 0);
    }

    #[test]
    fn test_confirm_on_map_entry_queues_transition() {
        let mut services = services();
        let mut scene = MenuScene::new();
        press(&mut services, &mut scene, GameAction::Confirm);
        assert!(services.requests.has_pending());
    }

    #[test]
    fn test_quit_entry_requests_quit() {
        let mut services = services();
        let mut scene = MenuScene::new();
        press(&mut services, &mut scene, GameAction::NavUp); // wraps to QUIT
        press(&mut services, &mut scene, GameAction::Confirm);
        assert!(services.requests.quit_requested());
    }

    #[test]
    fn test_cancel_pops_overlay_menu() {
        let mut services = services();
        let mut scene = MenuScene::new();
        press(&mut services, &mut scene, GameAction::Cancel);
        assert!(services.requests.has_pending());
    }
}
