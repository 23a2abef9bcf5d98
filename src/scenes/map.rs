//! World map scene.
//!
//! Three nested views: the continent carousel, node selection on the
//! continent map, and a node detail panel with an environment preview.
//! Switching continents plays a short fade during which input is ignored;
//! confirming a node hands off to the adventure scene.

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::gfx::parallax::ParallaxLayer;
use crate::gfx::variants::LayerRole;
use crate::input::GameAction;
use crate::scenes::adventure::AdventureScene;
use crate::scenes::menu::MenuScene;
use crate::scenes::transition::fade_alpha;
use crate::scenes::Scene;
use crate::world::NodeData;
use log::warn;
use raylib::prelude::*;

/// Full duration of the continent switch fade.
const CONTINENT_FADE_SECONDS: f32 = 0.25;

/// Selected node icons render at this factor.
const SELECTED_ICON_SCALE: f32 = 1.5;

/// Alpha of the black cover drawn over locked node icons.
const LOCKED_COVER_ALPHA: u8 = 160;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapView {
    Continent,
    Node,
    NodeDetail,
}

/// In-flight continent switch: fade out over the first half, swap, fade
/// back in over the second.
struct ContinentFade {
    t: f32,
    target: usize,
    swapped: bool,
}

pub struct MapScene {
    view: MapView,
    continent_index: usize,
    node_index: usize,
    fade: Option<ContinentFade>,
    /// Preview layer bands for the node detail view (fg, mg, bg).
    preview: Vec<ParallaxLayer>,
}

impl MapScene {
    pub fn new() -> Self {
        Self {
            view: MapView::Continent,
            continent_index: 0,
            node_index: 0,
            fade: None,
            preview: Vec::new(),
        }
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn continent_index(&self) -> usize {
        self.continent_index
    }

    pub fn node_index(&self) -> usize {
        self.node_index
    }

    pub fn fading(&self) -> bool {
        self.fade.is_some()
    }

    fn continent_count(ctx: &GameContext) -> usize {
        ctx.world.continents.len()
    }

    fn nodes<'w>(&self, ctx: &'w GameContext) -> &'w [NodeData] {
        ctx.world
            .continents
            .get(self.continent_index)
            .map(|c| c.nodes.as_slice())
            .unwrap_or(&[])
    }

    fn selected_node(&self, ctx: &GameContext) -> Option<NodeData> {
        self.nodes(ctx).get(self.node_index).cloned()
    }

    fn request_continent_assets(&self, ctx: &mut GameContext) {
        let Some(continent) = ctx.world.continents.get(self.continent_index) else {
            return;
        };
        let map_id = continent.map_image_id.clone();
        ctx.textures.request_with_path(&map_id, &map_id);
        let icons: Vec<String> = continent
            .nodes
            .iter()
            .map(|n| n.unlocked_sprite_id.clone())
            .collect();
        for icon in icons {
            ctx.textures.request_with_path(&icon, &icon);
        }
    }

    fn release_continent_assets(&self, ctx: &mut GameContext) {
        let Some(continent) = ctx.world.continents.get(self.continent_index) else {
            return;
        };
        let map_id = continent.map_image_id.clone();
        let icons: Vec<String> = continent
            .nodes
            .iter()
            .map(|n| n.unlocked_sprite_id.clone())
            .collect();
        ctx.textures.release(&map_id);
        for icon in icons {
            ctx.textures.release(&icon);
        }
    }

    fn begin_continent_fade(&mut self, target: usize) {
        if self.fade.is_none() && target != self.continent_index {
            self.fade = Some(ContinentFade {
                t: 0.0,
                target,
                swapped: false,
            });
        }
    }

    fn open_detail(&mut self, ctx: &mut GameContext) {
        let Some(node) = self.selected_node(ctx) else {
            return;
        };
        if !node.unlocked {
            return;
        }
        self.preview.clear();
        for role in [
            LayerRole::Foreground,
            LayerRole::Middleground,
            LayerRole::Background,
        ] {
            if let Some(path) = ctx.variants.select(&node.environment, role) {
                let id = path.to_string_lossy().to_string();
                ctx.textures.request_with_path(&id, &path);
                self.preview.push(ParallaxLayer::new(id, 0.0));
            }
        }
        let boss_id = node.boss_sprite_id.clone();
        ctx.textures.request_with_path(&boss_id, &boss_id);
        self.view = MapView::NodeDetail;
    }

    fn close_detail(&mut self, ctx: &mut GameContext) {
        for layer in &self.preview {
            ctx.textures.release(&layer.texture_id);
        }
        self.preview.clear();
        if let Some(node) = self.selected_node(ctx) {
            ctx.textures.release(&node.boss_sprite_id);
        }
        self.view = MapView::Node;
    }

    fn fade_overlay_alpha(&self) -> u8 {
        match &self.fade {
            None => 0,
            Some(fade) => {
                let half = CONTINENT_FADE_SECONDS / 2.0;
                if fade.t < half {
                    fade_alpha(fade.t, half)
                } else {
                    255 - fade_alpha(fade.t - half, half)
                }
            }
        }
    }
}

impl Default for MapScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for MapScene {
    fn name(&self) -> &'static str {
        "map"
    }

    fn enter(&mut self, ctx: &mut GameContext) {
        // Start on the continent of the player's last node when known.
        if let Some(node) = &ctx.player.current_node {
            let continent_id = node.continent_id.clone();
            if let Some(idx) = ctx
                .world
                .continents
                .iter()
                .position(|c| c.id == continent_id)
            {
                self.continent_index = idx;
            }
        }
        self.view = MapView::Continent;
        self.node_index = 0;
        self.fade = None;
        self.request_continent_assets(ctx);
    }

    fn exit(&mut self, ctx: &mut GameContext) {
        if self.view == MapView::NodeDetail {
            self.close_detail(ctx);
        }
        self.release_continent_assets(ctx);
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        // The continent fade owns the frame.
        if self.fade.is_some() {
            return;
        }
        if ctx.input.just_pressed(GameAction::MenuToggle) {
            ctx.requests.push(Box::new(MenuScene::new()));
            return;
        }
        match self.view {
            MapView::Continent => {
                let count = Self::continent_count(ctx);
                if count > 0 {
                    if ctx.input.just_pressed(GameAction::NavUp) {
                        self.begin_continent_fade((self.continent_index + count - 1) % count);
                    } else if ctx.input.just_pressed(GameAction::NavDown) {
                        self.begin_continent_fade((self.continent_index + 1) % count);
                    }
                }
                if ctx.input.just_pressed(GameAction::Confirm) {
                    self.node_index = 0;
                    self.view = MapView::Node;
                } else if ctx.input.just_pressed(GameAction::Cancel) {
                    ctx.requests.pop();
                }
            }
            MapView::Node => {
                let count = self.nodes(ctx).len();
                if count > 0 {
                    if ctx.input.just_pressed(GameAction::NavLeft)
                        || ctx.input.just_pressed(GameAction::NavUp)
                    {
                        self.node_index = (self.node_index + count - 1) % count;
                    } else if ctx.input.just_pressed(GameAction::NavRight)
                        || ctx.input.just_pressed(GameAction::NavDown)
                    {
                        self.node_index = (self.node_index + 1) % count;
                    }
                }
                if ctx.input.just_pressed(GameAction::Confirm) {
                    match self.selected_node(ctx) {
                        Some(node) if node.unlocked => self.open_detail(ctx),
                        Some(node) => warn!("MapScene: node {} is locked", node.id),
                        None => {}
                    }
                } else if ctx.input.just_pressed(GameAction::Cancel) {
                    self.view = MapView::Continent;
                }
            }
            MapView::NodeDetail => {
                if ctx.input.just_pressed(GameAction::Confirm) {
                    if let Some(node) = self.selected_node(ctx) {
                        ctx.player.set_current_node(&node);
                        ctx.requests
                            .fade_to(Box::new(AdventureScene::new()), 0.5, true);
                    }
                } else if ctx.input.just_pressed(GameAction::Cancel) {
                    self.close_detail(ctx);
                }
            }
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut GameContext) {
        for layer in &mut self.preview {
            layer.sync_size(ctx.textures);
        }
        let (do_swap, done, target) = match &mut self.fade {
            None => return,
            Some(fade) => {
                fade.t += dt;
                let half = CONTINENT_FADE_SECONDS / 2.0;
                let do_swap = fade.t >= half && !fade.swapped;
                if do_swap {
                    fade.swapped = true;
                }
                (do_swap, fade.t >= CONTINENT_FADE_SECONDS, fade.target)
            }
        };
        if do_swap {
            self.release_continent_assets(ctx);
            self.continent_index = target;
            self.node_index = 0;
            self.request_continent_assets(ctx);
        }
        if done {
            self.fade = None;
        }
    }

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::BLACK);
        let w = LOGICAL_WIDTH as f32;
        let h = LOGICAL_HEIGHT as f32;
        let Some(continent) = ctx.world.continents.get(self.continent_index) else {
            return;
        };

        match self.view {
            MapView::Continent | MapView::Node => {
                if let Some(map) = ctx.textures.get(&continent.map_image_id) {
                    let src = Rectangle {
                        x: 0.0,
                        y: 0.0,
                        width: map.width as f32,
                        height: map.height as f32,
                    };
                    let dest = Rectangle {
                        x: (w - map.width as f32) / 2.0,
                        y: (h - map.height as f32) / 2.0,
                        width: map.width as f32,
                        height: map.height as f32,
                    };
                    d.draw_texture_pro(map, src, dest, Vector2::zero(), 0.0, Color::WHITE);
                }
                let title_scale = ctx.config.text_scale * ctx.config.scaling.text;
                draw_label(d, ctx, &continent.name, 8.0, 8.0, title_scale);

                if self.view == MapView::Node {
                    for (i, node) in continent.nodes.iter().enumerate() {
                        let selected = i == self.node_index;
                        let scale = if selected { SELECTED_ICON_SCALE } else { 1.0 };
                        if let Some(icon) = ctx.textures.get(&node.unlocked_sprite_id) {
                            let iw = icon.width as f32 * scale;
                            let ih = icon.height as f32 * scale;
                            let src = Rectangle {
                                x: 0.0,
                                y: 0.0,
                                width: icon.width as f32,
                                height: icon.height as f32,
                            };
                            let dest = Rectangle {
                                x: node.map_position.0 - iw / 2.0,
                                y: node.map_position.1 - ih / 2.0,
                                width: iw,
                                height: ih,
                            };
                            d.draw_texture_pro(icon, src, dest, Vector2::zero(), 0.0, Color::WHITE);
                            if !node.unlocked {
                                // Locked: darken the icon with a translucent cover.
                                d.draw_rectangle(
                                    dest.x as i32,
                                    dest.y as i32,
                                    dest.width as i32,
                                    dest.height as i32,
                                    Color::new(0, 0, 0, LOCKED_COVER_ALPHA),
                                );
                            }
                        }
                        if selected {
                            draw_label(
                                d,
                                ctx,
                                &node.name,
                                8.0,
                                h - 24.0,
                                ctx.config.text_scale * ctx.config.scaling.text,
                            );
                        }
                    }
                }
            }
            MapView::NodeDetail => {
                for layer in self.preview.iter().rev() {
                    layer.render(d, ctx.textures, w, h);
                }
                if let Some(node) = self.nodes(ctx).get(self.node_index) {
                    // Detail panel along the bottom.
                    let panel_h = 120.0;
                    d.draw_rectangle(
                        0,
                        (h - panel_h) as i32,
                        w as i32,
                        panel_h as i32,
                        Color::new(0, 0, 0, 200),
                    );
                    let text_scale = ctx.config.text_scale * ctx.config.scaling.text;
                    draw_label(d, ctx, &node.name, 12.0, h - panel_h + 10.0, text_scale);
                    let goal = format!("STEPS: {}", node.total_steps);
                    draw_label(d, ctx, &goal, 12.0, h - panel_h + 34.0, text_scale);

                    if let Some(boss) = ctx.textures.get(&node.boss_sprite_id) {
                        let scale = ctx.config.scaling.sprites * ctx.config.asset_scale;
                        let bw = boss.width as f32 * scale;
                        let bh = boss.height as f32 * scale;
                        let src = Rectangle {
                            x: 0.0,
                            y: 0.0,
                            width: boss.width as f32,
                            height: boss.height as f32,
                        };
                        let dest = Rectangle {
                            x: w - bw - 16.0,
                            y: h - panel_h + (panel_h - bh) / 2.0,
                            width: bw,
                            height: bh,
                        };
                        d.draw_texture_pro(boss, src, dest, Vector2::zero(), 0.0, Color::WHITE);
                    }
                }
            }
        }

        let alpha = self.fade_overlay_alpha();
        if alpha > 0 {
            d.draw_rectangle(0, 0, w as i32, h as i32, Color::new(0, 0, 0, alpha));
        }
    }
}

fn draw_label(
    d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>,
    ctx: &GameContext,
    text: &str,
    x: f32,
    y: f32,
    scale: f32,
) {
    match ctx.atlas.font("ui_font") {
        Some(font) => font.draw(d, ctx.textures, text, x, y, scale, Color::WHITE),
        None => d.draw_text(text, x as i32, y as i32, (10.0 * scale) as i32, Color::WHITE),
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

    fn press(services: &mut Services, scene: &mut MapScene, action: GameAction) {
        services.input.begin_frame();
        services.input.set_raw(action, true);
        scene.handle_input(&mut services.ctx());
        services.input.begin_frame();
        services.input.set_raw(action, false);
    }

    #[test]
    fn test_enters_in_continent_view() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        assert_eq!(scene.view(), MapView::Continent);
        assert_eq!(scene.continent_index(), 0);
    }

    #[test]
    fn test_confirm_descends_into_node_view() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(scene.view(), MapView::Node);
        press(&mut services, &mut scene, GameAction::Cancel);
        assert_eq!(scene.view(), MapView::Continent);
    }

    #[test]
    fn test_node_selection_wraps() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Confirm);
        press(&mut services, &mut scene, GameAction::NavLeft);
        assert_eq!(scene.node_index(), 5);
        press(&mut services, &mut scene, GameAction::NavRight);
        assert_eq!(scene.node_index(), 0);
        press(&mut services, &mut scene, GameAction::NavRight);
        assert_eq!(scene.node_index(), 1);
    }

    #[test]
    fn test_continent_switch_wraps_and_fades() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        // Single continent: switching to self is a no-op, no fade starts.
        press(&mut services, &mut scene, GameAction::NavDown);
        assert!(!scene.fading());

        // With a second continent the fade runs and swaps at the midpoint.
        let mut second = services.world.continents[0].clone();
        second.id = "server_continent".to_string();
        services.world.continents.push(second);
        press(&mut services, &mut scene, GameAction::NavDown);
        assert!(scene.fading());
        scene.update(0.1, &mut services.ctx());
        assert_eq!(scene.continent_index(), 0);
        scene.update(0.1, &mut services.ctx());
        assert_eq!(scene.continent_index(), 1);
        scene.update(0.1, &mut services.ctx());
        assert!(!scene.fading());
    }

    #[test]
    fn test_input_ignored_during_continent_fade() {
        let mut services = services();
        let mut second = services.world.continents[0].clone();
        second.id = "server_continent".to_string();
        services.world.continents.push(second);
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::NavDown);
        assert!(scene.fading());
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(scene.view(), MapView::Continent);
    }

    #[test]
    fn test_continent_cancel_pops_the_scene() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Cancel);
        assert!(services.requests.has_pending());
    }

    #[test]
    fn test_locked_node_cannot_be_opened() {
        let mut services = services();
        services.world.continents[0].nodes[0].unlocked = false;
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Confirm);
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(scene.view(), MapView::Node);
    }

    #[test]
    fn test_detail_confirm_selects_node_and_requests_handoff() {
        let mut services = services();
        services.world.continents[0].nodes[1].unlocked = true;
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Confirm);
        press(&mut services, &mut scene, GameAction::NavRight);
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(scene.view(), MapView::NodeDetail);
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(services.player.current_node_id, "file_island_lake");
        assert_eq!(services.player.step_goal, 450);
        assert!(services.requests.has_pending());
    }

    #[test]
    fn test_detail_cancel_returns_to_node_view() {
        let mut services = services();
        let mut scene = MapScene::new();
        scene.enter(&mut services.ctx());
        press(&mut services, &mut scene, GameAction::Confirm);
        press(&mut services, &mut scene, GameAction::Confirm);
        assert_eq!(scene.view(), MapView::NodeDetail);
        press(&mut services, &mut scene, GameAction::Cancel);
        assert_eq!(scene.view(), MapView::Node);
    }
}
