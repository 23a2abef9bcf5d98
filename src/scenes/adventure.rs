//! Adventure scene.
//!
//! The partner creature walks a three-layer parallax landscape. Pressing
//! the step action queues a walk cycle (capped at two); each completed
//! cycle consumes one queued step and advances the player's step counters
//! toward the node's goal, which triggers a battle.

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::gfx::animator::Animator;
use crate::gfx::atlas::{self, walk_cycle_seconds};
use crate::gfx::parallax::ParallaxLayer;
use crate::gfx::variants::LayerRole;
use crate::input::GameAction;
use crate::player::PARTNER_IDS;
use crate::report::{Category, Severity};
use crate::scenes::battle::{BattleScene, LayerSnapshot};
use crate::scenes::map::MapScene;
use crate::scenes::menu::MenuScene;
use crate::scenes::Scene;
use raylib::prelude::*;
use std::path::PathBuf;

/// At most this many walk cycles may be queued ahead.
pub const MAX_QUEUED_STEPS: u32 = 2;

/// Foreground scroll rate in pixels per second; the other layers derive
/// from it.
pub const BASE_SCROLL_SPEED: f32 = 60.0;

/// Foreground : middleground : background scroll ratios.
const SCROLL_RATIOS: [f32; 3] = [1.0, 0.33, 0.17];

/// Partner sprite rests slightly below the vertical center.
const PARTNER_VERTICAL_OFFSET: f32 = 7.0;

const DEFAULT_ENVIRONMENT: &str = "tropicaljungle";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkState {
    Idle,
    Walking,
}

/// Outcome of one completed walk cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    ContinueWalking,
    BackToIdle,
}

/// The IDLE/WALKING step-queue machine, kept free of rendering state.
#[derive(Debug)]
pub struct StepFsm {
    state: WalkState,
    queued: u32,
}

impl StepFsm {
    pub fn new() -> Self {
        Self {
            state: WalkState::Idle,
            queued: 0,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn queued(&self) -> u32 {
        self.queued
    }

    /// Queue one step, saturating at [`MAX_QUEUED_STEPS`].
    pub fn queue_step(&mut self) {
        self.queued = (self.queued + 1).min(MAX_QUEUED_STEPS);
    }

    /// Transition IDLE → WALKING when steps are queued. Returns true when
    /// the walk just started.
    pub fn begin_if_ready(&mut self) -> bool {
        if self.state == WalkState::Idle && self.queued > 0 {
            self.state = WalkState::Walking;
            true
        } else {
            false
        }
    }

    /// Consume one queued step after a completed walk cycle.
    pub fn complete_cycle(&mut self) -> CycleOutcome {
        self.queued = self.queued.saturating_sub(1);
        if self.queued > 0 {
            CycleOutcome::ContinueWalking
        } else {
            self.state = WalkState::Idle;
            CycleOutcome::BackToIdle
        }
    }

    pub fn reset(&mut self) {
        self.state = WalkState::Idle;
        self.queued = 0;
    }
}

impl Default for StepFsm {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AdventureScene {
    /// Foreground, middleground, background.
    layers: Vec<ParallaxLayer>,
    fsm: StepFsm,
    animator: Animator,
    partner_id: String,
    environment: String,
    /// Paces walk cycles when the partner atlas failed to load.
    fallback_cycle_t: f32,
    battle_pending: bool,
}

impl AdventureScene {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            fsm: StepFsm::new(),
            animator: Animator::new(),
            partner_id: String::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            fallback_cycle_t: 0.0,
            battle_pending: false,
        }
    }

    fn load_layers(&mut self, ctx: &mut GameContext) {
        self.layers.clear();
        let roles = [
            LayerRole::Foreground,
            LayerRole::Middleground,
            LayerRole::Background,
        ];
        for (role, ratio) in roles.into_iter().zip(SCROLL_RATIOS) {
            let Some(path) = ctx.variants.select(&self.environment, role) else {
                ctx.reporter.report(
                    Severity::Warning,
                    Category::Asset,
                    &format!("layer:{}:{}", self.environment, role.suffix()),
                    &format!("no {} layer for '{}'", role.suffix(), self.environment),
                );
                continue;
            };
            let id = path.to_string_lossy().to_string();
            ctx.textures.request_with_path(&id, &path);
            self.layers
                .push(ParallaxLayer::new(id, BASE_SCROLL_SPEED * ratio));
        }
    }

    fn load_partner(&mut self, ctx: &mut GameContext, force_restart: bool) {
        let id = self.partner_id.clone();
        ctx.textures
            .register_path(&id, format!("assets/sprites/{}_sheet.png", id));
        if ctx.atlas.has_atlas(&id) {
            ctx.textures.request(&id);
        } else {
            let def = PathBuf::from(format!("assets/sprites/{}_sheet.json", id));
            if !ctx.atlas.load_atlas(ctx.textures, &def, &id) {
                ctx.reporter.report(
                    Severity::Warning,
                    Category::Animation,
                    &format!("atlas:{}", id),
                    &format!("no sheet definition for '{}', pacing cycles by timer", id),
                );
                // Keep the texture demand alive so at least the fallback
                // placeholder shows up.
                ctx.textures.request(&id);
            }
        }
        let idle = ctx.atlas.get(&atlas::animation_id(&id, "idle"));
        self.animator.set_animation(idle, force_restart);
        self.fallback_cycle_t = 0.0;
    }

    fn set_walk_animation(&mut self, ctx: &mut GameContext) {
        let walk = ctx.atlas.get(&atlas::animation_id(&self.partner_id, "walk"));
        self.animator.set_animation(walk, true);
        self.fallback_cycle_t = 0.0;
    }

    fn set_idle_animation(&mut self, ctx: &mut GameContext) {
        let idle = ctx.atlas.get(&atlas::animation_id(&self.partner_id, "idle"));
        self.animator.set_animation(idle, false);
    }

    /// Whether the current walk cycle finished this frame.
    fn walk_cycle_finished(&mut self, dt: f32) -> bool {
        if self.animator.has_record() {
            self.animator.is_finished()
        } else {
            self.fallback_cycle_t += dt;
            if self.fallback_cycle_t >= walk_cycle_seconds() {
                self.fallback_cycle_t = 0.0;
                true
            } else {
                false
            }
        }
    }

    fn layer_snapshots(&self) -> Vec<LayerSnapshot> {
        self.layers
            .iter()
            .map(|l| LayerSnapshot {
                texture_id: l.texture_id.clone(),
                offset: l.offset,
                speed: l.speed,
            })
            .collect()
    }

    fn start_battle(&mut self, ctx: &mut GameContext) {
        let enemy_id = ctx
            .player
            .current_node
            .as_ref()
            .map(|n| n.boss_sprite_id.clone())
            .unwrap_or_else(|| format!("assets/sprites/boss_{}.png", self.environment));
        let battle = BattleScene::new(enemy_id, self.layer_snapshots());
        ctx.requests.fade_to(Box::new(battle), 0.5, false);
    }

    pub fn walk_state(&self) -> WalkState {
        self.fsm.state()
    }

    pub fn queued_steps(&self) -> u32 {
        self.fsm.queued()
    }
}

impl Default for AdventureScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for AdventureScene {
    fn name(&self) -> &'static str {
        "adventure"
    }

    fn enter(&mut self, ctx: &mut GameContext) {
        self.environment = ctx
            .player
            .current_node
            .as_ref()
            .map(|n| n.environment.clone())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        self.partner_id = ctx.player.partner_id.clone();
        self.fsm.reset();
        self.battle_pending = false;
        self.load_layers(ctx);
        self.load_partner(ctx, true);
    }

    fn exit(&mut self, ctx: &mut GameContext) {
        for layer in &self.layers {
            ctx.textures.release(&layer.texture_id);
        }
        ctx.textures.release(&self.partner_id);
    }

    fn resume(&mut self) {
        // Back from battle; the chapter stays complete, so battle_pending
        // is deliberately left set to avoid re-triggering the encounter.
        self.fsm.reset();
    }

    fn handle_input(&mut self, ctx: &mut GameContext) {
        if ctx.input.just_pressed(GameAction::Step) {
            self.fsm.queue_step();
        }
        for (slot, action) in GameAction::SELECTORS.into_iter().enumerate() {
            if ctx.input.just_pressed(action) {
                let id = PARTNER_IDS[slot];
                if id != self.partner_id {
                    ctx.textures.release(&self.partner_id);
                    self.partner_id = id.to_string();
                    ctx.player.partner_id = self.partner_id.clone();
                    self.fsm.reset();
                    self.load_partner(ctx, true);
                }
            }
        }
        if ctx.input.just_pressed(GameAction::MenuToggle) {
            ctx.requests.push(Box::new(MenuScene::new()));
        }
        if ctx.input.just_pressed(GameAction::Cancel) {
            ctx.requests.fade_to(Box::new(MapScene::new()), 0.5, true);
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut GameContext) {
        for layer in &mut self.layers {
            layer.sync_size(ctx.textures);
        }
        match self.fsm.state() {
            WalkState::Idle => {
                if self.fsm.begin_if_ready() {
                    self.set_walk_animation(ctx);
                } else {
                    self.animator.update(dt);
                }
            }
            WalkState::Walking => {
                for layer in &mut self.layers {
                    layer.update(dt);
                }
                self.animator.update(dt);
                if self.walk_cycle_finished(dt) {
                    ctx.player.add_step();
                    match self.fsm.complete_cycle() {
                        CycleOutcome::ContinueWalking => self.set_walk_animation(ctx),
                        CycleOutcome::BackToIdle => self.set_idle_animation(ctx),
                    }
                    if ctx.player.goal_reached() && !self.battle_pending {
                        self.battle_pending = true;
                        self.start_battle(ctx);
                    }
                }
            }
        }
    }

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext) {
        d.clear_background(Color::BLACK);
        let w = LOGICAL_WIDTH as f32;
        let h = LOGICAL_HEIGHT as f32;
        // Furthest band first.
        for layer in self.layers.iter().rev() {
            layer.render(d, ctx.textures, w, h);
        }

        let sprite_scale = ctx.config.scaling.sprites * ctx.config.asset_scale;
        if let (Some(tex_key), Some(rect)) = (
            self.animator.current_texture().map(str::to_string),
            self.animator.current_rect(),
        ) {
            if let Some(texture) = ctx.textures.get(&tex_key) {
                let dest_w = rect.width * sprite_scale;
                let dest_h = rect.height * sprite_scale;
                let dest = Rectangle {
                    x: (w - dest_w) / 2.0,
                    y: (h - dest_h) / 2.0 + PARTNER_VERTICAL_OFFSET * sprite_scale,
                    width: dest_w,
                    height: dest_h,
                };
                d.draw_texture_pro(texture, rect, dest, Vector2::zero(), 0.0, Color::WHITE);
            }
        } else if let Some(texture) = ctx.textures.get(&self.partner_id) {
            let dest = Rectangle {
                x: (w - texture.width as f32 * sprite_scale) / 2.0,
                y: (h - texture.height as f32 * sprite_scale) / 2.0
                    + PARTNER_VERTICAL_OFFSET * sprite_scale,
                width: texture.width as f32 * sprite_scale,
                height: texture.height as f32 * sprite_scale,
            };
            let src = Rectangle {
                x: 0.0,
                y: 0.0,
                width: texture.width as f32,
                height: texture.height as f32,
            };
            d.draw_texture_pro(texture, src, dest, Vector2::zero(), 0.0, Color::WHITE);
        }

        let hud = format!(
            "STEPS {}/{}",
            ctx.player.steps_this_chapter, ctx.player.step_goal
        );
        let text_scale = ctx.config.text_scale * ctx.config.scaling.text;
        match ctx.atlas.font("ui_font") {
            Some(font) => font.draw(d, ctx.textures, &hud, 8.0, 8.0, text_scale, Color::WHITE),
            None => d.draw_text(&hud, 8, 8, (10.0 * text_scale) as i32, Color::WHITE),
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

    // ==================== STEP FSM ====================

    #[test]
    fn test_fsm_starts_idle_empty() {
        let fsm = StepFsm::new();
        assert_eq!(fsm.state(), WalkState::Idle);
        assert_eq!(fsm.queued(), 0);
    }

    #[test]
    fn test_queue_cap_at_two() {
        let mut fsm = StepFsm::new();
        for _ in 0..5 {
            fsm.queue_step();
        }
        assert_eq!(fsm.queued(), MAX_QUEUED_STEPS);
    }

    #[test]
    fn test_idle_to_walking_on_queued_step() {
        let mut fsm = StepFsm::new();
        assert!(!fsm.begin_if_ready());
        fsm.queue_step();
        assert!(fsm.begin_if_ready());
        assert_eq!(fsm.state(), WalkState::Walking);
        // Already walking: no second start.
        assert!(!fsm.begin_if_ready());
    }

    #[test]
    fn test_two_queued_steps_need_two_cycles() {
        let mut fsm = StepFsm::new();
        fsm.queue_step();
        fsm.queue_step();
        fsm.begin_if_ready();
        assert_eq!(fsm.complete_cycle(), CycleOutcome::ContinueWalking);
        assert_eq!(fsm.state(), WalkState::Walking);
        assert_eq!(fsm.complete_cycle(), CycleOutcome::BackToIdle);
        assert_eq!(fsm.state(), WalkState::Idle);
        assert_eq!(fsm.queued(), 0);
    }

    #[test]
    fn test_steps_queued_while_walking_extend_the_walk() {
        let mut fsm = StepFsm::new();
        fsm.queue_step();
        fsm.begin_if_ready();
        fsm.queue_step();
        assert_eq!(fsm.complete_cycle(), CycleOutcome::ContinueWalking);
        assert_eq!(fsm.complete_cycle(), CycleOutcome::BackToIdle);
    }

    // ==================== SCENE (headless) ====================

    #[test]
    fn test_enter_picks_node_environment() {
        let mut services = services();
        let node = services.world.node("file_island_lake").unwrap().clone();
        services.player.set_current_node(&node);
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());
        assert_eq!(scene.environment, "lake");
        assert_eq!(scene.layers.len(), 3);
        // Foreground scrolls fastest.
        assert!(scene.layers[0].speed > scene.layers[2].speed);
    }

    #[test]
    fn test_step_action_queues_and_walks() {
        let mut services = services();
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());

        // Frame: press step.
        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        scene.handle_input(&mut services.ctx());
        assert_eq!(scene.queued_steps(), 1);
        scene.update(0.016, &mut services.ctx());
        assert_eq!(scene.walk_state(), WalkState::Walking);
    }

    #[test]
    fn test_over_queue_capped_at_two() {
        let mut services = services();
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());
        for _ in 0..5 {
            services.input.begin_frame();
            services.input.set_raw(GameAction::Step, true);
            scene.handle_input(&mut services.ctx());
            services.input.begin_frame();
            scene.handle_input(&mut services.ctx());
        }
        assert_eq!(scene.queued_steps(), 2);
    }

    #[test]
    fn test_two_cycles_return_to_idle_and_count_steps() {
        let mut services = services();
        let node = services.world.node("file_island_tropicaljungle").unwrap().clone();
        services.player.set_current_node(&node);
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());

        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        scene.handle_input(&mut services.ctx());
        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        // Second press is a new edge only after a release; force two edges.
        services.input.set_raw(GameAction::Step, false);
        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        scene.handle_input(&mut services.ctx());
        assert_eq!(scene.queued_steps(), 2);

        // No atlas on disk in tests: cycles pace on the fallback timer
        // (one walk-cycle duration each).
        let cycle = walk_cycle_seconds();
        let frames = ((cycle * 2.0) / 0.05).ceil() as usize + 4;
        for _ in 0..frames {
            scene.update(0.05, &mut services.ctx());
        }
        assert_eq!(scene.walk_state(), WalkState::Idle);
        assert_eq!(scene.queued_steps(), 0);
        assert_eq!(services.player.steps_this_chapter, 2);
        assert_eq!(services.player.total_steps, 2);
    }

    #[test]
    fn test_parallax_advances_only_while_walking() {
        let mut services = services();
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());
        // Give layers a size so updates are not inert.
        for layer in &mut scene.layers {
            layer.width = 256.0;
            layer.height = 128.0;
        }
        scene.update(0.5, &mut services.ctx());
        assert!(scene.layers.iter().all(|l| l.offset == 0.0));

        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        scene.handle_input(&mut services.ctx());
        scene.update(0.016, &mut services.ctx()); // transition to walking
        scene.update(0.5, &mut services.ctx());
        assert!(scene.layers.iter().any(|l| l.offset != 0.0));
    }

    #[test]
    fn test_goal_reached_requests_battle_transition() {
        let mut services = services();
        let mut node = services.world.node("file_island_lake").unwrap().clone();
        node.total_steps = 1;
        services.player.set_current_node(&node);
        let mut scene = AdventureScene::new();
        scene.enter(&mut services.ctx());

        services.input.begin_frame();
        services.input.set_raw(GameAction::Step, true);
        scene.handle_input(&mut services.ctx());
        let frames = ((walk_cycle_seconds() + 0.2) / 0.05).ceil() as usize;
        for _ in 0..frames {
            scene.update(0.05, &mut services.ctx());
        }
        assert!(services.player.goal_reached());
        assert!(services.requests.has_pending());
    }
}
