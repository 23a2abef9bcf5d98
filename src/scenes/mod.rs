//! Scene lifecycle and the pushdown scene stack.
//!
//! The game is a stack of scenes with the top one active. Scenes never
//! mutate the stack directly; they queue push/pop requests on
//! [`SceneRequests`] (part of the game context), and the stack applies
//! them at the start of the next frame. A scene that requests a push
//! during its update still gets its render call the same frame.

pub mod adventure;
pub mod battle;
pub mod map;
pub mod menu;
pub mod partner_select;
pub mod progress;
pub mod settings;
pub mod stack;
pub mod transition;

use crate::context::GameContext;
use log::warn;
use raylib::prelude::{RaylibDrawHandle, RaylibHandle, RaylibTextureMode, RaylibThread};

pub use stack::SceneStack;

/// One scene of the game. The stack exclusively owns every scene; the
/// pointer transfers at push time and the scene is destroyed at pop time.
pub trait Scene {
    fn name(&self) -> &'static str;

    /// Called once when the scene becomes part of the stack.
    fn enter(&mut self, _ctx: &mut GameContext) {}

    /// Called once when the scene is popped, before destruction.
    fn exit(&mut self, _ctx: &mut GameContext) {}

    /// Another scene was pushed on top of this one.
    fn pause(&mut self) {}

    /// The scene above was popped; this one is active again.
    fn resume(&mut self) {}

    fn handle_input(&mut self, ctx: &mut GameContext);

    fn update(&mut self, dt: f32, ctx: &mut GameContext);

    /// GPU-side preparation, called by the frame loop outside any drawing
    /// scope. The only scene phase with renderer access; used for one-off
    /// texture creation such as pre-rendered name strings.
    fn prepare(&mut self, _rl: &mut RaylibHandle, _th: &RaylibThread, _ctx: &mut GameContext) {}

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, ctx: &GameContext);

    /// When true, the stack renders the scene beneath this one first, so a
    /// transition can compose over the prior scene's frame.
    fn renders_underlying(&self) -> bool {
        false
    }
}

/// Deferred stack mutations, applied once per frame between routing
/// phases. Scenes queue requests here through the game context.
pub struct SceneRequests {
    to_push: Option<Box<dyn Scene>>,
    pop_count: usize,
    quit: bool,
}

impl SceneRequests {
    pub fn new() -> Self {
        Self {
            to_push: None,
            pop_count: 0,
            quit: false,
        }
    }

    /// Queue a push. A previous unflushed push is overwritten with a
    /// warning.
    pub fn push(&mut self, scene: Box<dyn Scene>) {
        if let Some(old) = self.to_push.replace(scene) {
            warn!(
                "SceneRequests: overwriting pending push of {}",
                old.name()
            );
        }
    }

    /// Queue one pop. May be called several times per frame.
    pub fn pop(&mut self) {
        self.pop_count += 1;
    }

    /// Queue a pop of the current scene plus a push of `scene`.
    pub fn replace(&mut self, scene: Box<dyn Scene>) {
        self.pop();
        self.push(scene);
    }

    /// Push a fade-to-black transition which, on completion, pops itself
    /// and hands off to `next` (replacing the underlying scene when
    /// `use_replace` is set).
    pub fn fade_to(&mut self, next: Box<dyn Scene>, duration: f32, use_replace: bool) {
        self.push(Box::new(transition::TransitionScene::fade_to(
            raylib::prelude::Color::BLACK,
            duration,
            Some(next),
            use_replace,
        )));
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn has_pending(&self) -> bool {
        self.to_push.is_some() || self.pop_count > 0
    }

    pub(crate) fn take_pops(&mut self) -> usize {
        std::mem::take(&mut self.pop_count)
    }

    pub(crate) fn take_push(&mut self) -> Option<Box<dyn Scene>> {
        self.to_push.take()
    }
}

impl Default for SceneRequests {
    fn default() -> Self {
        Self::new()
    }
}
