//! The scene stack.
//!
//! Owns scenes in strict stack order and resolves the deferred mutation
//! queue exactly once per frame, before input routing. Mutations a scene
//! requests during `handle_input`/`update` therefore take effect only
//! after that scene's render, never mid-frame.

use crate::context::GameContext;
use crate::scenes::Scene;
use log::{info, warn};
use raylib::prelude::{RaylibDrawHandle, RaylibHandle, RaylibTextureMode, RaylibThread};

pub struct SceneStack {
    scenes: Vec<Box<dyn Scene>>,
}

impl SceneStack {
    pub fn new() -> Self {
        Self { scenes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn top_name(&self) -> Option<&'static str> {
        self.scenes.last().map(|s| s.name())
    }

    /// Apply queued pops then the queued push. Call once per frame before
    /// routing input. Requests issued from `exit`/`enter` land in the
    /// queue for the next frame.
    pub fn apply(&mut self, ctx: &mut GameContext) {
        let pops = ctx.requests.take_pops();
        let push = ctx.requests.take_push();

        for _ in 0..pops {
            match self.scenes.pop() {
                Some(mut scene) => {
                    info!("SceneStack: pop {}", scene.name());
                    scene.exit(ctx);
                }
                None => warn!("SceneStack: pop requested on empty stack, dropped"),
            }
        }

        match push {
            Some(mut scene) => {
                if let Some(top) = self.scenes.last_mut() {
                    top.pause();
                }
                info!("SceneStack: push {}", scene.name());
                scene.enter(ctx);
                self.scenes.push(scene);
            }
            None => {
                if pops > 0 {
                    if let Some(top) = self.scenes.last_mut() {
                        top.resume();
                    }
                }
            }
        }
    }

    pub fn handle_input(&mut self, ctx: &mut GameContext) {
        if let Some(top) = self.scenes.last_mut() {
            top.handle_input(ctx);
        }
    }

    pub fn update(&mut self, dt: f32, ctx: &mut GameContext) {
        if let Some(top) = self.scenes.last_mut() {
            top.update(dt, ctx);
        }
    }

    /// Run GPU-side preparation for the visible scenes.
    pub fn prepare(&mut self, rl: &mut RaylibHandle, th: &RaylibThread, ctx: &mut GameContext) {
        let n = self.scenes.len();
        if n == 0 {
            return;
        }
        if n >= 2 && self.scenes[n - 1].renders_underlying() {
            let (below, top) = self.scenes.split_at_mut(n - 1);
            below[n - 2].prepare(rl, th, ctx);
            top[0].prepare(rl, th, ctx);
        } else {
            self.scenes[n - 1].prepare(rl, th, ctx);
        }
    }

    /// Render the top scene, composing it over the scene beneath when the
    /// top requests underlying rendering (transitions do).
    pub fn render(
        &mut self,
        d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>,
        ctx: &GameContext,
    ) {
        let n = self.scenes.len();
        if n == 0 {
            return;
        }
        if n >= 2 && self.scenes[n - 1].renders_underlying() {
            let (below, top) = self.scenes.split_at_mut(n - 1);
            below[n - 2].render(d, ctx);
            top[0].render(d, ctx);
        } else {
            self.scenes[n - 1].render(d, ctx);
        }
    }
}

impl Default for SceneStack {
    fn default() -> Self {
        Self::new()
    }
}
