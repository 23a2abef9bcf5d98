//! Transition scenes.
//!
//! A transition sits on top of the stack, renders the scene beneath it,
//! and overlays either a color fade or a geometric border wipe. On
//! completion it pops itself and, when configured, hands off to a next
//! scene (optionally replacing the scene it covered).

use crate::config::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::context::GameContext;
use crate::scenes::Scene;
use raylib::prelude::*;

/// Minimum transition duration; zero or negative durations are clamped so
/// a transition always completes on a later frame than it started.
const MIN_DURATION: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionKind {
    /// Four border bars slide from the screen edges inward to `inset`.
    BorderWipe { inset: f32 },
    /// Overlay alpha ramps 0 → 255 over the duration.
    FadeTo(Color),
    /// Overlay alpha ramps 255 → 0 over the duration.
    FadeFrom(Color),
}

pub struct TransitionScene {
    kind: TransitionKind,
    duration: f32,
    t: f32,
    next: Option<Box<dyn Scene>>,
    replace_under: bool,
    completed: bool,
}

impl TransitionScene {
    fn new(kind: TransitionKind, duration: f32) -> Self {
        Self {
            kind,
            duration: duration.max(MIN_DURATION),
            t: 0.0,
            next: None,
            replace_under: false,
            completed: false,
        }
    }

    pub fn fade_to(
        color: Color,
        duration: f32,
        next: Option<Box<dyn Scene>>,
        replace_under: bool,
    ) -> Self {
        let mut scene = Self::new(TransitionKind::FadeTo(color), duration);
        scene.next = next;
        scene.replace_under = replace_under;
        scene
    }

    pub fn fade_from(color: Color, duration: f32) -> Self {
        Self::new(TransitionKind::FadeFrom(color), duration)
    }

    pub fn border_wipe(duration: f32, inset: f32) -> Self {
        Self::new(TransitionKind::BorderWipe { inset }, duration)
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        (self.t / self.duration).clamp(0.0, 1.0)
    }

    /// Current overlay alpha for the fade kinds.
    pub fn overlay_alpha(&self) -> u8 {
        match self.kind {
            TransitionKind::FadeTo(_) | TransitionKind::BorderWipe { .. } => {
                fade_alpha(self.t, self.duration)
            }
            TransitionKind::FadeFrom(_) => 255 - fade_alpha(self.t, self.duration),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Scene for TransitionScene {
    fn name(&self) -> &'static str {
        "transition"
    }

    fn handle_input(&mut self, _ctx: &mut GameContext) {
        // Transitions swallow input; the scene beneath stays paused.
    }

    fn update(&mut self, dt: f32, ctx: &mut GameContext) {
        if self.completed {
            return;
        }
        self.t += dt;
        if self.t >= self.duration {
            self.completed = true;
            // Pops resolve before the push, so the order is: this
            // transition, then (optionally) the scene it covered, then the
            // hand-off push.
            ctx.requests.pop();
            if self.replace_under {
                ctx.requests.pop();
            }
            if let Some(next) = self.next.take() {
                ctx.requests.push(next);
            }
        }
    }

    fn render(&mut self, d: &mut RaylibTextureMode<'_, RaylibDrawHandle<'_>>, _ctx: &GameContext) {
        match self.kind {
            TransitionKind::FadeTo(color) | TransitionKind::FadeFrom(color) => {
                let overlay = Color {
                    a: self.overlay_alpha(),
                    ..color
                };
                d.draw_rectangle(
                    0,
                    0,
                    LOGICAL_WIDTH as i32,
                    LOGICAL_HEIGHT as i32,
                    overlay,
                );
            }
            TransitionKind::BorderWipe { inset } => {
                let eased = ease_cubic_in_out(self.progress());
                draw_border_wipe(d, eased, inset);
            }
        }
    }

    fn renders_underlying(&self) -> bool {
        true
    }
}

/// Overlay alpha for a linear fade: `round(255 * t / duration)`, clamped.
pub fn fade_alpha(t: f32, duration: f32) -> u8 {
    let ratio = (t / duration).clamp(0.0, 1.0);
    (255.0 * ratio).round() as u8
}

/// Cubic ease-in-out over `t` in `[0, 1]`.
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Draw the four border bars at eased progress `e` in `[0, 1]`, sliding
/// from off-screen to `inset` pixels past the edges. Shared with the
/// battle scene's tooth phases.
pub fn draw_border_wipe<D: RaylibDraw>(d: &mut D, e: f32, inset: f32) {
    let w = LOGICAL_WIDTH as f32;
    let h = LOGICAL_HEIGHT as f32;
    let bar_h = h / 2.0 + inset;
    let bar_w = w / 2.0 + inset;
    // Vertical travel: from fully off-screen (-bar) to resting at -inset.
    let top_y = -bar_h + e * (bar_h - inset);
    let left_x = -bar_w + e * (bar_w - inset);
    d.draw_rectangle(0, top_y as i32, w as i32, bar_h as i32, Color::BLACK);
    d.draw_rectangle(
        0,
        (h - top_y - bar_h) as i32,
        w as i32,
        bar_h as i32,
        Color::BLACK,
    );
    d.draw_rectangle(left_x as i32, 0, bar_w as i32, h as i32, Color::BLACK);
    d.draw_rectangle(
        (w - left_x - bar_w) as i32,
        0,
        bar_w as i32,
        h as i32,
        Color::BLACK,
    );
}
