//! Animation playback cursor.
//!
//! One animator per on-screen sprite. The animator holds a shared
//! [`AnimationRecord`], the current frame index, and a time accumulator.
//! `update(dt)` consumes elapsed time against per-frame durations,
//! wrapping on looping records or clamping to the last frame and raising
//! the finished flag otherwise.

use crate::gfx::atlas::AnimationRecord;
use log::warn;
use raylib::prelude::Rectangle;
use std::sync::Arc;

#[derive(Default)]
pub struct Animator {
    record: Option<Arc<AnimationRecord>>,
    frame_index: usize,
    acc: f32,
    finished: bool,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `record`. Setting the same record again keeps the cursor
    /// unless `force_restart` is set; any other change resets it.
    pub fn set_animation(&mut self, record: Option<Arc<AnimationRecord>>, force_restart: bool) {
        let same = match (&self.record, &record) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same && !force_restart {
            return;
        }
        self.record = record;
        self.restart();
    }

    /// Reset the cursor to the first frame.
    pub fn restart(&mut self) {
        self.frame_index = 0;
        self.acc = 0.0;
        self.finished = false;
    }

    /// Halt playback on the current frame.
    pub fn stop(&mut self) {
        self.finished = true;
    }

    /// Advance the cursor by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.finished || dt < 0.0 {
            return;
        }
        let Some(record) = self.record.clone() else {
            return;
        };
        let frame_count = record.rects.len();
        if frame_count == 0 {
            return;
        }
        if self.frame_index >= frame_count {
            warn!(
                "Animator: frame index {} out of range for {:?}, clamping",
                self.frame_index, record.id
            );
            self.frame_index = 0;
        }

        let mut remaining = self.acc + dt;
        // Cap on consecutive zero-duration skips to keep the loop finite.
        let mut zero_skips = 0;
        loop {
            let duration = record.durations[self.frame_index];
            if duration <= 0.0 {
                warn!(
                    "Animator: zero-duration frame {} in {:?}, skipping",
                    self.frame_index, record.id
                );
                zero_skips += 1;
                if zero_skips > frame_count {
                    self.acc = 0.0;
                    return;
                }
                if !self.advance_index(&record) {
                    return;
                }
                continue;
            }
            if remaining < duration {
                self.acc = remaining;
                return;
            }
            remaining -= duration;
            zero_skips = 0;
            if !self.advance_index(&record) {
                return;
            }
        }
    }

    /// Move to the next frame. Returns false when playback ended.
    fn advance_index(&mut self, record: &AnimationRecord) -> bool {
        let last = record.rects.len() - 1;
        if self.frame_index < last {
            self.frame_index += 1;
            true
        } else if record.looping {
            self.frame_index = 0;
            true
        } else {
            self.frame_index = last;
            self.acc = 0.0;
            self.finished = true;
            false
        }
    }

    pub fn record(&self) -> Option<&Arc<AnimationRecord>> {
        self.record.as_ref()
    }

    pub fn has_record(&self) -> bool {
        self.record.is_some()
    }

    /// Texture cache key of the current animation's atlas.
    pub fn current_texture(&self) -> Option<&str> {
        self.record.as_ref().map(|r| &*r.tex_key)
    }

    /// Source rectangle of the current frame.
    pub fn current_rect(&self) -> Option<Rectangle> {
        let record = self.record.as_ref()?;
        record.rects.get(self.frame_index).copied()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
