//! Centralized error reporter.
//!
//! Components report recoverable failures here instead of logging directly
//! when the same failure can repeat every frame (a missing texture is
//! requested on each render, a malformed animation is looked up on each
//! update). The reporter classifies by severity and category, forwards the
//! first occurrence to the log, and counts repeats of the same key inside a
//! suppression window. When the window expires the repeat count is emitted
//! once and the window restarts.

use log::{error, info, warn};
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};

/// How long repeats of the same key are counted instead of re-logged.
const SUPPRESSION_WINDOW: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Asset,
    Config,
    Animation,
    Scene,
    System,
}

impl Category {
    fn label(self) -> &'static str {
        match self {
            Category::Asset => "asset",
            Category::Config => "config",
            Category::Animation => "animation",
            Category::Scene => "scene",
            Category::System => "system",
        }
    }
}

struct WindowState {
    opened: Instant,
    suppressed: u64,
}

/// Deduplicating error sink. One instance per process, owned by the frame
/// loop and handed to scenes through the game context.
pub struct ErrorReporter {
    windows: FxHashMap<String, WindowState>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            windows: FxHashMap::default(),
        }
    }

    /// Report a failure identified by `key`. The first report of a key logs
    /// immediately; repeats within the suppression window are only counted.
    pub fn report(&mut self, severity: Severity, category: Category, key: &str, message: &str) {
        self.report_at(Instant::now(), severity, category, key, message);
    }

    /// Clock-injected variant of [`report`](Self::report).
    pub fn report_at(
        &mut self,
        now: Instant,
        severity: Severity,
        category: Category,
        key: &str,
        message: &str,
    ) {
        if let Some(state) = self.windows.get_mut(key) {
            if now.duration_since(state.opened) < SUPPRESSION_WINDOW {
                state.suppressed += 1;
                return;
            }
            let repeats = state.suppressed;
            state.opened = now;
            state.suppressed = 0;
            if repeats > 0 {
                Self::emit(
                    severity,
                    category,
                    &format!("{} (repeated {} more times)", message, repeats),
                );
            } else {
                Self::emit(severity, category, message);
            }
            return;
        }
        self.windows.insert(
            key.to_string(),
            WindowState {
                opened: now,
                suppressed: 0,
            },
        );
        Self::emit(severity, category, message);
    }

    /// Number of suppressed repeats currently pending for `key`.
    pub fn suppressed_count(&self, key: &str) -> u64 {
        self.windows.get(key).map_or(0, |w| w.suppressed)
    }

    fn emit(severity: Severity, category: Category, message: &str) {
        match severity {
            Severity::Info => info!("[{}] {}", category.label(), message),
            Severity::Warning => warn!("[{}] {}", category.label(), message),
            Severity::Error | Severity::Critical => {
                error!("[{}] {}", category.label(), message)
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
