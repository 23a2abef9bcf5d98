//! Input dispatcher.
//!
//! A two-map design: scancode bindings populated at init from the
//! configuration, and per-action current/previous booleans refreshed once
//! per frame. Scenes poll edge state; there is no event subscription.
//!
//! Edge queries:
//! - `just_pressed(a)` ⇔ current ∧ ¬previous
//! - `held(a)` ⇔ current
//! - `just_released(a)` ⇔ ¬current ∧ previous

use crate::config::KeyConfig;
use log::warn;
use raylib::prelude::{KeyboardKey, RaylibHandle};

/// Abstract game actions produced by the scancode mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum GameAction {
    NavUp,
    NavDown,
    NavLeft,
    NavRight,
    Confirm,
    Cancel,
    Step,
    SelectDigi1,
    SelectDigi2,
    SelectDigi3,
    SelectDigi4,
    SelectDigi5,
    SelectDigi6,
    SelectDigi7,
    SelectDigi8,
    MenuToggle,
    ToggleFullscreen,
    Quit,
}

pub const ACTION_COUNT: usize = 18;

impl GameAction {
    pub const ALL: [GameAction; ACTION_COUNT] = [
        GameAction::NavUp,
        GameAction::NavDown,
        GameAction::NavLeft,
        GameAction::NavRight,
        GameAction::Confirm,
        GameAction::Cancel,
        GameAction::Step,
        GameAction::SelectDigi1,
        GameAction::SelectDigi2,
        GameAction::SelectDigi3,
        GameAction::SelectDigi4,
        GameAction::SelectDigi5,
        GameAction::SelectDigi6,
        GameAction::SelectDigi7,
        GameAction::SelectDigi8,
        GameAction::MenuToggle,
        GameAction::ToggleFullscreen,
        GameAction::Quit,
    ];

    /// The numeric partner-selector actions, in order.
    pub const SELECTORS: [GameAction; 8] = [
        GameAction::SelectDigi1,
        GameAction::SelectDigi2,
        GameAction::SelectDigi3,
        GameAction::SelectDigi4,
        GameAction::SelectDigi5,
        GameAction::SelectDigi6,
        GameAction::SelectDigi7,
        GameAction::SelectDigi8,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GameAction::NavUp => "Nav Up",
            GameAction::NavDown => "Nav Down",
            GameAction::NavLeft => "Nav Left",
            GameAction::NavRight => "Nav Right",
            GameAction::Confirm => "Confirm",
            GameAction::Cancel => "Cancel",
            GameAction::Step => "Step",
            GameAction::SelectDigi1 => "Select Digi 1",
            GameAction::SelectDigi2 => "Select Digi 2",
            GameAction::SelectDigi3 => "Select Digi 3",
            GameAction::SelectDigi4 => "Select Digi 4",
            GameAction::SelectDigi5 => "Select Digi 5",
            GameAction::SelectDigi6 => "Select Digi 6",
            GameAction::SelectDigi7 => "Select Digi 7",
            GameAction::SelectDigi8 => "Select Digi 8",
            GameAction::MenuToggle => "Menu",
            GameAction::ToggleFullscreen => "Fullscreen",
            GameAction::Quit => "Quit",
        }
    }
}

/// One scancode-to-action pair. Several keys may bind the same action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub key: KeyboardKey,
    pub action: GameAction,
}

/// Per-frame edge-detecting action state plus the scancode mapping.
pub struct InputDispatcher {
    bindings: Vec<Binding>,
    current: [bool; ACTION_COUNT],
    previous: [bool; ACTION_COUNT],
}

impl InputDispatcher {
    /// Build the dispatcher with the built-in default bindings only.
    pub fn new() -> Self {
        Self {
            bindings: default_bindings(),
            current: [false; ACTION_COUNT],
            previous: [false; ACTION_COUNT],
        }
    }

    /// Build the dispatcher from configured key names layered over the
    /// defaults. Unparseable names are warned about and skipped.
    pub fn from_config(keys: &KeyConfig) -> Self {
        let mut dispatcher = Self::new();
        let overrides = [
            (&keys.move_up, GameAction::NavUp),
            (&keys.move_down, GameAction::NavDown),
            (&keys.move_left, GameAction::NavLeft),
            (&keys.move_right, GameAction::NavRight),
            (&keys.action, GameAction::Confirm),
            (&keys.back, GameAction::Cancel),
            (&keys.menu, GameAction::MenuToggle),
            (&keys.toggle_screen, GameAction::ToggleFullscreen),
        ];
        for (name, action) in overrides {
            match parse_key_name(name) {
                Some(key) => dispatcher.rebind(action, key),
                None => warn!("Unknown key name {:?} for {}", name, action.label()),
            }
        }
        dispatcher
    }

    /// Snapshot current state into previous and clear current. Call once
    /// per frame before polling.
    pub fn begin_frame(&mut self) {
        self.previous = self.current;
        self.current = [false; ACTION_COUNT];
    }

    /// Read raw key state from the window and set the mapped actions.
    pub fn poll(&mut self, rl: &RaylibHandle) {
        for binding in &self.bindings {
            if rl.is_key_down(binding.key) {
                self.current[binding.action as usize] = true;
            }
        }
    }

    /// Directly set an action's raw state for this frame.
    pub fn set_raw(&mut self, action: GameAction, pressed: bool) {
        self.current[action as usize] = pressed;
    }

    pub fn just_pressed(&self, action: GameAction) -> bool {
        self.current[action as usize] && !self.previous[action as usize]
    }

    pub fn held(&self, action: GameAction) -> bool {
        self.current[action as usize]
    }

    pub fn just_released(&self, action: GameAction) -> bool {
        !self.current[action as usize] && self.previous[action as usize]
    }

    /// Bind `key` to `action`, removing any existing binding of that key.
    pub fn rebind(&mut self, action: GameAction, key: KeyboardKey) {
        self.bindings.retain(|b| b.key != key);
        self.bindings.push(Binding { key, action });
    }

    /// First key currently bound to `action`, if any.
    pub fn key_for(&self, action: GameAction) -> Option<KeyboardKey> {
        self.bindings.iter().find(|b| b.action == action).map(|b| b.key)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn default_bindings() -> Vec<Binding> {
    use GameAction::*;
    use KeyboardKey::*;
    let pairs: [(KeyboardKey, GameAction); 25] = [
        (KEY_UP, NavUp),
        (KEY_DOWN, NavDown),
        (KEY_LEFT, NavLeft),
        (KEY_RIGHT, NavRight),
        (KEY_W, NavUp),
        (KEY_S, NavDown),
        (KEY_A, NavLeft),
        (KEY_D, NavRight),
        (KEY_ENTER, Confirm),
        (KEY_KP_ENTER, Confirm),
        (KEY_Z, Confirm),
        (KEY_ESCAPE, Cancel),
        (KEY_BACKSPACE, Cancel),
        (KEY_X, Cancel),
        (KEY_SPACE, Step),
        (KEY_ONE, SelectDigi1),
        (KEY_TWO, SelectDigi2),
        (KEY_THREE, SelectDigi3),
        (KEY_FOUR, SelectDigi4),
        (KEY_FIVE, SelectDigi5),
        (KEY_SIX, SelectDigi6),
        (KEY_SEVEN, SelectDigi7),
        (KEY_EIGHT, SelectDigi8),
        (KEY_M, MenuToggle),
        (KEY_F11, ToggleFullscreen),
    ];
    pairs
        .into_iter()
        .map(|(key, action)| Binding { key, action })
        .collect()
}

/// Parse a key name from the configuration into a scancode. Accepts
/// canonical names plus a closed set of aliases.
pub fn parse_key_name(name: &str) -> Option<KeyboardKey> {
    use KeyboardKey::*;
    let lower = name.trim().to_ascii_lowercase();
    let key = match lower.as_str() {
        "up" => KEY_UP,
        "down" => KEY_DOWN,
        "left" => KEY_LEFT,
        "right" => KEY_RIGHT,
        "enter" | "return" => KEY_ENTER,
        "kp_enter" | "kpenter" => KEY_KP_ENTER,
        "esc" | "escape" => KEY_ESCAPE,
        "space" => KEY_SPACE,
        "backspace" => KEY_BACKSPACE,
        "tab" => KEY_TAB,
        "lshift" | "leftshift" => KEY_LEFT_SHIFT,
        "rshift" | "rightshift" => KEY_RIGHT_SHIFT,
        "lctrl" | "leftctrl" => KEY_LEFT_CONTROL,
        "rctrl" | "rightctrl" => KEY_RIGHT_CONTROL,
        "a" => KEY_A,
        "b" => KEY_B,
        "c" => KEY_C,
        "d" => KEY_D,
        "e" => KEY_E,
        "f" => KEY_F,
        "g" => KEY_G,
        "h" => KEY_H,
        "i" => KEY_I,
        "j" => KEY_J,
        "k" => KEY_K,
        "l" => KEY_L,
        "m" => KEY_M,
        "n" => KEY_N,
        "o" => KEY_O,
        "p" => KEY_P,
        "q" => KEY_Q,
        "r" => KEY_R,
        "s" => KEY_S,
        "t" => KEY_T,
        "u" => KEY_U,
        "v" => KEY_V,
        "w" => KEY_W,
        "x" => KEY_X,
        "y" => KEY_Y,
        "z" => KEY_Z,
        "0" => KEY_ZERO,
        "1" => KEY_ONE,
        "2" => KEY_TWO,
        "3" => KEY_THREE,
        "4" => KEY_FOUR,
        "5" => KEY_FIVE,
        "6" => KEY_SIX,
        "7" => KEY_SEVEN,
        "8" => KEY_EIGHT,
        "9" => KEY_NINE,
        "f1" => KEY_F1,
        "f2" => KEY_F2,
        "f3" => KEY_F3,
        "f4" => KEY_F4,
        "f5" => KEY_F5,
        "f6" => KEY_F6,
        "f7" => KEY_F7,
        "f8" => KEY_F8,
        "f9" => KEY_F9,
        "f10" => KEY_F10,
        "f11" => KEY_F11,
        "f12" => KEY_F12,
        _ => return None,
    };
    Some(key)
}

/// Display name for a scancode, used by the settings scene and when
/// persisting rebinds. Covers the keys [`parse_key_name`] accepts.
pub fn key_name(key: KeyboardKey) -> &'static str {
    use KeyboardKey::*;
    match key {
        KEY_UP => "Up",
        KEY_DOWN => "Down",
        KEY_LEFT => "Left",
        KEY_RIGHT => "Right",
        KEY_ENTER => "Enter",
        KEY_KP_ENTER => "KP_Enter",
        KEY_ESCAPE => "Esc",
        KEY_SPACE => "Space",
        KEY_BACKSPACE => "Backspace",
        KEY_TAB => "Tab",
        KEY_LEFT_SHIFT => "LShift",
        KEY_RIGHT_SHIFT => "RShift",
        KEY_LEFT_CONTROL => "LCtrl",
        KEY_RIGHT_CONTROL => "RCtrl",
        KEY_A => "A",
        KEY_B => "B",
        KEY_C => "C",
        KEY_D => "D",
        KEY_E => "E",
        KEY_F => "F",
        KEY_G => "G",
        KEY_H => "H",
        KEY_I => "I",
        KEY_J => "J",
        KEY_K => "K",
        KEY_L => "L",
        KEY_M => "M",
        KEY_N => "N",
        KEY_O => "O",
        KEY_P => "P",
        KEY_Q => "Q",
        KEY_R => "R",
        KEY_S => "S",
        KEY_T => "T",
        KEY_U => "U",
        KEY_V => "V",
        KEY_W => "W",
        KEY_X => "X",
        KEY_Y => "Y",
        KEY_Z => "Z",
        KEY_ZERO => "0",
        KEY_ONE => "1",
        KEY_TWO => "2",
        KEY_THREE => "3",
        KEY_FOUR => "4",
        KEY_FIVE => "5",
        KEY_SIX => "6",
        KEY_SEVEN => "7",
        KEY_EIGHT => "8",
        KEY_NINE => "9",
        KEY_F1 => "F1",
        KEY_F2 => "F2",
        KEY_F3 => "F3",
        KEY_F4 => "F4",
        KEY_F5 => "F5",
        KEY_F6 => "F6",
        KEY_F7 => "F7",
        KEY_F8 => "F8",
        KEY_F9 => "F9",
        KEY_F10 => "F10",
        KEY_F11 => "F11",
        KEY_F12 => "F12",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_detection_trace() {
        // Raw trace [false, true, true, false] across four frames.
        let mut input = InputDispatcher::new();
        let trace = [false, true, true, false];
        let mut pressed_frames = Vec::new();
        let mut released_frames = Vec::new();
        for (frame, &raw) in trace.iter().enumerate() {
            input.begin_frame();
            input.set_raw(GameAction::Step, raw);
            if input.just_pressed(GameAction::Step) {
                pressed_frames.push(frame + 1);
            }
            if input.just_released(GameAction::Step) {
                released_frames.push(frame + 1);
            }
        }
        assert_eq!(pressed_frames, vec![2]);
        assert_eq!(released_frames, vec![4]);
    }

    #[test]
    fn test_held_across_frames() {
        let mut input = InputDispatcher::new();
        input.begin_frame();
        input.set_raw(GameAction::Confirm, true);
        assert!(input.held(GameAction::Confirm));
        assert!(input.just_pressed(GameAction::Confirm));
        input.begin_frame();
        input.set_raw(GameAction::Confirm, true);
        assert!(input.held(GameAction::Confirm));
        assert!(!input.just_pressed(GameAction::Confirm));
    }

    #[test]
    fn test_default_bindings_cover_all_nav() {
        let input = InputDispatcher::new();
        for action in [
            GameAction::NavUp,
            GameAction::NavDown,
            GameAction::NavLeft,
            GameAction::NavRight,
            GameAction::Confirm,
            GameAction::Cancel,
            GameAction::Step,
        ] {
            assert!(input.key_for(action).is_some(), "missing {:?}", action);
        }
    }

    #[test]
    fn test_rebind_removes_old_key_mapping() {
        let mut input = InputDispatcher::new();
        // Space starts as Step; rebinding it to Confirm must remove Step's use.
        input.rebind(GameAction::Confirm, KeyboardKey::KEY_SPACE);
        let space_actions: Vec<_> = input
            .bindings()
            .iter()
            .filter(|b| b.key == KeyboardKey::KEY_SPACE)
            .map(|b| b.action)
            .collect();
        assert_eq!(space_actions, vec![GameAction::Confirm]);
    }

    #[test]
    fn test_parse_key_name_aliases() {
        assert_eq!(parse_key_name("Esc"), Some(KeyboardKey::KEY_ESCAPE));
        assert_eq!(parse_key_name("escape"), Some(KeyboardKey::KEY_ESCAPE));
        assert_eq!(parse_key_name("Return"), Some(KeyboardKey::KEY_ENTER));
        assert_eq!(parse_key_name("f11"), Some(KeyboardKey::KEY_F11));
        assert_eq!(parse_key_name("w"), Some(KeyboardKey::KEY_W));
        assert_eq!(parse_key_name("nosuchkey"), None);
    }

    #[test]
    fn test_key_name_round_trip() {
        for name in ["Up", "Enter", "Space", "F11", "A", "9"] {
            let key = parse_key_name(name).unwrap();
            assert_eq!(key_name(key), name);
        }
    }

    #[test]
    fn test_from_config_overrides_defaults() {
        let mut keys = KeyConfig::default();
        keys.action = "Space".to_string();
        let input = InputDispatcher::from_config(&keys);
        let space_actions: Vec<_> = input
            .bindings()
            .iter()
            .filter(|b| b.key == KeyboardKey::KEY_SPACE)
            .map(|b| b.action)
            .collect();
        assert_eq!(space_actions, vec![GameAction::Confirm]);
    }
}
