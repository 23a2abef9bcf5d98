//! Game configuration.
//!
//! Settings are loaded once at startup from an INI file into an immutable
//! snapshot that components consult through the game context. The settings
//! scene produces a new snapshot when keys are rebound and writes it back
//! through [`GameConfig::save_to_file`].
//!
//! # Configuration File Format
//!
//! ```ini
//! [display]
//! width = 932
//! height = 932
//! title = Digivice
//! fullscreen = false
//!
//! [display.scaling]
//! sprites = 1.0
//! ui = 1.0
//! text = 1.0
//! environments = 1.0
//! effects = 1.0
//!
//! [ui]
//! textscale = 1.0
//!
//! [graphics]
//! assetscale = 1.0
//!
//! [input]
//! movekey.up = Up
//! movekey.down = Down
//! movekey.left = Left
//! movekey.right = Right
//! actionkey = Enter
//! backkey = Esc
//! menukey = M
//! togglescreenkey = F11
//! ```

use configparser::ini::Ini;
use log::{error, info};
use std::path::PathBuf;

/// Fixed logical render resolution. Everything is drawn at this size and
/// scaled to the window with nearest-neighbor filtering.
pub const LOGICAL_WIDTH: u32 = 466;
pub const LOGICAL_HEIGHT: u32 = 466;

const DEFAULT_WINDOW_WIDTH: u32 = 932;
const DEFAULT_WINDOW_HEIGHT: u32 = 932;
const DEFAULT_TITLE: &str = "Digivice";
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Per-category scale multipliers applied on top of the logical resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingConfig {
    pub sprites: f32,
    pub ui: f32,
    pub text: f32,
    pub environments: f32,
    pub effects: f32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            sprites: 1.0,
            ui: 1.0,
            text: 1.0,
            environments: 1.0,
            effects: 1.0,
        }
    }
}

/// Key-name bindings as read from the configuration file. Names are parsed
/// into scancodes by the input dispatcher at init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub move_up: String,
    pub move_down: String,
    pub move_left: String,
    pub move_right: String,
    pub action: String,
    pub back: String,
    pub menu: String,
    pub toggle_screen: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            move_up: "Up".to_string(),
            move_down: "Down".to_string(),
            move_left: "Left".to_string(),
            move_right: "Right".to_string(),
            action: "Enter".to_string(),
            back: "Esc".to_string(),
            menu: "M".to_string(),
            toggle_screen: "F11".to_string(),
        }
    }
}

/// Process-wide configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    pub fullscreen: bool,
    pub scaling: ScalingConfig,
    pub text_scale: f32,
    pub asset_scale: f32,
    pub keys: KeyConfig,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            title: DEFAULT_TITLE.to_string(),
            fullscreen: DEFAULT_FULLSCREEN,
            scaling: ScalingConfig::default(),
            text_scale: 1.0,
            asset_scale: 1.0,
            keys: KeyConfig::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values. Returns an
    /// error only when the file cannot be read or parsed at all; individual
    /// malformed values fall back to defaults.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config);
        info!(
            "Loaded config: {}x{} window, title={:?}, fullscreen={}",
            self.window_width, self.window_height, self.title, self.fullscreen
        );
        Ok(())
    }

    /// Parse configuration out of an already-loaded INI document.
    fn apply_ini(&mut self, config: &Ini) {
        // [display] section
        if let Some(width) = config.getuint("display", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("display", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(title) = config.get("display", "title") {
            self.title = title;
        }
        if let Some(fullscreen) = config.getbool("display", "fullscreen").ok().flatten() {
            self.fullscreen = fullscreen;
        }

        // [display.scaling] section
        let mut scale = |key: &str, slot: &mut f32| {
            match config.getfloat("display.scaling", key) {
                Ok(Some(v)) if v > 0.0 => *slot = v as f32,
                Ok(Some(v)) => error!("Ignoring non-positive scaling.{}: {}", key, v),
                Ok(None) => {}
                Err(e) => error!("Bad value for scaling.{}: {}", key, e),
            }
        };
        let mut scaling = self.scaling;
        scale("sprites", &mut scaling.sprites);
        scale("ui", &mut scaling.ui);
        scale("text", &mut scaling.text);
        scale("environments", &mut scaling.environments);
        scale("effects", &mut scaling.effects);
        self.scaling = scaling;

        // [ui] and [graphics] sections
        if let Some(v) = config.getfloat("ui", "textscale").ok().flatten() {
            if v > 0.0 {
                self.text_scale = v as f32;
            }
        }
        if let Some(v) = config.getfloat("graphics", "assetscale").ok().flatten() {
            if v > 0.0 {
                self.asset_scale = v as f32;
            }
        }

        // [input] section
        let mut key = |name: &str, slot: &mut String| {
            if let Some(v) = config.get("input", name) {
                *slot = v;
            }
        };
        key("movekey.up", &mut self.keys.move_up);
        key("movekey.down", &mut self.keys.move_down);
        key("movekey.left", &mut self.keys.move_left);
        key("movekey.right", &mut self.keys.move_right);
        key("actionkey", &mut self.keys.action);
        key("backkey", &mut self.keys.back);
        key("menukey", &mut self.keys.menu);
        key("togglescreenkey", &mut self.keys.toggle_screen);
    }

    /// Save configuration to the INI file. Creates the file if missing.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("display", "width", Some(self.window_width.to_string()));
        config.set("display", "height", Some(self.window_height.to_string()));
        config.set("display", "title", Some(self.title.clone()));
        config.set("display", "fullscreen", Some(self.fullscreen.to_string()));

        config.set("display.scaling", "sprites", Some(self.scaling.sprites.to_string()));
        config.set("display.scaling", "ui", Some(self.scaling.ui.to_string()));
        config.set("display.scaling", "text", Some(self.scaling.text.to_string()));
        config.set(
            "display.scaling",
            "environments",
            Some(self.scaling.environments.to_string()),
        );
        config.set("display.scaling", "effects", Some(self.scaling.effects.to_string()));

        config.set("ui", "textscale", Some(self.text_scale.to_string()));
        config.set("graphics", "assetscale", Some(self.asset_scale.to_string()));

        config.set("input", "movekey.up", Some(self.keys.move_up.clone()));
        config.set("input", "movekey.down", Some(self.keys.move_down.clone()));
        config.set("input", "movekey.left", Some(self.keys.move_left.clone()));
        config.set("input", "movekey.right", Some(self.keys.move_right.clone()));
        config.set("input", "actionkey", Some(self.keys.action.clone()));
        config.set("input", "backkey", Some(self.keys.back.clone()));
        config.set("input", "menukey", Some(self.keys.menu.clone()));
        config.set("input", "togglescreenkey", Some(self.keys.toggle_screen.clone()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;
        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    /// Window size as a tuple.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
