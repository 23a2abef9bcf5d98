//! Shared game context.
//!
//! Scenes receive a bundle of non-owning references to the process-wide
//! services at every call instead of holding back-pointers into a game
//! aggregate. The bundle is rebuilt by the frame loop for each phase, so
//! no scene can retain a reference across frames.

use crate::config::GameConfig;
use crate::gfx::atlas::AtlasRegistry;
use crate::gfx::texture_cache::TextureCache;
use crate::gfx::variants::VariantSelector;
use crate::input::InputDispatcher;
use crate::player::PlayerData;
use crate::report::ErrorReporter;
use crate::scenes::SceneRequests;
use crate::world::WorldGraph;

pub struct GameContext<'a> {
    pub textures: &'a mut TextureCache,
    pub atlas: &'a mut AtlasRegistry,
    pub input: &'a mut InputDispatcher,
    pub player: &'a mut PlayerData,
    pub world: &'a WorldGraph,
    pub config: &'a mut GameConfig,
    pub variants: &'a mut VariantSelector,
    pub reporter: &'a mut ErrorReporter,
    pub requests: &'a mut SceneRequests,
}

/// Owned service set from which a [`GameContext`] is borrowed per phase.
pub struct Services {
    pub textures: TextureCache,
    pub atlas: AtlasRegistry,
    pub input: InputDispatcher,
    pub player: PlayerData,
    pub world: WorldGraph,
    pub config: GameConfig,
    pub variants: VariantSelector,
    pub reporter: ErrorReporter,
    pub requests: SceneRequests,
}

impl Services {
    pub fn new(config: GameConfig, world: WorldGraph) -> Self {
        let input = InputDispatcher::from_config(&config.keys);
        Self {
            textures: TextureCache::new(),
            atlas: AtlasRegistry::new(),
            input,
            player: PlayerData::new(),
            world,
            config,
            variants: VariantSelector::new(),
            reporter: ErrorReporter::new(),
            requests: SceneRequests::new(),
        }
    }

    pub fn ctx(&mut self) -> GameContext<'_> {
        GameContext {
            textures: &mut self.textures,
            atlas: &mut self.atlas,
            input: &mut self.input,
            player: &mut self.player,
            world: &self.world,
            config: &mut self.config,
            variants: &mut self.variants,
            reporter: &mut self.reporter,
            requests: &mut self.requests,
        }
    }
}
