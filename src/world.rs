//! World graph data.
//!
//! A finite list of continents, each a list of explorable nodes. The graph
//! is hand-authored; the builder below produces the File Island prototype.

/// One parallax scrolling band of a node's adventure environment.
///
/// `texture_paths` is the legacy explicit variant list; it is ignored
/// whenever the environment name resolves through the variant selector.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayerData {
    pub texture_paths: Vec<String>,
    pub parallax_factor_x: f32,
    pub parallax_factor_y: f32,
}

impl BackgroundLayerData {
    pub fn new(paths: Vec<String>, px: f32, py: f32) -> Self {
        Self {
            texture_paths: paths,
            parallax_factor_x: px,
            parallax_factor_y: py,
        }
    }
}

/// A reachable location on a continent map.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub continent_id: String,
    /// Environment name feeding the background variant selector.
    pub environment: String,
    pub map_position: (f32, f32),
    pub unlocked_sprite_id: String,
    pub boss_sprite_id: String,
    pub total_steps: u32,
    /// Foreground, middleground, background. Legacy layer data; see
    /// [`BackgroundLayerData`].
    pub adventure_layers: Vec<BackgroundLayerData>,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinentData {
    pub id: String,
    pub name: String,
    pub map_image_id: String,
    pub nodes: Vec<NodeData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldGraph {
    pub continents: Vec<ContinentData>,
}

impl WorldGraph {
    pub fn continent(&self, id: &str) -> Option<&ContinentData> {
        self.continents.iter().find(|c| c.id == id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.continents
            .iter()
            .flat_map(|c| c.nodes.iter())
            .find(|n| n.id == id)
    }

    /// The hand-authored prototype world: File Island with six nodes.
    pub fn file_island_prototype() -> Self {
        let continent_id = "file_island";
        let mut nodes = Vec::new();
        // (env name, display name, map position, steps, unlocked)
        // Only the starting node begins unlocked.
        let specs: [(&str, &str, (f32, f32), u32, bool); 6] = [
            ("tropicaljungle", "TROPICAL JUNGLE", (96.0, 310.0), 400, true),
            ("lake", "LAKE", (190.0, 250.0), 450, false),
            ("gearsavannah", "GEAR SAVANNAH", (300.0, 280.0), 500, false),
            ("factorialtown", "FACTORIAL TOWN", (350.0, 180.0), 550, false),
            ("toytown", "TOY TOWN", (250.0, 120.0), 600, false),
            ("infinitymountain", "INFINITY MOUNTAIN", (180.0, 60.0), 700, false),
        ];
        for (env, name, pos, steps, unlocked) in specs {
            nodes.push(NodeData {
                id: format!("{}_{}", continent_id, env),
                name: name.to_string(),
                continent_id: continent_id.to_string(),
                environment: env.to_string(),
                map_position: pos,
                unlocked_sprite_id: "assets/ui/maps/node_icon.png".to_string(),
                boss_sprite_id: format!("assets/sprites/boss_{}.png", env),
                total_steps: steps,
                adventure_layers: vec![
                    BackgroundLayerData::new(Vec::new(), 0.5, 0.0),
                    BackgroundLayerData::new(Vec::new(), 0.25, 0.0),
                    BackgroundLayerData::new(Vec::new(), 0.1, 0.0),
                ],
                unlocked,
            });
        }
        WorldGraph {
            continents: vec![ContinentData {
                id: continent_id.to_string(),
                name: "File Island".to_string(),
                map_image_id: format!("assets/ui/maps/{}_map.png", continent_id),
                nodes,
            }],
        }
    }
}
