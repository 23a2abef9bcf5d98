//! Player data.
//!
//! One instance for the process, mutated only by the adventure and map
//! scenes. Holds the current partner, step counters, and a snapshot of the
//! node the player is exploring.

use crate::world::NodeData;

pub const DEFAULT_PARTNER: &str = "agumon";

/// The eight selectable partners, in selector order.
pub const PARTNER_IDS: [&str; 8] = [
    "agumon", "gabumon", "biyomon", "tentomon", "palmon", "gomamon", "patamon", "gatomon",
];

#[derive(Debug, Clone)]
pub struct PlayerData {
    pub partner_id: String,
    pub steps_this_chapter: u32,
    pub total_steps: u32,
    pub step_goal: u32,
    pub current_node_id: String,
    pub current_node: Option<NodeData>,
}

impl PlayerData {
    pub fn new() -> Self {
        Self {
            partner_id: DEFAULT_PARTNER.to_string(),
            steps_this_chapter: 0,
            total_steps: 0,
            step_goal: 0,
            current_node_id: String::new(),
            current_node: None,
        }
    }

    /// Select the node the player will explore. Resets chapter progress and
    /// derives the step goal from the node's requirement.
    pub fn set_current_node(&mut self, node: &NodeData) {
        self.current_node_id = node.id.clone();
        self.step_goal = node.total_steps;
        self.steps_this_chapter = 0;
        self.current_node = Some(node.clone());
    }

    /// Record one completed walk cycle.
    pub fn add_step(&mut self) {
        self.steps_this_chapter += 1;
        self.total_steps += 1;
    }

    /// Whether the chapter goal has been reached.
    pub fn goal_reached(&self) -> bool {
        self.step_goal > 0 && self.steps_this_chapter >= self.step_goal
    }
}

impl Default for PlayerData {
    fn default() -> Self {
        Self::new()
    }
}
