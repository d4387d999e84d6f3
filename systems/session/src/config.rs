//! Session configuration.

use grid_pursuit_core::{CellCoord, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};
use grid_pursuit_system_movement::MovementProfile;
use grid_pursuit_world::GridLayout;
use serde::Deserialize;

const CONTROLLED_START: CellCoord = CellCoord::new(5, 0);
const PURSUER_START: CellCoord = CellCoord::new(4, 9);
const CONTROLLED_SPEED: f32 = 5.0;
const PURSUER_SPEED: f32 = 4.0;

/// Everything needed to build a [`crate::Session`].
///
/// Every field has a default, so partial TOML documents are accepted.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// World geometry of the tiles.
    pub layout: GridLayout,
    /// Cell the controlled entity starts on.
    pub controlled_start: CellCoord,
    /// Cell the pursuer starts on.
    pub pursuer_start: CellCoord,
    /// Travel parameters of the controlled entity.
    pub controlled: MovementProfile,
    /// Travel parameters of the pursuer.
    pub pursuer: MovementProfile,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            layout: GridLayout::default(),
            controlled_start: CONTROLLED_START,
            pursuer_start: PURSUER_START,
            controlled: MovementProfile::with_speed(CONTROLLED_SPEED),
            pursuer: MovementProfile::with_speed(PURSUER_SPEED),
        }
    }
}
