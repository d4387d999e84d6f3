//! World-space geometry of the grid, used only to derive cell anchors.

use glam::Vec2;
use grid_pursuit_core::CellCoord;
use serde::{Deserialize, Serialize};

const DEFAULT_TILE_SIZE: f32 = 1.0;
const DEFAULT_TILE_SPACING: f32 = 0.1;

/// Square tiles laid out on the ground plane and centred on `origin`.
///
/// Anchors are opaque to the simulation: they are handed to the presentation
/// layer and used as interpolation targets, never for walkability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Edge length of a tile in world units.
    pub tile_size: f32,
    /// Gap between neighbouring tiles in world units.
    pub tile_spacing: f32,
    /// World-space centre of the whole grid.
    #[serde(with = "vec2_array")]
    pub origin: Vec2,
}

impl GridLayout {
    /// Centre of `cell` for a grid of `width` x `height` tiles.
    #[must_use]
    pub fn anchor(&self, cell: CellCoord, width: u32, height: u32) -> Vec2 {
        let pitch = self.tile_size + self.tile_spacing;
        let extent = Vec2::new(self.span(width), self.span(height));
        let start = self.origin - extent / 2.0;
        start
            + Vec2::new(cell.x() as f32, cell.y() as f32) * pitch
            + Vec2::splat(self.tile_size / 2.0)
    }

    fn span(&self, tiles: u32) -> f32 {
        if tiles == 0 {
            return 0.0;
        }
        tiles as f32 * self.tile_size + (tiles - 1) as f32 * self.tile_spacing
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            tile_spacing: DEFAULT_TILE_SPACING,
            origin: Vec2::ZERO,
        }
    }
}

mod vec2_array {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        value.to_array().serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        <[f32; 2]>::deserialize(deserializer).map(Vec2::from_array)
    }
}
