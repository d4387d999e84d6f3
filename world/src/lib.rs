#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for Grid Pursuit.
//!
//! [`Grid`] owns every cell: its obstacle flag and its occupant. It is the
//! single source of truth for walkability. Entities only cache their own
//! position, which movement executors keep in sync with the occupant layer.

mod layout;

use std::fmt;

use glam::Vec2;
use grid_pursuit_core::{
    CellCoord, EntityId, GridError, LayoutError, ObstacleLayout, Walkability, DEFAULT_GRID_HEIGHT,
    DEFAULT_GRID_WIDTH,
};
use tracing::debug;

pub use layout::GridLayout;

/// Fixed-size square-cell grid holding obstacles and occupants.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    layout: GridLayout,
    obstacles: Vec<bool>,
    occupants: Vec<Option<EntityId>>,
}

impl Grid {
    /// Creates an empty grid with the default world layout.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_layout(width, height, GridLayout::default())
    }

    /// Creates an empty grid whose cells are anchored by `layout`.
    #[must_use]
    pub fn with_layout(width: u32, height: u32, layout: GridLayout) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            layout,
            obstacles: vec![false; capacity],
            occupants: vec![None; capacity],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World geometry used to derive cell anchors.
    #[must_use]
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Reports whether `cell` lies within the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Reads the obstacle flag of `cell`.
    pub fn get_obstacle(&self, cell: CellCoord) -> Result<bool, GridError> {
        let index = self.checked_index(cell)?;
        Ok(self.obstacles[index])
    }

    /// Sets the obstacle flag of `cell`.
    ///
    /// Paths already committed by movement executors are not re-validated.
    pub fn set_obstacle(&mut self, cell: CellCoord, obstacle: bool) -> Result<(), GridError> {
        let index = self.checked_index(cell)?;
        self.obstacles[index] = obstacle;
        debug!(x = cell.x(), y = cell.y(), obstacle, "obstacle flag updated");
        Ok(())
    }

    /// Resets every obstacle flag. Occupants are untouched.
    pub fn clear_all_obstacles(&mut self) {
        self.obstacles.fill(false);
    }

    /// Reports whether an entity may step onto `cell`.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(false, |index| !self.obstacles[index] && self.occupants[index].is_none())
    }

    /// Entity recorded as standing on `cell`, if any. Out-of-range cells read as empty.
    #[must_use]
    pub fn get_occupant(&self, cell: CellCoord) -> Option<EntityId> {
        self.index(cell).and_then(|index| self.occupants[index])
    }

    /// Overwrites the occupant of `cell` unconditionally.
    ///
    /// Callers must guarantee a single writer per cell per tick.
    pub fn set_occupant(
        &mut self,
        cell: CellCoord,
        occupant: Option<EntityId>,
    ) -> Result<(), GridError> {
        let index = self.checked_index(cell)?;
        self.occupants[index] = occupant;
        Ok(())
    }

    /// Moves `entity` from `from` to `to` in one step.
    ///
    /// Both coordinates are validated before either cell is written, so the
    /// occupant layer never observes a half-finished transfer.
    pub fn transfer_occupant(
        &mut self,
        entity: EntityId,
        from: CellCoord,
        to: CellCoord,
    ) -> Result<(), GridError> {
        let from_index = self.checked_index(from)?;
        let to_index = self.checked_index(to)?;
        self.occupants[from_index] = None;
        self.occupants[to_index] = Some(entity);
        Ok(())
    }

    /// Cells whose occupant names `entity`, in row-major order.
    pub fn cells_occupied_by(&self, entity: EntityId) -> impl Iterator<Item = CellCoord> + '_ {
        let width = self.width;
        self.occupants
            .iter()
            .enumerate()
            .filter(move |(_, occupant)| **occupant == Some(entity))
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % width, index / width))
            })
    }

    /// World-space anchor of `cell` on the ground plane.
    pub fn world_anchor(&self, cell: CellCoord) -> Result<Vec2, GridError> {
        let _ = self.checked_index(cell)?;
        Ok(self.layout.anchor(cell, self.width, self.height))
    }

    /// Hover/info description of `cell`.
    pub fn describe_cell(&self, cell: CellCoord) -> Result<CellDescription, GridError> {
        let index = self.checked_index(cell)?;
        Ok(CellDescription {
            cell,
            world_anchor: self.layout.anchor(cell, self.width, self.height),
            has_obstacle: self.obstacles[index],
        })
    }

    /// Exports the obstacle layer as a flat row-major layout.
    #[must_use]
    pub fn obstacle_layout(&self) -> ObstacleLayout {
        ObstacleLayout::from_cells(self.width, self.height, self.obstacles.clone())
            .unwrap_or_else(|_| ObstacleLayout::empty(self.width, self.height))
    }

    /// Replaces the obstacle layer with `layout`, returning the number of blocked cells.
    pub fn load_obstacles(&mut self, layout: &ObstacleLayout) -> Result<usize, LayoutError> {
        if layout.width() != self.width || layout.height() != self.height {
            return Err(LayoutError::DimensionMismatch {
                layout_width: layout.width(),
                layout_height: layout.height(),
                grid_width: self.width,
                grid_height: self.height,
            });
        }

        if layout.cells().len() != self.obstacles.len() {
            return Err(LayoutError::CellCountMismatch {
                width: layout.width(),
                height: layout.height(),
                expected: self.obstacles.len(),
                actual: layout.cells().len(),
            });
        }

        self.obstacles.copy_from_slice(layout.cells());
        Ok(layout.blocked_count())
    }

    fn checked_index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.index(cell).ok_or(GridError::out_of_range(cell))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.width && cell.y() < self.height {
            let row = usize::try_from(cell.y()).ok()?;
            let column = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT)
    }
}

impl Walkability for Grid {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_walkable(&self, cell: CellCoord) -> bool {
        Grid::is_walkable(self, cell)
    }
}

/// Information about a single cell intended for hover displays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellDescription {
    /// Coordinates of the described cell.
    pub cell: CellCoord,
    /// World-space anchor of the cell.
    pub world_anchor: Vec2,
    /// Whether the cell blocks movement.
    pub has_obstacle: bool,
}

impl fmt::Display for CellDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid Position: ({}, {})", self.cell.x(), self.cell.y())?;
        writeln!(
            f,
            "World Position: ({:.2}, {:.2})",
            self.world_anchor.x, self.world_anchor.y
        )?;
        write!(
            f,
            "Obstacle: {}",
            if self.has_obstacle { "Yes" } else { "No" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_is_ten_by_ten() {
        let grid = Grid::default();
        assert_eq!((grid.width(), grid.height()), (10, 10));
        assert!(grid.in_bounds(CellCoord::new(9, 9)));
        assert!(!grid.in_bounds(CellCoord::new(10, 0)));
        assert!(!grid.in_bounds(CellCoord::new(0, 10)));
    }

    #[test]
    fn obstacle_access_rejects_out_of_range_cells() {
        let mut grid = Grid::new(3, 3);
        let outside = CellCoord::new(3, 1);

        assert_eq!(
            grid.get_obstacle(outside),
            Err(GridError::OutOfRange { x: 3, y: 1 })
        );
        assert_eq!(
            grid.set_obstacle(outside, true),
            Err(GridError::OutOfRange { x: 3, y: 1 })
        );
    }

    #[test]
    fn walkability_accounts_for_obstacles_and_occupants() {
        let mut grid = Grid::new(3, 3);
        let blocked = CellCoord::new(1, 1);
        let occupied = CellCoord::new(2, 2);

        grid.set_obstacle(blocked, true).expect("in range");
        grid.set_occupant(occupied, Some(EntityId::new(7)))
            .expect("in range");

        assert!(!grid.is_walkable(blocked));
        assert!(!grid.is_walkable(occupied));
        assert!(grid.is_walkable(CellCoord::new(0, 0)));
        assert!(!grid.is_walkable(CellCoord::new(5, 5)));
    }

    #[test]
    fn clear_all_obstacles_keeps_occupants() {
        let mut grid = Grid::new(4, 4);
        let cell = CellCoord::new(2, 1);
        grid.set_obstacle(cell, true).expect("in range");
        grid.set_occupant(CellCoord::new(0, 0), Some(EntityId::new(1)))
            .expect("in range");

        grid.clear_all_obstacles();

        assert_eq!(grid.get_obstacle(cell), Ok(false));
        assert_eq!(
            grid.get_occupant(CellCoord::new(0, 0)),
            Some(EntityId::new(1))
        );
    }

    #[test]
    fn transfer_occupant_moves_single_entry() {
        let mut grid = Grid::new(3, 3);
        let entity = EntityId::new(4);
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(0, 1);
        grid.set_occupant(from, Some(entity)).expect("in range");

        grid.transfer_occupant(entity, from, to).expect("in range");

        assert_eq!(grid.get_occupant(from), None);
        assert_eq!(grid.cells_occupied_by(entity).collect::<Vec<_>>(), vec![to]);
    }

    #[test]
    fn transfer_occupant_out_of_range_leaves_grid_untouched() {
        let mut grid = Grid::new(3, 3);
        let entity = EntityId::new(4);
        let from = CellCoord::new(2, 2);
        grid.set_occupant(from, Some(entity)).expect("in range");

        let result = grid.transfer_occupant(entity, from, CellCoord::new(3, 2));

        assert!(result.is_err());
        assert_eq!(grid.get_occupant(from), Some(entity));
    }

    #[test]
    fn load_obstacles_requires_matching_dimensions() {
        let mut grid = Grid::new(4, 4);
        let mut layout = ObstacleLayout::empty(4, 4);
        layout
            .set_obstacle(CellCoord::new(3, 0), true)
            .expect("in range");

        assert_eq!(grid.load_obstacles(&layout), Ok(1));
        assert_eq!(grid.get_obstacle(CellCoord::new(3, 0)), Ok(true));
        assert_eq!(grid.obstacle_layout(), layout);

        let mismatched = ObstacleLayout::empty(5, 4);
        assert!(matches!(
            grid.load_obstacles(&mismatched),
            Err(LayoutError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn describe_cell_reports_obstacle_and_anchor() {
        let mut grid = Grid::new(10, 10);
        let cell = CellCoord::new(3, 4);
        grid.set_obstacle(cell, true).expect("in range");

        let description = grid.describe_cell(cell).expect("in range");

        assert_eq!(description.cell, cell);
        assert!(description.has_obstacle);
        assert_eq!(Ok(description.world_anchor), grid.world_anchor(cell));
        let text = description.to_string();
        assert!(text.starts_with("Grid Position: (3, 4)"));
        assert!(text.ends_with("Obstacle: Yes"));
    }
}
