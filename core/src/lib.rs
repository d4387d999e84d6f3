#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Pursuit engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid, and the movement systems. Adapters submit [`Command`]
//! values describing desired mutations, the session executes those commands,
//! and then broadcasts [`Event`] values for systems to react to
//! deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of grid columns.
pub const DEFAULT_GRID_WIDTH: u32 = 10;
/// Default number of grid rows.
pub const DEFAULT_GRID_HEIGHT: u32 = 10;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an entity walk to the provided target cell.
    RequestMove {
        /// Entity asked to move.
        entity: EntityId,
        /// Cell the entity should end up on.
        target: CellCoord,
    },
    /// Cancels the entity's in-flight path, leaving it on its last confirmed cell.
    Stop {
        /// Entity whose movement should halt.
        entity: EntityId,
    },
    /// Teleports an entity onto the provided cell, cancelling any movement.
    Place {
        /// Entity being placed.
        entity: EntityId,
        /// Destination cell.
        cell: CellCoord,
    },
    /// Stops the controlled entity and returns it to the origin cell.
    ResetControlled,
    /// Sets or clears the obstacle flag of a single cell.
    SetObstacle {
        /// Cell whose flag changes.
        cell: CellCoord,
        /// Whether the cell should block movement.
        obstacle: bool,
    },
    /// Clears every obstacle flag without touching occupants.
    ClearObstacles,
    /// Replaces the whole obstacle layer with the provided layout.
    LoadObstacles {
        /// Row-major obstacle layout matching the grid dimensions.
        layout: ObstacleLayout,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an entity was placed directly onto a cell.
    EntityPlaced {
        /// Entity that was placed.
        entity: EntityId,
        /// Cell the entity now occupies.
        cell: CellCoord,
    },
    /// Confirms that an entity committed to a path.
    MoveStarted {
        /// Entity that started moving.
        entity: EntityId,
        /// Cell the entity departed from.
        from: CellCoord,
        /// Final cell of the committed path.
        target: CellCoord,
        /// Number of cell transitions the path requires.
        steps: usize,
    },
    /// Confirms that an entity transferred its occupancy between two cells.
    EntityAdvanced {
        /// Entity that advanced.
        entity: EntityId,
        /// Cell the entity occupied before the transition.
        from: CellCoord,
        /// Cell the entity occupies after the transition.
        to: CellCoord,
    },
    /// Announces that an entity exhausted its path and is idle again.
    MoveCompleted {
        /// Entity that settled.
        entity: EntityId,
        /// Cell the entity settled on.
        cell: CellCoord,
    },
    /// Announces that an entity's path was discarded before completion.
    MoveStopped {
        /// Entity that stopped.
        entity: EntityId,
        /// Last confirmed cell of the entity.
        cell: CellCoord,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Entity targeted by the request.
        entity: EntityId,
        /// Cell the request asked for.
        target: CellCoord,
        /// Specific reason the request failed.
        reason: MoveError,
    },
    /// Confirms that a cell's obstacle flag changed.
    ObstacleChanged {
        /// Cell whose flag changed.
        cell: CellCoord,
        /// New obstacle flag.
        obstacle: bool,
    },
    /// Confirms that every obstacle flag was reset.
    ObstaclesCleared,
    /// Confirms that a new obstacle layout was loaded.
    ObstaclesLoaded {
        /// Number of blocked cells in the loaded layout.
        blocked: usize,
    },
    /// Reports that a grid-level command was rejected.
    CommandRejected {
        /// Specific reason the command failed.
        reason: GridError,
    },
    /// Reports that an obstacle layout could not be loaded.
    LayoutRejected {
        /// Specific reason the layout was refused.
        reason: LayoutError,
    },
}

/// Location of a single grid cell expressed as `x` and `y` coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent_to(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Cell one step away in `direction`, if it stays within `width` x `height`.
    #[must_use]
    pub fn step(self, direction: Direction, width: u32, height: u32) -> Option<CellCoord> {
        let (x, y) = match direction {
            Direction::North => (Some(self.x), self.y.checked_add(1)),
            Direction::South => (Some(self.x), self.y.checked_sub(1)),
            Direction::West => (self.x.checked_sub(1), Some(self.y)),
            Direction::East => (self.x.checked_add(1), Some(self.y)),
        };
        let (x, y) = (x?, y?);
        (x < width && y < height).then_some(CellCoord::new(x, y))
    }
}

/// Cardinal movement directions available to entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing `y`.
    North,
    /// Movement toward decreasing `y`.
    South,
    /// Movement toward decreasing `x`.
    West,
    /// Movement toward increasing `x`.
    East,
}

impl Direction {
    /// Neighbor enumeration order shared by search and pursuit.
    ///
    /// Every tie between equally good cells is broken by this order, so
    /// changing it changes which paths and approach cells are selected.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Direction of a single orthogonal step between two adjacent cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Direction> {
        if !from.is_adjacent_to(to) {
            return None;
        }

        if to.y() > from.y() {
            Some(Direction::North)
        } else if to.y() < from.y() {
            Some(Direction::South)
        } else if to.x() < from.x() {
            Some(Direction::West)
        } else {
            Some(Direction::East)
        }
    }
}

/// Unique identifier assigned to an entity standing on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Phase of an entity's move-execution state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementPhase {
    /// No path is in flight.
    #[default]
    Idle,
    /// The entity is walking along a committed path.
    Moving,
}

/// Result of advancing a movement state machine by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The entity is still travelling toward its next cell.
    StillMoving,
    /// The entity completed a cell transition during this tick.
    Arrived {
        /// Cell the entity left.
        from: CellCoord,
        /// Cell the entity now occupies.
        to: CellCoord,
    },
    /// The entity had no path in flight.
    Idle,
}

/// Outcome of a shortest-path query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathResult {
    /// Ordered cells from the start to the target, both inclusive.
    Found(Vec<CellCoord>),
    /// The search exhausted the reachable cells without meeting the target.
    NotFound,
}

impl PathResult {
    /// Reports whether a path was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Cells of the path, if one was found.
    #[must_use]
    pub fn cells(&self) -> Option<&[CellCoord]> {
        match self {
            Self::Found(cells) => Some(cells),
            Self::NotFound => None,
        }
    }

    /// Consumes the result, yielding the path cells if one was found.
    #[must_use]
    pub fn into_cells(self) -> Option<Vec<CellCoord>> {
        match self {
            Self::Found(cells) => Some(cells),
            Self::NotFound => None,
        }
    }
}

/// Read-only walkability source consumed by path searches.
pub trait Walkability {
    /// Width and height of the grid in cells.
    fn dimensions(&self) -> (u32, u32);

    /// Reports whether an entity may step onto `cell`.
    ///
    /// Out-of-bounds cells are never walkable.
    fn is_walkable(&self, cell: CellCoord) -> bool;

    /// Reports whether `cell` lies within the grid.
    fn in_bounds(&self, cell: CellCoord) -> bool {
        let (width, height) = self.dimensions();
        cell.x() < width && cell.y() < height
    }
}

/// Immutable representation of a single entity's movement state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Grid cell currently occupied by the entity.
    pub cell: CellCoord,
    /// Current phase of the entity's movement state machine.
    pub phase: MovementPhase,
}

/// Reasons a grid access may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum GridError {
    /// The coordinate lies outside the configured grid.
    #[error("cell ({x}, {y}) lies outside the grid")]
    OutOfRange {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// The cell holds an obstacle or another entity.
    #[error("cell ({x}, {y}) is blocked")]
    Blocked {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
}

impl GridError {
    /// Builds an out-of-range error for the provided cell.
    #[must_use]
    pub const fn out_of_range(cell: CellCoord) -> Self {
        Self::OutOfRange {
            x: cell.x(),
            y: cell.y(),
        }
    }

    /// Builds a blocked-cell error for the provided cell.
    #[must_use]
    pub const fn blocked(cell: CellCoord) -> Self {
        Self::Blocked {
            x: cell.x(),
            y: cell.y(),
        }
    }
}

/// Reasons a move request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum MoveError {
    /// The entity is already walking a path.
    #[error("entity is already moving")]
    Busy,
    /// No path reaches the target; blocked targets are reported here too.
    #[error("no path reaches the target")]
    NoPath,
    /// The target coordinate lies outside the grid.
    #[error(transparent)]
    OutOfRange(#[from] GridError),
    /// The session does not know the requested entity.
    #[error("unknown entity {}", .0.get())]
    UnknownEntity(EntityId),
}

/// Reasons an obstacle layout may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The flat cell array does not match `width * height`.
    #[error("layout holds {actual} cells but {width}x{height} requires {expected}")]
    CellCountMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Cells required by the declared dimensions.
        expected: usize,
        /// Cells actually supplied.
        actual: usize,
    },
    /// The layout dimensions differ from the grid it is loaded into.
    #[error("layout is {layout_width}x{layout_height} but the grid is {grid_width}x{grid_height}")]
    DimensionMismatch {
        /// Width of the layout.
        layout_width: u32,
        /// Height of the layout.
        layout_height: u32,
        /// Width of the grid.
        grid_width: u32,
        /// Height of the grid.
        grid_height: u32,
    },
}

/// Persisted obstacle layer: row-major flags indexed by `y * width + x`.
///
/// Deserialization goes through [`ObstacleLayout::from_cells`], so a decoded
/// layout always holds exactly `width * height` flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredObstacleLayout")]
pub struct ObstacleLayout {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

#[derive(Deserialize)]
struct StoredObstacleLayout {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl TryFrom<StoredObstacleLayout> for ObstacleLayout {
    type Error = LayoutError;

    fn try_from(stored: StoredObstacleLayout) -> Result<Self, Self::Error> {
        Self::from_cells(stored.width, stored.height, stored.cells)
    }
}

impl ObstacleLayout {
    /// Creates an obstacle-free layout with the provided dimensions.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; cell_count(width, height)],
        }
    }

    /// Wraps an existing flat flag array, validating its length.
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Result<Self, LayoutError> {
        let expected = cell_count(width, height);
        if cells.len() != expected {
            return Err(LayoutError::CellCountMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Width of the layout in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the layout in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major obstacle flags.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Reports whether `cell` is blocked. Out-of-range cells read as free.
    #[must_use]
    pub fn has_obstacle(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Sets the obstacle flag of `cell`.
    pub fn set_obstacle(&mut self, cell: CellCoord, obstacle: bool) -> Result<(), GridError> {
        let flag = self
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
            .ok_or(GridError::out_of_range(cell))?;
        *flag = obstacle;
        Ok(())
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|blocked| **blocked).count()
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

fn cell_count(width: u32, height: u32) -> usize {
    usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, LayoutError, ObstacleLayout};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_respects_grid_bounds() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(
            corner.step(Direction::North, 3, 3),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(corner.step(Direction::South, 3, 3), None);
        assert_eq!(corner.step(Direction::West, 3, 3), None);
        assert_eq!(
            corner.step(Direction::East, 3, 3),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(CellCoord::new(2, 2).step(Direction::East, 3, 3), None);
    }

    #[test]
    fn direction_between_neighbors() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(
            Direction::between(origin, CellCoord::new(3, 4)),
            Some(Direction::North)
        );
        assert_eq!(
            Direction::between(origin, CellCoord::new(3, 2)),
            Some(Direction::South)
        );
        assert_eq!(
            Direction::between(origin, CellCoord::new(2, 3)),
            Some(Direction::West)
        );
        assert_eq!(
            Direction::between(origin, CellCoord::new(4, 3)),
            Some(Direction::East)
        );
        assert_eq!(Direction::between(origin, origin), None);
        assert_eq!(Direction::between(origin, CellCoord::new(4, 4)), None);
    }

    #[test]
    fn layout_is_row_major() {
        let mut layout = ObstacleLayout::empty(4, 3);
        layout
            .set_obstacle(CellCoord::new(1, 2), true)
            .expect("cell in range");

        assert!(layout.cells()[2 * 4 + 1]);
        assert!(layout.has_obstacle(CellCoord::new(1, 2)));
        assert_eq!(layout.blocked_count(), 1);
        assert!(layout.set_obstacle(CellCoord::new(4, 0), true).is_err());
    }

    #[test]
    fn layout_rejects_wrong_cell_count() {
        let error = ObstacleLayout::from_cells(3, 3, vec![false; 8]).unwrap_err();
        assert_eq!(
            error,
            LayoutError::CellCountMismatch {
                width: 3,
                height: 3,
                expected: 9,
                actual: 8,
            }
        );
    }

    #[test]
    fn layout_round_trips_through_bincode() {
        let mut layout = ObstacleLayout::empty(5, 2);
        layout
            .set_obstacle(CellCoord::new(4, 1), true)
            .expect("cell in range");

        let bytes = bincode::serialize(&layout).expect("serialize");
        let restored: ObstacleLayout = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, layout);
    }

    #[test]
    fn decoded_layout_with_short_cell_array_is_refused() {
        let bytes = bincode::serialize(&(10_u32, 10_u32, vec![true])).expect("serialize");

        assert!(bincode::deserialize::<ObstacleLayout>(&bytes).is_err());
    }
}
