#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn coordinator that sends the pursuer after the controlled entity.
//!
//! There is no alternating-turn protocol. The pursuer stays put until the
//! controlled entity settles on a new cell, then walks to the best free cell
//! orthogonally adjacent to it.

use grid_pursuit_core::{
    CellCoord, Command, Direction, EntityId, EntitySnapshot, Event, MovementPhase, PathResult,
    Walkability,
};
use grid_pursuit_system_pathfinding::find_path;
use tracing::{debug, info};

/// What a call to [`TurnCoordinator::pursue`] decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pursuit {
    /// The pursuer is still walking a previous path.
    PursuerBusy,
    /// The pursuer already stands next to the controlled entity.
    AlreadyAdjacent,
    /// No free neighbor of the controlled entity is reachable.
    Unreachable,
    /// A move toward `target` was issued.
    Dispatched {
        /// Neighbor of the controlled entity the pursuer walks to.
        target: CellCoord,
    },
}

/// Approach cell chosen for the pursuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Approach {
    /// Free neighbor of the controlled entity.
    pub cell: CellCoord,
    /// Number of cells on the pursuer's path, both ends included.
    pub path_cells: usize,
}

/// Couples the controlled entity's completed moves to the pursuer's reaction.
#[derive(Debug)]
pub struct TurnCoordinator {
    controlled: EntityId,
    pursuer: EntityId,
    last_observed: CellCoord,
}

impl TurnCoordinator {
    /// Creates a coordinator that considers `controlled_cell` already observed.
    #[must_use]
    pub const fn new(controlled: EntityId, pursuer: EntityId, controlled_cell: CellCoord) -> Self {
        Self {
            controlled,
            pursuer,
            last_observed: controlled_cell,
        }
    }

    /// Last cell on which the controlled entity was seen settled.
    #[must_use]
    pub const fn last_observed(&self) -> CellCoord {
        self.last_observed
    }

    /// Reacts to a batch of events, emitting at most one pursuer move command.
    ///
    /// Only a settle notification for the controlled entity (a completed,
    /// stopped or replaced move) wakes the coordinator; everything else is
    /// ignored.
    pub fn handle<W>(
        &mut self,
        events: &[Event],
        grid: &W,
        controlled: EntitySnapshot,
        pursuer: EntitySnapshot,
        out: &mut Vec<Command>,
    ) where
        W: Walkability + ?Sized,
    {
        let settled = events.iter().any(|event| match event {
            Event::MoveCompleted { entity, .. }
            | Event::MoveStopped { entity, .. }
            | Event::EntityPlaced { entity, .. } => {
                *entity == self.controlled
            }
            _ => false,
        });
        if settled {
            let _ = self.observe(grid, controlled, pursuer, out);
        }
    }

    /// Per-tick check: pursue when the controlled entity is idle on a new cell.
    ///
    /// Returns `None` when nothing changed since the last observation.
    pub fn observe<W>(
        &mut self,
        grid: &W,
        controlled: EntitySnapshot,
        pursuer: EntitySnapshot,
        out: &mut Vec<Command>,
    ) -> Option<Pursuit>
    where
        W: Walkability + ?Sized,
    {
        if controlled.phase != MovementPhase::Idle || controlled.cell == self.last_observed {
            return None;
        }

        self.last_observed = controlled.cell;
        Some(self.pursue(grid, controlled.cell, pursuer, out))
    }

    /// Sends the pursuer toward the closest free neighbor of `controlled_cell`.
    pub fn pursue<W>(
        &self,
        grid: &W,
        controlled_cell: CellCoord,
        pursuer: EntitySnapshot,
        out: &mut Vec<Command>,
    ) -> Pursuit
    where
        W: Walkability + ?Sized,
    {
        if pursuer.phase == MovementPhase::Moving {
            return Pursuit::PursuerBusy;
        }
        if pursuer.cell.is_adjacent_to(controlled_cell) {
            debug!(pursuer = ?pursuer.cell, "pursuer already adjacent");
            return Pursuit::AlreadyAdjacent;
        }

        let Some(approach) = select_approach(grid, pursuer.cell, controlled_cell) else {
            debug!(pursuer = ?pursuer.cell, target = ?controlled_cell, "no reachable approach cell");
            return Pursuit::Unreachable;
        };

        info!(
            from = ?pursuer.cell,
            to = ?approach.cell,
            cells = approach.path_cells,
            "pursuer dispatched"
        );
        out.push(Command::RequestMove {
            entity: self.pursuer,
            target: approach.cell,
        });
        Pursuit::Dispatched {
            target: approach.cell,
        }
    }
}

/// Chooses the free neighbor of `controlled_cell` with the shortest path from `pursuer_cell`.
///
/// Neighbors are tried in [`Direction::CARDINALS`] order and only a strictly
/// shorter path displaces an earlier candidate.
#[must_use]
pub fn select_approach<W>(
    grid: &W,
    pursuer_cell: CellCoord,
    controlled_cell: CellCoord,
) -> Option<Approach>
where
    W: Walkability + ?Sized,
{
    let (width, height) = grid.dimensions();
    let mut best: Option<Approach> = None;

    for direction in Direction::CARDINALS {
        let Some(cell) = controlled_cell.step(direction, width, height) else {
            continue;
        };
        if !grid.is_walkable(cell) {
            continue;
        }
        let PathResult::Found(path) = find_path(grid, pursuer_cell, cell) else {
            continue;
        };

        let candidate = Approach {
            cell,
            path_cells: path.len(),
        };
        if best.map_or(true, |existing| candidate.path_cells < existing.path_cells) {
            best = Some(candidate);
        }
    }

    best
}
