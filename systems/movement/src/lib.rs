#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-entity move-execution state machine.
//!
//! A [`MovementExecutor`] turns a path computed at request time into a series
//! of cell-to-cell occupancy transfers. It is driven by an external scheduling
//! loop that calls [`MovementExecutor::advance`] once per tick; there is no
//! hidden suspension. The path is never re-planned: cells that become blocked
//! after the request are still entered.

use std::time::Duration;

use glam::Vec2;
use grid_pursuit_core::{
    AdvanceOutcome, CellCoord, Direction, EntityId, EntitySnapshot, Event, GridError, MoveError,
    MovementPhase, PathResult,
};
use grid_pursuit_system_pathfinding::find_path;
use grid_pursuit_world::Grid;
use serde::Deserialize;
use tracing::{debug, info, warn};

const DEFAULT_SPEED: f32 = 5.0;
const DEFAULT_ARRIVAL_TOLERANCE: f32 = 0.01;

/// Travel parameters of a single entity.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementProfile {
    /// World units covered per second of simulated time.
    pub speed: f32,
    /// Distance below which the entity counts as standing on the next cell.
    pub arrival_tolerance: f32,
}

impl MovementProfile {
    /// Creates a profile travelling at `speed` with the default arrival tolerance.
    #[must_use]
    pub const fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::with_speed(DEFAULT_SPEED)
    }
}

/// Progress reported to [`MovementExecutor::advance`] for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Simulated time elapsed; the executor judges arrival geometrically.
    Elapsed(Duration),
    /// The caller has judged that the entity reached its next cell.
    Arrived,
}

/// Movement state owned by a single entity.
#[derive(Clone, Debug)]
pub struct MovementExecutor {
    entity: EntityId,
    position: CellCoord,
    phase: MovementPhase,
    active_path: Option<Vec<CellCoord>>,
    cursor: usize,
    world_position: Vec2,
    facing: Direction,
    profile: MovementProfile,
}

impl MovementExecutor {
    /// Places `entity` on `cell` and returns its idle executor.
    pub fn place(
        entity: EntityId,
        cell: CellCoord,
        grid: &mut Grid,
        profile: MovementProfile,
    ) -> Result<Self, GridError> {
        ensure_free_for(grid, cell, entity)?;
        let world_position = grid.world_anchor(cell)?;
        grid.set_occupant(cell, Some(entity))?;

        Ok(Self {
            entity,
            position: cell,
            phase: MovementPhase::Idle,
            active_path: None,
            cursor: 0,
            world_position,
            facing: Direction::North,
            profile,
        })
    }

    /// Moves the entity directly onto `cell`, discarding any path in flight.
    ///
    /// The destination must be in range and free of obstacles and other
    /// occupants; on rejection nothing changes.
    pub fn relocate(&mut self, grid: &mut Grid, cell: CellCoord) -> Result<(), GridError> {
        ensure_free_for(grid, cell, self.entity)?;
        let world_position = grid.world_anchor(cell)?;

        let _ = self.stop();
        if grid.get_occupant(self.position) == Some(self.entity) {
            grid.set_occupant(self.position, None)?;
        }
        grid.set_occupant(cell, Some(self.entity))?;
        self.position = cell;
        self.world_position = world_position;
        Ok(())
    }

    /// Plans a path to `target` and starts walking it.
    ///
    /// Rejected requests leave the executor untouched. Requesting the cell the
    /// entity already stands on succeeds without starting a move.
    pub fn move_request(&mut self, grid: &Grid, target: CellCoord) -> Result<(), MoveError> {
        if self.phase == MovementPhase::Moving {
            return Err(MoveError::Busy);
        }
        if !grid.in_bounds(target) {
            return Err(GridError::out_of_range(target).into());
        }

        let PathResult::Found(mut path) = find_path(grid, self.position, target) else {
            return Err(MoveError::NoPath);
        };
        if path.first() == Some(&self.position) {
            let _ = path.remove(0);
        }
        let Some(&next) = path.first() else {
            return Ok(());
        };

        if let Some(direction) = Direction::between(self.position, next) {
            self.facing = direction;
        }
        debug!(
            entity = self.entity.get(),
            ?target,
            steps = path.len(),
            "move committed"
        );
        self.active_path = Some(path);
        self.cursor = 0;
        self.phase = MovementPhase::Moving;
        Ok(())
    }

    /// Advances the entity toward the next cell of its path.
    ///
    /// Each call completes at most one cell transition. On arrival the old
    /// cell is vacated and the new one occupied in the same grid write, and
    /// the cached position follows. Exhausting the path returns the executor
    /// to idle and emits [`Event::MoveCompleted`].
    pub fn advance(&mut self, grid: &mut Grid, step: Step, out: &mut Vec<Event>) -> AdvanceOutcome {
        let Some(next) = self.next_cell() else {
            return AdvanceOutcome::Idle;
        };

        let anchor = match grid.world_anchor(next) {
            Ok(anchor) => anchor,
            Err(error) => return self.abort(error, out),
        };

        let arrived = match step {
            Step::Arrived => true,
            Step::Elapsed(dt) => {
                let distance = self.profile.speed * dt.as_secs_f32();
                self.world_position = move_towards(self.world_position, anchor, distance);
                self.world_position.distance(anchor) <= self.profile.arrival_tolerance
            }
        };
        if !arrived {
            return AdvanceOutcome::StillMoving;
        }

        let from = self.position;
        if !grid.is_walkable(next) {
            warn!(
                entity = self.entity.get(),
                ?next,
                "entering a cell that became blocked after the path was committed"
            );
        }
        if let Err(error) = grid.transfer_occupant(self.entity, from, next) {
            return self.abort(error, out);
        }
        self.world_position = anchor;
        self.position = next;
        self.cursor += 1;
        debug!(entity = self.entity.get(), ?from, to = ?next, "cell transition");
        out.push(Event::EntityAdvanced {
            entity: self.entity,
            from,
            to: next,
        });

        match self.next_cell() {
            Some(following) => {
                if let Some(direction) = Direction::between(next, following) {
                    self.facing = direction;
                }
            }
            None => {
                self.discard_path();
                info!(entity = self.entity.get(), cell = ?next, "move completed");
                out.push(Event::MoveCompleted {
                    entity: self.entity,
                    cell: next,
                });
            }
        }

        AdvanceOutcome::Arrived { from, to: next }
    }

    /// Discards the remaining path. Position and occupancy stay as recorded.
    ///
    /// Returns whether a path was in flight.
    pub fn stop(&mut self) -> bool {
        let was_moving = self.phase == MovementPhase::Moving;
        self.discard_path();
        was_moving
    }

    /// Identifier of the entity driven by this executor.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Last confirmed cell of the entity.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Current state-machine phase.
    #[must_use]
    pub const fn phase(&self) -> MovementPhase {
        self.phase
    }

    /// Remaining path, excluding the cell the move started from.
    #[must_use]
    pub fn active_path(&self) -> Option<&[CellCoord]> {
        self.active_path.as_deref()
    }

    /// Index of the next cell within [`Self::active_path`].
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cell the entity is currently heading for.
    #[must_use]
    pub fn next_cell(&self) -> Option<CellCoord> {
        self.active_path
            .as_ref()
            .and_then(|path| path.get(self.cursor).copied())
    }

    /// Interpolated world-space position, for presentation.
    #[must_use]
    pub const fn world_position(&self) -> Vec2 {
        self.world_position
    }

    /// Direction of the current or most recent step.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Travel parameters of the entity.
    #[must_use]
    pub const fn profile(&self) -> MovementProfile {
        self.profile
    }

    /// Immutable summary used by other systems.
    #[must_use]
    pub const fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.entity,
            cell: self.position,
            phase: self.phase,
        }
    }

    fn discard_path(&mut self) {
        self.phase = MovementPhase::Idle;
        self.active_path = None;
        self.cursor = 0;
    }

    fn abort(&mut self, error: GridError, out: &mut Vec<Event>) -> AdvanceOutcome {
        warn!(entity = self.entity.get(), %error, "path abandoned");
        self.discard_path();
        out.push(Event::MoveStopped {
            entity: self.entity,
            cell: self.position,
        });
        AdvanceOutcome::Idle
    }
}

fn ensure_free_for(grid: &Grid, cell: CellCoord, entity: EntityId) -> Result<(), GridError> {
    if grid.get_obstacle(cell)? {
        return Err(GridError::blocked(cell));
    }
    match grid.get_occupant(cell) {
        Some(occupant) if occupant != entity => Err(GridError::blocked(cell)),
        _ => Ok(()),
    }
}

fn move_towards(current: Vec2, target: Vec2, max_distance: f32) -> Vec2 {
    let delta = target - current;
    let length = delta.length();
    if length <= max_distance || length <= f32::EPSILON {
        target
    } else {
        current + delta / length * max_distance
    }
}
