#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Top-level orchestrator that wires the grid, both movement executors and
//! the turn coordinator together.
//!
//! The [`Session`] owns every piece of mutable state. Adapters submit
//! [`Command`] values through [`Session::apply`]; the resulting [`Event`]
//! values are appended to the caller's buffer and forwarded to the turn
//! coordinator, whose pursuit commands are executed before `apply` returns.

mod config;

use glam::Vec2;
use grid_pursuit_core::{
    CellCoord, Command, Direction, EntityId, Event, GridError, MoveError, MovementPhase,
};
use grid_pursuit_system_movement::{MovementExecutor, Step};
use grid_pursuit_system_pursuit::TurnCoordinator;
use grid_pursuit_world::{CellDescription, Grid};
use thiserror::Error;
use tracing::{info, warn};

pub use config::SessionConfig;

/// Entity steered by the input collaborator.
pub const CONTROLLED: EntityId = EntityId::new(0);
/// Entity that chases the controlled one.
pub const PURSUER: EntityId = EntityId::new(1);

const RESET_CELL: CellCoord = CellCoord::new(0, 0);

/// Reasons a session cannot be built from its configuration.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The controlled entity's start cell was rejected.
    #[error("controlled entity cannot start there")]
    ControlledPlacement(#[source] GridError),
    /// The pursuer's start cell was rejected.
    #[error("pursuer cannot start there")]
    PursuerPlacement(#[source] GridError),
}

/// Data a presentation collaborator needs to draw an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityPresentation {
    /// Entity being described.
    pub entity: EntityId,
    /// Interpolated world-space position.
    pub world_position: Vec2,
    /// Direction of the current or most recent step.
    pub facing: Direction,
    /// Whether the entity is walking.
    pub phase: MovementPhase,
}

/// One controlled entity, one pursuer, one grid.
#[derive(Debug)]
pub struct Session {
    grid: Grid,
    controlled: MovementExecutor,
    pursuer: MovementExecutor,
    coordinator: TurnCoordinator,
    tick_index: u64,
}

impl Session {
    /// Builds a session, placing both entities on their start cells.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let mut grid = Grid::with_layout(config.width, config.height, config.layout);
        let controlled = MovementExecutor::place(
            CONTROLLED,
            config.controlled_start,
            &mut grid,
            config.controlled,
        )
        .map_err(SessionError::ControlledPlacement)?;
        let pursuer =
            MovementExecutor::place(PURSUER, config.pursuer_start, &mut grid, config.pursuer)
                .map_err(SessionError::PursuerPlacement)?;
        let coordinator = TurnCoordinator::new(CONTROLLED, PURSUER, controlled.position());

        info!(
            width = config.width,
            height = config.height,
            controlled = ?controlled.position(),
            pursuer = ?pursuer.position(),
            "session ready"
        );
        Ok(Self {
            grid,
            controlled,
            pursuer,
            coordinator,
            tick_index: 0,
        })
    }

    /// Applies the provided command, appending every resulting event to `out`.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        let first = out.len();
        self.execute(command, out);
        self.react(first, out);
    }

    /// Input-facing move request for `entity` toward `(x, y)`.
    pub fn request_move(
        &mut self,
        entity: EntityId,
        x: u32,
        y: u32,
        out: &mut Vec<Event>,
    ) -> Result<(), MoveError> {
        let first = out.len();
        let result = self.start_move(entity, CellCoord::new(x, y), out);
        self.react(first, out);
        result
    }

    /// Read-only access to the grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Executor of the controlled entity.
    #[must_use]
    pub const fn controlled(&self) -> &MovementExecutor {
        &self.controlled
    }

    /// Executor of the pursuer.
    #[must_use]
    pub const fn pursuer(&self) -> &MovementExecutor {
        &self.pursuer
    }

    /// Executor driving `entity`, if the session knows it.
    #[must_use]
    pub fn executor(&self, entity: EntityId) -> Option<&MovementExecutor> {
        [&self.controlled, &self.pursuer]
            .into_iter()
            .find(|executor| executor.entity() == entity)
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub const fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Reports whether neither entity is walking.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.controlled.phase() == MovementPhase::Idle
            && self.pursuer.phase() == MovementPhase::Idle
    }

    /// Hover/info description of `(x, y)`.
    pub fn describe_cell(&self, x: u32, y: u32) -> Result<CellDescription, GridError> {
        self.grid.describe_cell(CellCoord::new(x, y))
    }

    /// Presentation data for `entity`.
    #[must_use]
    pub fn presentation(&self, entity: EntityId) -> Option<EntityPresentation> {
        self.executor(entity).map(|executor| EntityPresentation {
            entity,
            world_position: executor.world_position(),
            facing: executor.facing(),
            phase: executor.phase(),
        })
    }

    fn execute(&mut self, command: Command, out: &mut Vec<Event>) {
        match command {
            Command::Tick { dt } => {
                self.tick_index = self.tick_index.saturating_add(1);
                out.push(Event::TimeAdvanced { dt });
                let _ = self
                    .controlled
                    .advance(&mut self.grid, Step::Elapsed(dt), out);
                let _ = self.pursuer.advance(&mut self.grid, Step::Elapsed(dt), out);
            }
            Command::RequestMove { entity, target } => {
                let _ = self.start_move(entity, target, out);
            }
            Command::Stop { entity } => self.stop(entity, out),
            Command::Place { entity, cell } => self.place(entity, cell, out),
            Command::ResetControlled => {
                self.stop(CONTROLLED, out);
                self.place(CONTROLLED, RESET_CELL, out);
            }
            Command::SetObstacle { cell, obstacle } => {
                match self.grid.set_obstacle(cell, obstacle) {
                    Ok(()) => out.push(Event::ObstacleChanged { cell, obstacle }),
                    Err(reason) => out.push(Event::CommandRejected { reason }),
                }
            }
            Command::ClearObstacles => {
                self.grid.clear_all_obstacles();
                out.push(Event::ObstaclesCleared);
            }
            Command::LoadObstacles { layout } => match self.grid.load_obstacles(&layout) {
                Ok(blocked) => {
                    info!(blocked, "obstacle layout loaded");
                    out.push(Event::ObstaclesLoaded { blocked });
                }
                Err(reason) => {
                    warn!(%reason, "obstacle layout rejected");
                    out.push(Event::LayoutRejected { reason });
                }
            },
        }
    }

    fn react(&mut self, first: usize, out: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.coordinator.handle(
            &out[first..],
            &self.grid,
            self.controlled.snapshot(),
            self.pursuer.snapshot(),
            &mut commands,
        );
        for command in commands {
            self.execute(command, out);
        }
    }

    fn start_move(
        &mut self,
        entity: EntityId,
        target: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), MoveError> {
        let result = match self.split(entity) {
            Some((executor, grid)) => {
                let from = executor.position();
                executor.move_request(grid, target).map(|()| {
                    if let Some(path) = executor.active_path() {
                        out.push(Event::MoveStarted {
                            entity,
                            from,
                            target,
                            steps: path.len(),
                        });
                    }
                })
            }
            None => Err(MoveError::UnknownEntity(entity)),
        };

        if let Err(reason) = result {
            warn!(entity = entity.get(), ?target, %reason, "move request rejected");
            out.push(Event::MoveRejected {
                entity,
                target,
                reason,
            });
        }
        result
    }

    fn stop(&mut self, entity: EntityId, out: &mut Vec<Event>) {
        let Some((executor, _)) = self.split(entity) else {
            warn!(entity = entity.get(), "stop requested for unknown entity");
            return;
        };
        if executor.stop() {
            out.push(Event::MoveStopped {
                entity,
                cell: executor.position(),
            });
        }
    }

    fn place(&mut self, entity: EntityId, cell: CellCoord, out: &mut Vec<Event>) {
        let Some((executor, grid)) = self.split(entity) else {
            warn!(entity = entity.get(), "placement requested for unknown entity");
            return;
        };
        let was_moving = executor.phase() == MovementPhase::Moving;
        let previous = executor.position();

        match executor.relocate(grid, cell) {
            Ok(()) => {
                if was_moving {
                    out.push(Event::MoveStopped {
                        entity,
                        cell: previous,
                    });
                }
                out.push(Event::EntityPlaced { entity, cell });
            }
            Err(reason) => {
                warn!(entity = entity.get(), ?cell, %reason, "placement rejected");
                out.push(Event::CommandRejected { reason });
            }
        }
    }

    fn split(&mut self, entity: EntityId) -> Option<(&mut MovementExecutor, &mut Grid)> {
        let executor = if entity == self.controlled.entity() {
            &mut self.controlled
        } else if entity == self.pursuer.entity() {
            &mut self.pursuer
        } else {
            return None;
        };
        Some((executor, &mut self.grid))
    }
}
