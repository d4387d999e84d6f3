#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic four-directional A* search over a walkability source.
//!
//! Every step costs one and the heuristic is the Manhattan distance to the
//! target. The frontier always yields the open node with the lowest
//! `f = g + h`; among equal `f` values the node discovered first wins. Because
//! neighbors are discovered in [`Direction::CARDINALS`] order, repeated
//! queries against the same grid always return the same path.

mod frontier;

use grid_pursuit_core::{CellCoord, Direction, PathResult, Walkability};
use tracing::debug;

use frontier::Frontier;

/// Searches for the shortest orthogonal path from `start` to `target`.
///
/// `start` itself is never checked for walkability since it is normally
/// occupied by the entity that asked. A target that is blocked, occupied or
/// out of bounds yields [`PathResult::NotFound`], as does an exhausted search.
#[must_use]
pub fn find_path<W>(grid: &W, start: CellCoord, target: CellCoord) -> PathResult
where
    W: Walkability + ?Sized,
{
    if start == target {
        return PathResult::Found(vec![target]);
    }

    if !grid.in_bounds(start) || !grid.is_walkable(target) {
        return PathResult::NotFound;
    }

    let result = Search::new(grid, target).run(start);
    match &result {
        PathResult::Found(cells) => debug!(?start, ?target, cells = cells.len(), "path found"),
        PathResult::NotFound => debug!(?start, ?target, "no path found"),
    }
    result
}

/// Ephemeral per-search record; lives only for the duration of one query.
#[derive(Clone, Copy, Debug)]
struct PathNode {
    cell: CellCoord,
    g: u32,
    h: u32,
    parent: Option<usize>,
}

impl PathNode {
    fn f(&self) -> u32 {
        self.g + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Unseen,
    Open(usize),
    Closed,
}

struct Search<'a, W: ?Sized> {
    grid: &'a W,
    width: u32,
    height: u32,
    target: CellCoord,
    nodes: Vec<PathNode>,
    slots: Vec<Slot>,
    frontier: Frontier,
}

impl<'a, W> Search<'a, W>
where
    W: Walkability + ?Sized,
{
    fn new(grid: &'a W, target: CellCoord) -> Self {
        let (width, height) = grid.dimensions();
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            grid,
            width,
            height,
            target,
            nodes: Vec::new(),
            slots: vec![Slot::Unseen; cell_count],
            frontier: Frontier::default(),
        }
    }

    fn run(mut self, start: CellCoord) -> PathResult {
        let _ = self.open(start, 0, None);

        while let Some(current) = self.frontier.pop_lowest(&self.nodes) {
            let node = self.nodes[current];
            if node.cell == self.target {
                return PathResult::Found(self.reconstruct(current));
            }

            self.set_slot(node.cell, Slot::Closed);
            self.expand(current, node);
        }

        PathResult::NotFound
    }

    fn expand(&mut self, current: usize, node: PathNode) {
        for direction in Direction::CARDINALS {
            let Some(neighbor) = node.cell.step(direction, self.width, self.height) else {
                continue;
            };

            let tentative_g = node.g + 1;
            match self.slot(neighbor) {
                Slot::Closed => {}
                _ if !self.grid.is_walkable(neighbor) => self.set_slot(neighbor, Slot::Closed),
                Slot::Unseen => {
                    let _ = self.open(neighbor, tentative_g, Some(current));
                }
                Slot::Open(index) => {
                    let existing = &mut self.nodes[index];
                    if tentative_g < existing.g {
                        existing.g = tentative_g;
                        existing.parent = Some(current);
                        self.frontier.reprioritize(index, &self.nodes);
                    }
                }
            }
        }
    }

    fn open(&mut self, cell: CellCoord, g: u32, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(PathNode {
            cell,
            g,
            h: cell.manhattan_distance(self.target),
            parent,
        });
        self.set_slot(cell, Slot::Open(index));
        self.frontier.push(index, &self.nodes);
        index
    }

    fn reconstruct(&self, goal: usize) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let mut cursor = Some(goal);
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cells.push(node.cell);
            cursor = node.parent;
        }
        cells.reverse();
        cells
    }

    fn slot(&self, cell: CellCoord) -> Slot {
        self.index(cell)
            .and_then(|index| self.slots.get(index).copied())
            .unwrap_or(Slot::Closed)
    }

    fn set_slot(&mut self, cell: CellCoord, slot: Slot) {
        if let Some(entry) = self.index(cell).and_then(|index| self.slots.get_mut(index)) {
            *entry = slot;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}
