//! Open set ordered by `f`, then by discovery order.

use std::{cmp::Reverse, collections::BinaryHeap};

use crate::PathNode;

/// Priority queue over indices into the node arena.
///
/// Node indices are handed out in discovery order, so `(f, index)` reproduces
/// a stable linear scan for the lowest `f`. Lowering a node's `g` pushes a
/// fresh entry and the outdated one is skipped when it surfaces.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<Reverse<(u32, usize)>>,
}

impl Frontier {
    pub(crate) fn push(&mut self, index: usize, nodes: &[PathNode]) {
        self.heap.push(Reverse((nodes[index].f(), index)));
    }

    pub(crate) fn reprioritize(&mut self, index: usize, nodes: &[PathNode]) {
        self.push(index, nodes);
    }

    pub(crate) fn pop_lowest(&mut self, nodes: &[PathNode]) -> Option<usize> {
        while let Some(Reverse((f, index))) = self.heap.pop() {
            if nodes[index].f() == f {
                return Some(index);
            }
        }
        None
    }
}
