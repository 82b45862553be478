//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::connectivity::{Connectable, Sides};
use crate::graph::Graph;
use crate::pos::{Dir, Pos};
use std::collections::BTreeSet;

// ===========================================================================
// Blocks
// ===========================================================================

/// A block whose connectivity is plain data, so tests can flip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestBlock {
    pub sides: Sides,
    pub pass_through: bool,
}

impl TestBlock {
    /// Connects on every side.
    pub fn open() -> Self {
        Self::with_sides(Sides::ALL)
    }

    pub fn with_sides(sides: Sides) -> Self {
        Self {
            sides,
            pass_through: false,
        }
    }

    /// Connects on every side but never counts as a crossroad.
    pub fn pass_through() -> Self {
        Self {
            sides: Sides::ALL,
            pass_through: true,
        }
    }
}

impl Connectable for TestBlock {
    fn connects(&self, dir: Dir) -> bool {
        self.sides.contains(dir)
    }

    fn is_pass_through(&self) -> bool {
        self.pass_through
    }
}

pub type TestGraph = Graph<TestBlock, TestBlock>;

// ===========================================================================
// Positions
// ===========================================================================

pub fn pos(x: i32, y: i32, z: i32) -> Pos {
    Pos::new(x, y, z)
}

/// A straight run of `len` positions along +x starting at `start`.
pub fn run_x(start: Pos, len: i32) -> Vec<Pos> {
    (0..len)
        .map(|i| Pos::new(start.x() + i, start.y(), start.z()))
        .collect()
}

// ===========================================================================
// Reference connectivity
// ===========================================================================

/// Connected components of a set of fully open blocks, computed from scratch.
/// Used as the oracle the incremental graph is checked against.
pub fn lattice_components(occupied: &BTreeSet<Pos>) -> Vec<BTreeSet<Pos>> {
    let mut remaining = occupied.clone();
    let mut found = Vec::new();

    while let Some(&seed) = remaining.iter().next() {
        remaining.remove(&seed);
        let mut component = BTreeSet::from([seed]);
        let mut stack = vec![seed];
        while let Some(pos) = stack.pop() {
            for (_, next) in pos.neighbors() {
                if remaining.remove(&next) {
                    component.insert(next);
                    stack.push(next);
                }
            }
        }
        found.push(component);
    }

    found
}
