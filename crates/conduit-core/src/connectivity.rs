//! The connectable capability and the connectivity cache wrapped around
//! every block stored in a graph.
//!
//! A block's connectivity can change at runtime (a machine reconfigures its
//! sides) independently of the graph. The graph works from a [`Cache`]
//! snapshot of that connectivity and only re-reads it when told to via
//! [`Cache::refresh`].

use crate::pos::{Dir, Pos};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

// ---------------------------------------------------------------------------
// Connectable
// ---------------------------------------------------------------------------

/// Anything that can occupy a position in a graph: nodes and connectors alike.
pub trait Connectable {
    /// Whether this block accepts a link on the given side.
    fn connects(&self, dir: Dir) -> bool;

    /// A pass-through connector never counts as a crossroad, however many
    /// neighbours it links to.
    fn is_pass_through(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

/// A set of directions, stored as a 6-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sides(u8);

impl Sides {
    pub const NONE: Sides = Sides(0);
    pub const ALL: Sides = Sides(0b11_1111);

    pub fn contains(self, dir: Dir) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    pub fn with(self, dir: Dir) -> Sides {
        Sides(self.0 | (1 << dir.index()))
    }

    pub fn without(self, dir: Dir) -> Sides {
        Sides(self.0 & !(1 << dir.index()))
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// The sides of anything connectable.
    pub fn of<T: Connectable + ?Sized>(value: &T) -> Sides {
        Dir::ALL
            .into_iter()
            .filter(|&dir| value.connects(dir))
            .fold(Sides::NONE, Sides::with)
    }
}

impl Default for Sides {
    fn default() -> Self {
        Sides::ALL
    }
}

impl FromIterator<Dir> for Sides {
    fn from_iter<I: IntoIterator<Item = Dir>>(iter: I) -> Self {
        iter.into_iter().fold(Sides::NONE, Sides::with)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// A block plus a snapshot of the sides it connects on.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    value: T,
    sides: Sides,
    pass_through: bool,
}

impl<T: Connectable> Cache<T> {
    pub fn new(value: T) -> Self {
        let sides = Sides::of(&value);
        let pass_through = value.is_pass_through();
        Self {
            value,
            sides,
            pass_through,
        }
    }

    /// Re-read the block's connectivity. Returns `true` if it changed.
    pub fn refresh(&mut self) -> bool {
        let sides = Sides::of(&self.value);
        let pass_through = self.value.is_pass_through();
        let changed = sides != self.sides || pass_through != self.pass_through;
        self.sides = sides;
        self.pass_through = pass_through;
        changed
    }
}

impl<T> Cache<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the block. Connectivity changes made through this
    /// are not seen until [`refresh`](Cache::refresh) is called.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Whether the cached snapshot connects toward `dir`.
    pub fn connects(&self, dir: Dir) -> bool {
        self.sides.contains(dir)
    }

    pub fn sides(&self) -> Sides {
        self.sides
    }

    pub fn is_pass_through(&self) -> bool {
        self.pass_through
    }
}

impl<T: Connectable> From<T> for Cache<T> {
    fn from(value: T) -> Self {
        Cache::new(value)
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A block held by a graph: either a node or a connector.
#[derive(Debug, Clone)]
pub enum Block<C, N> {
    Node(Cache<N>),
    Connector(Cache<C>),
}

impl<C, N> Block<C, N> {
    pub fn connects(&self, dir: Dir) -> bool {
        match self {
            Block::Node(node) => node.connects(dir),
            Block::Connector(connector) => connector.connects(dir),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Block::Node(_))
    }

    pub fn is_connector(&self) -> bool {
        matches!(self, Block::Connector(_))
    }

    pub fn as_node(&self) -> Option<&N> {
        match self {
            Block::Node(node) => Some(node.value()),
            Block::Connector(_) => None,
        }
    }

    pub fn as_connector(&self) -> Option<&C> {
        match self {
            Block::Connector(connector) => Some(connector.value()),
            Block::Node(_) => None,
        }
    }
}

/// Two neighbouring blocks are linked when each connects toward the other.
pub fn links<A, B>(from: &Cache<A>, dir: Dir, to: &Cache<B>) -> bool {
    from.connects(dir) && to.connects(dir.opposite())
}

/// Partition the blocks reachable from `seeds` into connected components.
///
/// `neighbors` pushes the linked neighbours of a position. Stops early once a
/// component covers `total` positions, since nothing can be left outside it.
pub(crate) fn components(
    seeds: &[Pos],
    total: usize,
    mut neighbors: impl FnMut(Pos, &mut Vec<Pos>),
) -> Vec<BTreeSet<Pos>> {
    let mut found: Vec<BTreeSet<Pos>> = Vec::new();
    let mut buffer = Vec::with_capacity(6);

    for &seed in seeds {
        if found.iter().any(|component| component.contains(&seed)) {
            continue;
        }

        let mut seen = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(pos) = queue.pop_front() {
            buffer.clear();
            neighbors(pos, &mut buffer);
            for &next in &buffer {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let whole = seen.len() >= total;
        found.push(seen);
        if whole {
            break;
        }
    }

    found
}

/// Index of the largest component; the first one wins ties.
pub(crate) fn largest(parts: &[BTreeSet<Pos>]) -> usize {
    let mut best = 0;
    for (index, part) in parts.iter().enumerate() {
        if part.len() > parts[best].len() {
            best = index;
        }
    }
    best
}
