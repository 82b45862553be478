//! Packed lattice positions and the six axis-aligned directions.
//!
//! A [`Pos`] is an opaque 64-bit key. Coordinates are packed with fixed bit
//! widths: 26 bits each for x and z, 12 bits for y. Values outside those
//! ranges are truncated; callers are expected to stay within world bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

const X_BITS: u32 = 26;
const Z_BITS: u32 = 26;
const Y_BITS: u32 = 12;

const X_SHIFT: u32 = Z_BITS + Y_BITS;
const Z_SHIFT: u32 = Y_BITS;

const X_MASK: u64 = (1 << X_BITS) - 1;
const Z_MASK: u64 = (1 << Z_BITS) - 1;
const Y_MASK: u64 = (1 << Y_BITS) - 1;

// ---------------------------------------------------------------------------
// Dir
// ---------------------------------------------------------------------------

/// One of the six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Dir {
    /// All six directions, in a fixed order used for every neighbour scan.
    pub const ALL: [Dir; 6] = [
        Dir::Down,
        Dir::Up,
        Dir::North,
        Dir::South,
        Dir::West,
        Dir::East,
    ];

    /// The direction pointing the other way.
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Down => Dir::Up,
            Dir::Up => Dir::Down,
            Dir::North => Dir::South,
            Dir::South => Dir::North,
            Dir::West => Dir::East,
            Dir::East => Dir::West,
        }
    }

    /// Unit step `(dx, dy, dz)` for this direction.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Dir::Down => (0, -1, 0),
            Dir::Up => (0, 1, 0),
            Dir::North => (0, 0, -1),
            Dir::South => (0, 0, 1),
            Dir::West => (-1, 0, 0),
            Dir::East => (1, 0, 0),
        }
    }

    /// Index into [`Dir::ALL`], used for bitmasks.
    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Pos
// ---------------------------------------------------------------------------

/// A block position packed into a single 64-bit key.
///
/// Equality, ordering and hashing all use the raw key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos(u64);

impl Pos {
    /// Pack `(x, y, z)` into a key.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        let x = (x as i64 as u64) & X_MASK;
        let y = (y as i64 as u64) & Y_MASK;
        let z = (z as i64 as u64) & Z_MASK;
        Self((x << X_SHIFT) | (z << Z_SHIFT) | y)
    }

    /// Wrap an existing key.
    pub const fn from_key(key: u64) -> Self {
        Self(key)
    }

    /// The raw key.
    pub const fn key(self) -> u64 {
        self.0
    }

    pub const fn x(self) -> i32 {
        ((self.0 as i64) >> X_SHIFT) as i32
    }

    pub const fn y(self) -> i32 {
        (((self.0 as i64) << (64 - Y_BITS)) >> (64 - Y_BITS)) as i32
    }

    pub const fn z(self) -> i32 {
        (((self.0 as i64) << (64 - X_SHIFT)) >> (64 - Z_BITS)) as i32
    }

    /// The position one step away in `dir`.
    pub fn offset(self, dir: Dir) -> Pos {
        let (dx, dy, dz) = dir.offset();
        Pos::new(self.x() + dx, self.y() + dy, self.z() + dz)
    }

    /// All six neighbours, paired with the direction that reaches them.
    pub fn neighbors(self) -> impl Iterator<Item = (Dir, Pos)> {
        Dir::ALL.into_iter().map(move |dir| (dir, self.offset(dir)))
    }

    /// The direction of a single step from `self` to `other`, if they are
    /// lattice neighbours.
    pub fn direction_to(self, other: Pos) -> Option<Dir> {
        Dir::ALL.into_iter().find(|&dir| self.offset(dir) == other)
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}, {}, {})", self.x(), self.y(), self.z())
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x(), self.y(), self.z())
    }
}

impl From<(i32, i32, i32)> for Pos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Pos::new(x, y, z)
    }
}
