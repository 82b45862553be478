//! Routes between two nodes of a group.

use crate::pos::{Dir, Pos};
use std::collections::VecDeque;

/// One position along a discovered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub pos: Pos,
    /// Whether the route passes a branch point here.
    pub crossroad: bool,
}

impl Step {
    pub fn new(pos: Pos, crossroad: bool) -> Self {
        Self { pos, crossroad }
    }
}

/// An immutable route from an origin node to a target node.
///
/// `full` lists every connector between the two nodes in traversal order;
/// `cross` is the subset of those that are crossroads. A path with both ends
/// set and no connectors joins two directly adjacent nodes. A path missing
/// either end is empty: no route exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    origin: Option<Pos>,
    target: Option<Pos>,
    full: Vec<Pos>,
    cross: Vec<Pos>,
}

impl Path {
    /// A path representing "no route".
    pub fn empty() -> Self {
        Self::default()
    }

    /// A path between two directly linked nodes.
    pub fn adjacent(origin: Pos, target: Pos) -> Self {
        Self {
            origin: Some(origin),
            target: Some(target),
            full: Vec::new(),
            cross: Vec::new(),
        }
    }

    /// Build a path from a route ordered origin first, target last. The two
    /// ends are popped off; whatever remains becomes the connector list.
    pub fn from_route(mut route: VecDeque<Step>) -> Self {
        let origin = route.pop_front().map(|step| step.pos);
        let target = route.pop_back().map(|step| step.pos);

        let mut full = Vec::with_capacity(route.len());
        let mut cross = Vec::new();
        for step in route {
            full.push(step.pos);
            if step.crossroad {
                cross.push(step.pos);
            }
        }

        Self {
            origin,
            target,
            full,
            cross,
        }
    }

    pub fn origin(&self) -> Option<Pos> {
        self.origin
    }

    pub fn target(&self) -> Option<Pos> {
        self.target
    }

    /// Every connector on the route, origin side first.
    pub fn full(&self) -> &[Pos] {
        &self.full
    }

    /// The connectors on the route that are crossroads.
    pub fn cross(&self) -> &[Pos] {
        &self.cross
    }

    /// True when no route exists.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none() || self.target.is_none()
    }

    /// True for a non-empty route with no connectors in between.
    pub fn is_adjacent(&self) -> bool {
        !self.is_empty() && self.full.is_empty()
    }

    /// The side of the origin node the route leaves through.
    pub fn exit(&self) -> Option<Dir> {
        let origin = self.origin?;
        let first = match self.full.first() {
            Some(&pos) => pos,
            None => self.target?,
        };
        origin.direction_to(first)
    }
}
