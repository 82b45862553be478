//! Connected runs of connectors.

use crate::connectivity::{Cache, components, largest, links};
use crate::group::NodeMap;
use crate::path::{Path, Step};
use crate::pos::Pos;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A maximal set of connectors that are all reachable from one another
/// through connector-to-connector links.
///
/// Grids do not hold nodes. Operations that need to know about the nodes
/// around a grid (routing, crossroad detection) take the owning group's node
/// map as an argument.
#[derive(Debug, Clone)]
pub struct Grid<C> {
    connectors: BTreeMap<Pos, Cache<C>>,
}

impl<C> Grid<C> {
    /// A grid holding a single connector.
    pub fn single(pos: Pos, connector: Cache<C>) -> Self {
        Self {
            connectors: BTreeMap::from([(pos, connector)]),
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.connectors.contains_key(&pos)
    }

    pub fn connector(&self, pos: Pos) -> Option<&C> {
        self.connectors.get(&pos).map(Cache::value)
    }

    pub fn connector_mut(&mut self, pos: Pos) -> Option<&mut C> {
        self.connectors.get_mut(&pos).map(Cache::value_mut)
    }

    pub(crate) fn cache_mut(&mut self, pos: Pos) -> Option<&mut Cache<C>> {
        self.connectors.get_mut(&pos)
    }

    pub fn connectors(&self) -> &BTreeMap<Pos, Cache<C>> {
        &self.connectors
    }

    pub fn count_connectors(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Insert a connector. The caller guarantees it links to this grid.
    pub fn add(&mut self, pos: Pos, connector: Cache<C>) {
        self.connectors.insert(pos, connector);
    }

    /// Absorb every connector of `other`.
    pub fn merge(&mut self, other: Grid<C>) {
        self.connectors.extend(other.connectors);
    }

    /// Whether two neighbouring connectors of this grid link to each other.
    pub fn linked(&self, from: Pos, to: Pos) -> bool {
        match (
            from.direction_to(to),
            self.connectors.get(&from),
            self.connectors.get(&to),
        ) {
            (Some(dir), Some(a), Some(b)) => links(a, dir, b),
            _ => false,
        }
    }

    fn linked_neighbors(&self, pos: Pos, out: &mut Vec<Pos>) {
        let Some(cache) = self.connectors.get(&pos) else {
            return;
        };
        for (dir, next) in pos.neighbors() {
            if let Some(other) = self.connectors.get(&next) {
                if links(cache, dir, other) {
                    out.push(next);
                }
            }
        }
    }

    /// Remove the connector at `pos`.
    ///
    /// If that disconnects the grid, the largest remaining piece stays in
    /// `self` and every other piece is handed to `on_split` as a new grid.
    pub fn remove_at(&mut self, pos: Pos, mut on_split: impl FnMut(Grid<C>)) -> Option<Cache<C>> {
        let removed = self.connectors.remove(&pos)?;

        let seeds: Vec<Pos> = pos
            .neighbors()
            .filter(|(dir, next)| {
                self.connectors
                    .get(next)
                    .is_some_and(|other| links(&removed, *dir, other))
            })
            .map(|(_, next)| next)
            .collect();

        if seeds.len() > 1 {
            let parts = components(&seeds, self.connectors.len(), |at, out| {
                self.linked_neighbors(at, out)
            });
            if parts.len() > 1 {
                let keep = largest(&parts);
                for (index, part) in parts.into_iter().enumerate() {
                    if index == keep {
                        continue;
                    }
                    let mut split = BTreeMap::new();
                    for at in part {
                        if let Some(cache) = self.connectors.remove(&at) {
                            split.insert(at, cache);
                        }
                    }
                    on_split(Grid { connectors: split });
                }
            }
        }

        Some(removed)
    }

    /// Positions of the nodes linked to any connector of this grid.
    pub fn touching_nodes<N>(&self, nodes: &NodeMap<N>) -> BTreeSet<Pos> {
        let mut touching = BTreeSet::new();
        for (&pos, cache) in &self.connectors {
            for (dir, next) in pos.neighbors() {
                if nodes.get(&next).is_some_and(|node| links(cache, dir, node)) {
                    touching.insert(next);
                }
            }
        }
        touching
    }

    /// Whether the connector at `pos` is a branch point: three or more links,
    /// counting neighbouring nodes, and not a pass-through.
    pub fn is_crossroad<N>(&self, pos: Pos, nodes: &NodeMap<N>) -> bool {
        let Some(cache) = self.connectors.get(&pos) else {
            return false;
        };
        if cache.is_pass_through() {
            return false;
        }
        let degree = pos
            .neighbors()
            .filter(|(dir, next)| {
                self.connectors
                    .get(next)
                    .is_some_and(|other| links(cache, *dir, other))
                    || nodes.get(next).is_some_and(|node| links(cache, *dir, node))
            })
            .count();
        degree >= 3
    }

    /// Shortest route (fewest connectors) from node `origin` to node `target`
    /// through this grid. Returns an empty path if either node is missing,
    /// they are the same node, or the grid does not join them.
    pub fn path<N>(&self, nodes: &NodeMap<N>, origin: Pos, target: Pos) -> Path {
        if origin == target {
            return Path::empty();
        }
        let (Some(from), Some(to)) = (nodes.get(&origin), nodes.get(&target)) else {
            return Path::empty();
        };

        let mut parents: BTreeMap<Pos, Option<Pos>> = BTreeMap::new();
        let mut queue = VecDeque::new();
        for (dir, next) in origin.neighbors() {
            if self.connectors.get(&next).is_some_and(|c| links(from, dir, c)) {
                parents.insert(next, None);
                queue.push_back(next);
            }
        }

        let mut buffer = Vec::with_capacity(6);
        while let Some(pos) = queue.pop_front() {
            let Some(cache) = self.connectors.get(&pos) else {
                continue;
            };
            if pos
                .direction_to(target)
                .is_some_and(|dir| links(cache, dir, to))
            {
                return self.trace(nodes, origin, target, pos, &parents);
            }

            buffer.clear();
            self.linked_neighbors(pos, &mut buffer);
            for &next in &buffer {
                if !parents.contains_key(&next) {
                    parents.insert(next, Some(pos));
                    queue.push_back(next);
                }
            }
        }

        Path::empty()
    }

    fn trace<N>(
        &self,
        nodes: &NodeMap<N>,
        origin: Pos,
        target: Pos,
        last: Pos,
        parents: &BTreeMap<Pos, Option<Pos>>,
    ) -> Path {
        let mut route = VecDeque::new();
        route.push_back(Step::new(target, false));
        let mut cursor = Some(last);
        while let Some(pos) = cursor {
            route.push_front(Step::new(pos, self.is_crossroad(pos, nodes)));
            cursor = parents.get(&pos).copied().flatten();
        }
        route.push_front(Step::new(origin, false));
        Path::from_route(route)
    }
}
