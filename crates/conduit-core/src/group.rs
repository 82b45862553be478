//! Connected components: nodes plus the grids of connectors joining them.

use crate::connectivity::{Block, Cache, Connectable, components, largest, links};
use crate::grid::Grid;
use crate::id::GridId;
use crate::path::Path;
use crate::pos::{Dir, Pos};
use indexmap::IndexMap;
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Nodes of a group keyed by position, in the order they were placed.
pub type NodeMap<N> = IndexMap<Pos, Cache<N>>;

/// One connected component of a graph.
///
/// Every node and connector in a group is reachable from every other one
/// through linked neighbours, and no position belongs to two groups. Nodes
/// are stored directly; connectors live in [`Grid`]s, with a position index
/// recording which grid holds each connector.
///
/// Nodes are kept in placement order: every node carries a stamp, handed
/// out by the owning graph, and merges interleave by stamp.
///
/// The group keeps a revision counter that is bumped on every topology
/// change, plus a lazily built table of paths between its nodes that is
/// dropped on the same occasions.
#[derive(Debug, Clone)]
pub struct Group<C, N> {
    nodes: NodeMap<N>,
    stamps: HashMap<Pos, u64>,
    next_stamp: u64,
    grids: SlotMap<GridId, Grid<C>>,
    connectors: BTreeMap<Pos, GridId>,
    revision: u64,
    paths: Option<BTreeMap<Pos, Vec<Path>>>,
}

impl<C, N> Group<C, N> {
    fn empty() -> Self {
        Self {
            nodes: IndexMap::new(),
            stamps: HashMap::new(),
            next_stamp: 0,
            grids: SlotMap::with_key(),
            connectors: BTreeMap::new(),
            revision: 0,
            paths: None,
        }
    }

    /// A group holding one node.
    pub fn single_node(pos: Pos, node: Cache<N>) -> Self {
        let mut group = Self::empty();
        group.add_node(pos, node);
        group
    }

    /// A group holding one connector in a one-connector grid.
    pub fn single_connector(pos: Pos, connector: Cache<C>) -> Self {
        let mut group = Self::empty();
        group.add_connector(pos, connector);
        group
    }

    pub(crate) fn single(pos: Pos, block: Block<C, N>, stamp: u64) -> Self {
        let mut group = Self::empty();
        group.place(pos, block, stamp);
        group
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        self.paths = None;
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a node. The caller guarantees the position is free and linked to
    /// this group (or that the group is being built from scratch).
    pub fn add_node(&mut self, pos: Pos, node: Cache<N>) {
        self.place_node(pos, node, self.next_stamp);
    }

    fn place_node(&mut self, pos: Pos, node: Cache<N>, stamp: u64) {
        let in_order = self
            .nodes
            .last()
            .and_then(|(last, _)| self.stamps.get(last))
            .is_none_or(|&last| last < stamp);
        self.nodes.insert(pos, node);
        self.stamps.insert(pos, stamp);
        self.next_stamp = self.next_stamp.max(stamp + 1);
        if !in_order {
            self.sort_nodes();
        }
        self.invalidate();
    }

    fn sort_nodes(&mut self) {
        let stamps = &self.stamps;
        self.nodes
            .sort_by_cached_key(|pos, _| stamps.get(pos).copied().unwrap_or(u64::MAX));
    }

    /// Add a connector, joining the grid it touches. A connector touching no
    /// grid starts a new one; a connector bridging several grids merges them
    /// into the largest.
    pub fn add_connector(&mut self, pos: Pos, connector: Cache<C>) {
        let mut touching: Vec<GridId> = Vec::new();
        for (dir, next) in pos.neighbors() {
            let Some(&grid_id) = self.connectors.get(&next) else {
                continue;
            };
            let linked = self
                .grids
                .get(grid_id)
                .and_then(|grid| grid.connectors().get(&next))
                .is_some_and(|other| links(&connector, dir, other));
            if linked && !touching.contains(&grid_id) {
                touching.push(grid_id);
            }
        }

        let Some(&first) = touching.first() else {
            let grid_id = self.grids.insert(Grid::single(pos, connector));
            self.connectors.insert(pos, grid_id);
            self.invalidate();
            return;
        };

        let mut best = first;
        for &grid_id in &touching {
            if self.grid_size(grid_id) > self.grid_size(best) {
                best = grid_id;
            }
        }
        for &grid_id in &touching {
            if grid_id == best {
                continue;
            }
            if let Some(grid) = self.grids.remove(grid_id) {
                for &at in grid.connectors().keys() {
                    self.connectors.insert(at, best);
                }
                if let Some(target) = self.grids.get_mut(best) {
                    target.merge(grid);
                }
            }
        }

        if let Some(grid) = self.grids.get_mut(best) {
            grid.add(pos, connector);
        }
        self.connectors.insert(pos, best);
        self.invalidate();
    }

    /// Add a block with a placement stamp from the owning graph.
    pub(crate) fn place(&mut self, pos: Pos, block: Block<C, N>, stamp: u64) {
        match block {
            Block::Node(node) => self.place_node(pos, node, stamp),
            Block::Connector(connector) => self.add_connector(pos, connector),
        }
    }

    fn grid_size(&self, grid_id: GridId) -> usize {
        self.grids.get(grid_id).map_or(0, Grid::count_connectors)
    }

    fn adopt_grid(&mut self, grid: Grid<C>) -> GridId {
        let positions: Vec<Pos> = grid.connectors().keys().copied().collect();
        let grid_id = self.grids.insert(grid);
        for pos in positions {
            self.connectors.insert(pos, grid_id);
        }
        grid_id
    }

    /// Absorb every node and grid of `other`, which joins this group at
    /// `bridge`. Grids that the bridge will connect are merged when the
    /// bridging block itself is added.
    pub fn merge_with(&mut self, other: Group<C, N>, bridge: Pos) {
        log::trace!(
            "merging group of {} blocks into group of {} at {bridge}",
            other.count_blocks(),
            self.count_blocks()
        );
        let Group {
            nodes,
            stamps,
            next_stamp,
            grids,
            ..
        } = other;
        self.nodes.extend(nodes);
        self.stamps.extend(stamps);
        self.next_stamp = self.next_stamp.max(next_stamp);
        self.sort_nodes();
        for (_, grid) in grids {
            self.adopt_grid(grid);
        }
        self.invalidate();
    }

    /// Remove the block at `pos`.
    ///
    /// If the removal disconnects the group, the largest remaining piece
    /// stays in `self` and every other piece is handed to `on_split` as a
    /// new group. Returns `None` if the position is not in this group.
    pub fn remove_at(
        &mut self,
        pos: Pos,
        mut on_split: impl FnMut(Group<C, N>),
    ) -> Option<Block<C, N>> {
        let removed = if let Some(node) = self.nodes.shift_remove(&pos) {
            self.stamps.remove(&pos);
            Block::Node(node)
        } else if let Some(grid_id) = self.connectors.remove(&pos) {
            let mut pieces = Vec::new();
            let grid = self.grids.get_mut(grid_id)?;
            let connector = grid.remove_at(pos, |piece| pieces.push(piece))?;
            if grid.is_empty() {
                self.grids.remove(grid_id);
            }
            for piece in pieces {
                self.adopt_grid(piece);
            }
            Block::Connector(connector)
        } else {
            return None;
        };
        self.invalidate();

        let seeds: Vec<Pos> = pos
            .neighbors()
            .filter(|&(dir, next)| {
                removed.connects(dir) && self.block_connects(next, dir.opposite())
            })
            .map(|(_, next)| next)
            .collect();

        if seeds.len() > 1 {
            let parts = components(&seeds, self.count_blocks(), |at, out| {
                self.linked_neighbors(at, out)
            });
            if parts.len() > 1 {
                log::debug!("removal at {pos} split a group into {} pieces", parts.len());
                let keep = largest(&parts);
                for (index, part) in parts.into_iter().enumerate() {
                    if index != keep {
                        on_split(self.split_off(&part));
                    }
                }
            }
        }

        Some(removed)
    }

    fn split_off(&mut self, part: &BTreeSet<Pos>) -> Group<C, N> {
        let mut group = Group::empty();
        group.next_stamp = self.next_stamp;
        let mut moved: Vec<GridId> = Vec::new();
        let placed: Vec<Pos> = self
            .nodes
            .keys()
            .copied()
            .filter(|pos| part.contains(pos))
            .collect();
        for pos in placed {
            if let Some(node) = self.nodes.shift_remove(&pos) {
                group.nodes.insert(pos, node);
            }
            if let Some(stamp) = self.stamps.remove(&pos) {
                group.stamps.insert(pos, stamp);
            }
        }
        for &pos in part {
            if let Some(&grid_id) = self.connectors.get(&pos) {
                if !moved.contains(&grid_id) {
                    moved.push(grid_id);
                }
            }
        }
        for grid_id in moved {
            if let Some(grid) = self.grids.remove(grid_id) {
                for pos in grid.connectors().keys() {
                    self.connectors.remove(pos);
                }
                group.adopt_grid(grid);
            }
        }
        group
    }

    fn linked_neighbors(&self, pos: Pos, out: &mut Vec<Pos>) {
        for (dir, next) in pos.neighbors() {
            if self.block_connects(pos, dir) && self.block_connects(next, dir.opposite()) {
                out.push(next);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Nodes in placement order.
    pub fn nodes(&self) -> &NodeMap<N> {
        &self.nodes
    }

    /// Placement stamp of the node at `pos`.
    pub fn stamp(&self, pos: Pos) -> Option<u64> {
        self.stamps.get(&pos).copied()
    }

    pub fn node(&self, pos: Pos) -> Option<&N> {
        self.nodes.get(&pos).map(Cache::value)
    }

    /// Mutable access to a node's state. Does not count as a topology change.
    pub fn node_mut(&mut self, pos: Pos) -> Option<&mut N> {
        self.nodes.get_mut(&pos).map(Cache::value_mut)
    }

    pub fn grids(&self) -> &SlotMap<GridId, Grid<C>> {
        &self.grids
    }

    pub fn grid(&self, grid_id: GridId) -> Option<&Grid<C>> {
        self.grids.get(grid_id)
    }

    /// The grid holding the connector at `pos`.
    pub fn grid_of(&self, pos: Pos) -> Option<GridId> {
        self.connectors.get(&pos).copied()
    }

    pub fn connector(&self, pos: Pos) -> Option<&C> {
        let grid_id = self.connectors.get(&pos)?;
        self.grids.get(*grid_id)?.connector(pos)
    }

    pub fn connector_mut(&mut self, pos: Pos) -> Option<&mut C> {
        let grid_id = self.connectors.get(&pos)?;
        self.grids.get_mut(*grid_id)?.connector_mut(pos)
    }

    /// Every occupied position: nodes first, then connectors.
    pub fn blocks(&self) -> impl Iterator<Item = Pos> + '_ {
        self.nodes.keys().chain(self.connectors.keys()).copied()
    }

    pub fn count_blocks(&self) -> usize {
        self.nodes.len() + self.connectors.len()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.nodes.contains_key(&pos) || self.connectors.contains_key(&pos)
    }

    /// Whether the block at `pos` connects toward `dir`. False if absent.
    pub fn block_connects(&self, pos: Pos, dir: Dir) -> bool {
        if let Some(node) = self.nodes.get(&pos) {
            return node.connects(dir);
        }
        self.connectors
            .get(&pos)
            .and_then(|grid_id| self.grids.get(*grid_id))
            .and_then(|grid| grid.connectors().get(&pos))
            .is_some_and(|connector| connector.connects(dir))
    }

    /// Bumped on every topology change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Build the path table if a topology change dropped it.
    ///
    /// For every node the table holds one adjacent path per directly linked
    /// neighbouring node, and one path per other node reachable through each
    /// grid the node touches.
    pub fn update_paths(&mut self) {
        if self.paths.is_some() {
            return;
        }

        let touching: BTreeMap<GridId, BTreeSet<Pos>> = self
            .grids
            .iter()
            .map(|(grid_id, grid)| (grid_id, grid.touching_nodes(&self.nodes)))
            .collect();

        let mut table = BTreeMap::new();
        for (&origin, cache) in &self.nodes {
            let mut routes = Vec::new();
            let mut touched: Vec<GridId> = Vec::new();

            for (dir, next) in origin.neighbors() {
                if self.nodes.get(&next).is_some_and(|other| links(cache, dir, other)) {
                    routes.push(Path::adjacent(origin, next));
                }
                if let Some(&grid_id) = self.connectors.get(&next) {
                    let linked = self
                        .grids
                        .get(grid_id)
                        .and_then(|grid| grid.connectors().get(&next))
                        .is_some_and(|connector| links(cache, dir, connector));
                    if linked && !touched.contains(&grid_id) {
                        touched.push(grid_id);
                    }
                }
            }

            for grid_id in touched {
                let (Some(grid), Some(targets)) = (self.grids.get(grid_id), touching.get(&grid_id))
                else {
                    continue;
                };
                for &target in targets {
                    if target == origin {
                        continue;
                    }
                    let path = grid.path(&self.nodes, origin, target);
                    if !path.is_empty() {
                        routes.push(path);
                    }
                }
            }

            table.insert(origin, routes);
        }

        self.paths = Some(table);
    }

    /// Paths leaving the node at `origin`. Empty until
    /// [`update_paths`](Self::update_paths) has run since the last change.
    pub fn paths_from(&self, origin: Pos) -> &[Path] {
        self.paths
            .as_ref()
            .and_then(|table| table.get(&origin))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_paths(&self) -> bool {
        self.paths.is_some()
    }
}

impl<C: Connectable, N: Connectable> Group<C, N> {
    /// Re-read the connectivity of the block at `pos`. Returns whether it
    /// changed, or `None` if the position is not in this group. Does not
    /// re-link anything; the graph handles that.
    pub(crate) fn refresh_cache(&mut self, pos: Pos) -> Option<bool> {
        if let Some(node) = self.nodes.get_mut(&pos) {
            return Some(node.refresh());
        }
        let grid_id = *self.connectors.get(&pos)?;
        let changed = self.grids.get_mut(grid_id)?.cache_mut(pos)?.refresh();
        Some(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestBlock;

    type TestGroup = Group<TestBlock, TestBlock>;

    fn at(x: i32, y: i32) -> Pos {
        Pos::new(x, y, 0)
    }

    fn open() -> Cache<TestBlock> {
        Cache::new(TestBlock::open())
    }

    /// node - cable - cable - cable - node along y = 0.
    fn chain() -> TestGroup {
        let mut group = Group::single_node(at(0, 0), open());
        for x in 1..4 {
            group.add_connector(at(x, 0), open());
        }
        group.add_node(at(4, 0), open());
        group
    }

    #[test]
    fn singletons_hold_one_block() {
        let node: TestGroup = Group::single_node(at(0, 0), open());
        assert_eq!(node.count_blocks(), 1);
        assert_eq!(node.nodes().len(), 1);
        assert!(node.grids().is_empty());

        let connector: TestGroup = Group::single_connector(at(0, 0), open());
        assert_eq!(connector.count_blocks(), 1);
        assert_eq!(connector.grids().len(), 1);
        assert!(connector.grid_of(at(0, 0)).is_some());
    }

    #[test]
    fn connectors_join_neighbouring_grid() {
        let group = chain();
        assert_eq!(group.grids().len(), 1);
        assert_eq!(group.count_blocks(), 5);
        assert_eq!(group.grid_of(at(1, 0)), group.grid_of(at(3, 0)));
    }

    #[test]
    fn bridging_connector_merges_grids() {
        let mut group: TestGroup = Group::single_connector(at(0, 0), open());
        // Disjoint grid; only legal here because the test builds the group by hand.
        group.add_connector(at(2, 0), open());
        assert_eq!(group.grids().len(), 2);

        group.add_connector(at(1, 0), open());
        assert_eq!(group.grids().len(), 1);
        let grid_id = group.grid_of(at(1, 0)).unwrap();
        assert_eq!(group.grid(grid_id).unwrap().count_connectors(), 3);
    }

    #[test]
    fn node_between_cables_keeps_two_grids() {
        let mut group: TestGroup = Group::single_connector(at(0, 0), open());
        group.add_node(at(1, 0), open());
        group.add_connector(at(2, 0), open());
        assert_eq!(group.grids().len(), 2);
        assert_ne!(group.grid_of(at(0, 0)), group.grid_of(at(2, 0)));
    }

    #[test]
    fn revision_moves_on_topology_change_only() {
        let mut group = chain();
        let before = group.revision();
        group.node_mut(at(0, 0)).unwrap().pass_through = true;
        assert_eq!(group.revision(), before);

        group.remove_at(at(4, 0), |_| panic!("no split"));
        assert!(group.revision() > before);
    }

    #[test]
    fn merge_with_absorbs_everything() {
        let mut left = chain();
        let mut right: TestGroup = Group::single_connector(at(6, 0), open());
        right.add_node(at(7, 0), open());

        left.merge_with(right, at(5, 0));
        left.add_connector(at(5, 0), open());

        assert_eq!(left.count_blocks(), 8);
        assert_eq!(left.nodes().len(), 3);
        // (5,0) joins the single-cable grid at (6,0); the node at (4,0) separates it
        // from the first run.
        assert_eq!(left.grids().len(), 2);
        assert_eq!(left.grid_of(at(5, 0)), left.grid_of(at(6, 0)));
    }

    #[test]
    fn removing_a_bridge_splits_in_two() {
        let mut group = chain();
        let mut splits = Vec::new();
        let removed = group.remove_at(at(2, 0), |g| splits.push(g));

        assert!(removed.is_some_and(|block| block.is_connector()));
        assert_eq!(splits.len(), 1);

        let other = &splits[0];
        assert_eq!(group.count_blocks() + other.count_blocks(), 4);
        assert_eq!(group.count_blocks(), 2);
        assert_eq!(other.count_blocks(), 2);

        // Each half keeps its own node and cable.
        assert!(group.contains(at(0, 0)) && group.contains(at(1, 0)));
        assert!(other.contains(at(3, 0)) && other.contains(at(4, 0)));
        assert!(!group.contains(at(3, 0)));
        assert_eq!(other.grids().len(), 1);
        assert!(other.connector(at(3, 0)).is_some());
        assert!(group.connector(at(3, 0)).is_none());
    }

    #[test]
    fn larger_piece_stays() {
        let mut group = chain();
        group.add_connector(at(-1, 0), open());
        group.add_connector(at(-2, 0), open());
        // Remove the node at (0,0): left arm has 2 blocks, right side has 4.
        let mut splits = Vec::new();
        group.remove_at(at(0, 0), |g| splits.push(g));

        assert_eq!(splits.len(), 1);
        assert_eq!(group.count_blocks(), 4);
        assert_eq!(splits[0].count_blocks(), 2);
        assert!(splits[0].contains(at(-2, 0)));
    }

    #[test]
    fn removing_a_node_inside_a_loop_does_not_split() {
        // 2x2 ring: node at (0,0), cables on the other three corners.
        let mut group: TestGroup = Group::single_node(at(0, 0), open());
        group.add_connector(at(1, 0), open());
        group.add_connector(at(1, 1), open());
        group.add_connector(at(0, 1), open());

        group.remove_at(at(0, 0), |_| panic!("loop stays whole"));
        assert_eq!(group.count_blocks(), 3);
        assert_eq!(group.grids().len(), 1);
    }

    #[test]
    fn dangling_node_splits_off_alone() {
        let mut group: TestGroup = Group::single_node(at(0, 0), open());
        group.add_connector(at(1, 0), open());
        group.add_connector(at(1, 1), open());
        group.add_node(at(-1, 0), open());

        let mut splits = Vec::new();
        group.remove_at(at(0, 0), |g| splits.push(g));
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].count_blocks(), 1);
        assert!(splits[0].contains(at(-1, 0)));
        assert_eq!(group.count_blocks(), 2);
    }

    #[test]
    fn removing_last_block_empties_group() {
        let mut group: TestGroup = Group::single_node(at(0, 0), open());
        assert!(group.remove_at(at(0, 0), |_| {}).is_some_and(|b| b.is_node()));
        assert_eq!(group.count_blocks(), 0);
        assert!(group.remove_at(at(0, 0), |_| {}).is_none());
    }

    #[test]
    fn path_table_covers_grid_and_adjacent_nodes() {
        let mut group = chain();
        group.add_node(at(0, 1), open());
        group.update_paths();

        let from_origin = group.paths_from(at(0, 0));
        assert_eq!(from_origin.len(), 2);
        assert!(from_origin.iter().any(|p| p.is_adjacent() && p.target() == Some(at(0, 1))));
        let through = from_origin
            .iter()
            .find(|p| p.target() == Some(at(4, 0)))
            .unwrap();
        assert_eq!(through.full(), &[at(1, 0), at(2, 0), at(3, 0)]);

        // (0,1) touches no grid and only one node.
        assert_eq!(group.paths_from(at(0, 1)).len(), 1);
    }

    #[test]
    fn path_table_is_dropped_on_change() {
        let mut group = chain();
        group.update_paths();
        assert!(group.has_paths());
        group.add_connector(at(1, 1), open());
        assert!(!group.has_paths());
        assert!(group.paths_from(at(0, 0)).is_empty());
    }

    #[test]
    fn refresh_cache_reports_changes() {
        let mut group = chain();
        assert_eq!(group.refresh_cache(at(2, 0)), Some(false));
        group.connector_mut(at(2, 0)).unwrap().sides = crate::connectivity::Sides::NONE;
        assert_eq!(group.refresh_cache(at(2, 0)), Some(true));
        assert!(!group.block_connects(at(2, 0), Dir::East));
        assert_eq!(group.refresh_cache(at(9, 9)), None);
    }
}
