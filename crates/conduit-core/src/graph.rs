//! The top-level registry of groups.

use crate::connectivity::{Block, Cache, Connectable};
use crate::group::Group;
use crate::id::{GroupId, IdAllocator};
use crate::pos::{Dir, Pos};
use std::collections::{BTreeMap, HashMap};

/// A change in group identity, recorded so owners of per-group state (such
/// as controllers) can follow along. Drained with [`Graph::take_changes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    /// A new singleton group was created.
    Created(GroupId),
    /// `from` was absorbed into `into` and no longer exists.
    Merged { into: GroupId, from: GroupId },
    /// `into` was split off from `from`, which still exists.
    Split { from: GroupId, into: GroupId },
    /// The group lost its last block and was discarded.
    Removed(GroupId),
}

/// Every occupied position and the group that owns it.
///
/// Invariants:
/// - every occupied position maps to exactly one live group;
/// - two positions share a group if and only if they are joined by a chain
///   of linked neighbours;
/// - group ids come from the graph's [`IdAllocator`] and are never reused.
#[derive(Debug)]
pub struct Graph<C, N> {
    groups: BTreeMap<GroupId, Group<C, N>>,
    positions: HashMap<Pos, GroupId>,
    ids: IdAllocator,
    /// Next node placement stamp.
    placed: u64,
    changes: Vec<GroupChange>,
}

impl<C, N> Default for Graph<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, N> Graph<C, N> {
    pub fn new() -> Self {
        Self::with_ids(IdAllocator::new())
    }

    /// A graph drawing group ids from `ids`.
    pub fn with_ids(ids: IdAllocator) -> Self {
        Self {
            groups: BTreeMap::new(),
            positions: HashMap::new(),
            ids,
            placed: 0,
            changes: Vec::new(),
        }
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Whether any group holds `pos`.
    pub fn contains(&self, pos: Pos) -> bool {
        self.positions.contains_key(&pos)
    }

    /// Whether `from` and `to` are both occupied and in the same group.
    pub fn linked(&self, from: Pos, to: Pos) -> bool {
        match (self.positions.get(&from), self.positions.get(&to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Whether the graph can link toward `dir` at `pos`. Only occupancy is
    /// checked at this level; the direction is accepted for callers that
    /// apply directional rules on top.
    pub fn connects(&self, pos: Pos, _dir: Dir) -> bool {
        self.contains(pos)
    }

    pub fn count_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &BTreeMap<GroupId, Group<C, N>> {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group<C, N>> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group<C, N>> {
        self.groups.get_mut(&id)
    }

    pub fn group_id_at(&self, pos: Pos) -> Option<GroupId> {
        self.positions.get(&pos).copied()
    }

    pub fn group_at(&self, pos: Pos) -> Option<&Group<C, N>> {
        self.groups.get(self.positions.get(&pos)?)
    }

    pub fn group_at_mut(&mut self, pos: Pos) -> Option<&mut Group<C, N>> {
        let id = self.positions.get(&pos)?;
        self.groups.get_mut(id)
    }

    /// Drain the change journal.
    pub fn take_changes(&mut self) -> Vec<GroupChange> {
        std::mem::take(&mut self.changes)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a node at `pos`. Returns `false` without doing anything if the
    /// position is already occupied.
    pub fn add_node(&mut self, pos: Pos, node: impl Into<Cache<N>>) -> bool {
        self.add(pos, Block::Node(node.into()))
    }

    /// Add a connector at `pos`. Returns `false` without doing anything if
    /// the position is already occupied.
    pub fn add_connector(&mut self, pos: Pos, connector: impl Into<Cache<C>>) -> bool {
        self.add(pos, Block::Connector(connector.into()))
    }

    /// Add a block, generic across nodes and connectors.
    ///
    /// No linked neighbour: a new singleton group. One neighbouring group:
    /// the block joins it. Several: they are merged into the largest (the
    /// first one seen wins ties) and the block joins the result.
    ///
    /// Nodes are stamped in placement order, which groups preserve across
    /// merges and splits.
    pub fn add(&mut self, pos: Pos, block: Block<C, N>) -> bool {
        let stamp = self.placed;
        let added = self.place(pos, block, stamp);
        if added {
            self.placed += 1;
        }
        added
    }

    fn place(&mut self, pos: Pos, block: Block<C, N>, stamp: u64) -> bool {
        if self.contains(pos) {
            return false;
        }

        let mergers = self.neighboring_groups(pos, &block);
        let Some(&first) = mergers.first() else {
            let id = self.ids.next_id();
            log::trace!("new group {id:?} at {pos}");
            self.positions.insert(pos, id);
            self.groups.insert(id, Group::single(pos, block, stamp));
            self.changes.push(GroupChange::Created(id));
            return true;
        };

        let best = if mergers.len() == 1 {
            first
        } else {
            self.begin_merge(&mergers, pos)
        };

        self.positions.insert(pos, best);
        if let Some(group) = self.groups.get_mut(&best) {
            group.place(pos, block, stamp);
        }
        true
    }

    /// Merge every group in `mergers` into the largest one and return its id.
    fn begin_merge(&mut self, mergers: &[GroupId], bridge: Pos) -> GroupId {
        let size = |id: &GroupId| self.groups.get(id).map_or(0, Group::count_blocks);
        let mut best = mergers[0];
        for id in mergers {
            if size(id) > size(&best) {
                best = *id;
            }
        }

        let mut absorbed = Vec::with_capacity(mergers.len() - 1);
        for &id in mergers {
            if id == best {
                continue;
            }
            let Some(group) = self.groups.remove(&id) else {
                continue;
            };
            for pos in group.blocks() {
                self.positions.insert(pos, best);
            }
            absorbed.push(group);
            self.changes.push(GroupChange::Merged { into: best, from: id });
        }

        log::debug!("merging {} groups into {best:?} at {bridge}", absorbed.len());
        if let Some(target) = self.groups.get_mut(&best) {
            for group in absorbed {
                target.merge_with(group, bridge);
            }
        }
        best
    }

    /// Distinct groups linked to a block about to be placed at `pos`, in
    /// direction order.
    fn neighboring_groups(&self, pos: Pos, block: &Block<C, N>) -> Vec<GroupId> {
        let mut found = Vec::with_capacity(6);
        for (dir, next) in pos.neighbors() {
            if !block.connects(dir) {
                continue;
            }
            let Some(&id) = self.positions.get(&next) else {
                continue;
            };
            let linked = self
                .groups
                .get(&id)
                .is_some_and(|group| group.block_connects(next, dir.opposite()));
            if linked && !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    /// Remove whatever is at `pos`, splitting its group if needed. Every
    /// split-off piece is registered under a fresh id. Returns the removed
    /// block, or `None` if the position was empty.
    pub fn remove_at(&mut self, pos: Pos) -> Option<Block<C, N>> {
        let id = self.positions.remove(&pos)?;
        let group = self.groups.get_mut(&id)?;

        let mut pieces = Vec::new();
        let removed = group.remove_at(pos, |piece| pieces.push(piece));
        let emptied = group.count_blocks() == 0;

        for piece in pieces {
            let new_id = self.ids.next_id();
            for part in piece.blocks() {
                self.positions.insert(part, new_id);
            }
            self.groups.insert(new_id, piece);
            self.changes.push(GroupChange::Split { from: id, into: new_id });
        }

        if emptied {
            self.groups.remove(&id);
            self.changes.push(GroupChange::Removed(id));
        }

        removed
    }
}

impl<C: Connectable, N: Connectable> Graph<C, N> {
    /// Re-read the connectivity of the block at `pos` and re-link it if it
    /// changed. Returns whether anything changed.
    pub fn refresh_at(&mut self, pos: Pos) -> bool {
        let changed = self
            .group_at_mut(pos)
            .and_then(|group| group.refresh_cache(pos))
            .unwrap_or(false);
        if !changed {
            return false;
        }
        let stamp = self.group_at(pos).and_then(|group| group.stamp(pos));
        match (self.remove_at(pos), stamp) {
            (Some(block), Some(stamp)) => self.place(pos, block, stamp),
            (Some(block), None) => self.add(pos, block),
            (None, _) => false,
        }
    }
}
