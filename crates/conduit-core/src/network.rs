//! One graph plus one controller per live group.

use crate::connectivity::{Block, Cache, Connectable};
use crate::controller::{Controller, TickOutcome};
use crate::graph::{Graph, GroupChange};
use crate::id::{Dim, GroupId};
use crate::pos::Pos;
use std::collections::BTreeMap;

/// Everything distributed in one dimension for one resource kind.
///
/// Topology changes go through the network so the controller table stays in
/// step with group identity: a new group gets a new controller, a split-off
/// group gets a fresh controller in the parent's dimension, and absorbed or
/// emptied groups lose theirs.
#[derive(Debug)]
pub struct Network<C, N, K> {
    dim: Dim,
    graph: Graph<C, N>,
    controllers: BTreeMap<GroupId, K>,
}

impl<C, N, K: Controller<C, N>> Network<C, N, K> {
    pub fn new(dim: Dim) -> Self {
        Self::with_graph(dim, Graph::new())
    }

    /// Wrap an existing graph, creating a controller for each of its groups.
    pub fn with_graph(dim: Dim, mut graph: Graph<C, N>) -> Self {
        graph.take_changes();
        let controllers = graph
            .groups()
            .keys()
            .map(|&id| (id, K::create(dim, id)))
            .collect();
        Self {
            dim,
            graph,
            controllers,
        }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn graph(&self) -> &Graph<C, N> {
        &self.graph
    }

    pub fn controllers(&self) -> &BTreeMap<GroupId, K> {
        &self.controllers
    }

    pub fn controller(&self, id: GroupId) -> Option<&K> {
        self.controllers.get(&id)
    }

    pub fn controller_at(&self, pos: Pos) -> Option<&K> {
        self.controllers.get(&self.graph.group_id_at(pos)?)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.graph.contains(pos)
    }

    pub fn node(&self, pos: Pos) -> Option<&N> {
        self.graph.group_at(pos)?.node(pos)
    }

    /// Mutable access to a node. Changes that affect which consumers a
    /// producer admits need an [`invalidate`](Self::invalidate).
    pub fn node_mut(&mut self, pos: Pos) -> Option<&mut N> {
        self.graph.group_at_mut(pos)?.node_mut(pos)
    }

    pub fn connector(&self, pos: Pos) -> Option<&C> {
        self.graph.group_at(pos)?.connector(pos)
    }

    pub fn add_node(&mut self, pos: Pos, node: impl Into<Cache<N>>) -> bool {
        let added = self.graph.add_node(pos, node);
        self.sync();
        added
    }

    pub fn add_connector(&mut self, pos: Pos, connector: impl Into<Cache<C>>) -> bool {
        let added = self.graph.add_connector(pos, connector);
        self.sync();
        added
    }

    pub fn remove_at(&mut self, pos: Pos) -> Option<Block<C, N>> {
        let removed = self.graph.remove_at(pos);
        self.sync();
        removed
    }

    /// Force every controller to rebuild before its next tick.
    pub fn invalidate(&mut self) {
        for controller in self.controllers.values_mut() {
            controller.core_mut().invalidate();
        }
    }

    /// Tick every controller in group id order. Returns how many ticks were
    /// aborted.
    pub fn tick(&mut self, events: &mut K::Events) -> usize {
        let mut aborted = 0;
        for (id, controller) in &mut self.controllers {
            let Some(group) = self.graph.group_mut(*id) else {
                continue;
            };
            if controller.run(group, events) == TickOutcome::Aborted {
                aborted += 1;
            }
        }
        aborted
    }

    /// Replay the graph's change journal onto the controller table.
    fn sync(&mut self) {
        for change in self.graph.take_changes() {
            match change {
                GroupChange::Created(id) => {
                    self.controllers.insert(id, K::create(self.dim, id));
                }
                GroupChange::Split { from, into } => {
                    let dim = self
                        .controllers
                        .get(&from)
                        .map_or(self.dim, |parent| parent.core().dim());
                    log::debug!("group {into:?} split from {from:?}");
                    self.controllers.insert(into, K::create(dim, into));
                }
                GroupChange::Merged { into, from } => {
                    log::debug!("group {from:?} merged into {into:?}");
                    self.controllers.remove(&from);
                }
                GroupChange::Removed(id) => {
                    self.controllers.remove(&id);
                }
            }
        }
    }
}

impl<C: Connectable, N: Connectable, K: Controller<C, N>> Network<C, N, K> {
    /// Re-read the connectivity of the block at `pos`; see
    /// [`Graph::refresh_at`].
    pub fn refresh_at(&mut self, pos: Pos) -> bool {
        let changed = self.graph.refresh_at(pos);
        self.sync();
        changed
    }
}
