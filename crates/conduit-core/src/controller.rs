//! The generic per-group distribution driver.
//!
//! A controller is bound to one group and ticked once per world tick. The
//! shared part of its state lives in [`ControllerCore`]: for every producer,
//! the consumers it can reach (in the order they were found), plus the
//! per-tick absorbers that total up traffic across crossroad connectors.
//! Everything resource-specific is a hook on [`Controller`].

use crate::group::Group;
use crate::id::{Dim, GroupId};
use crate::path::Path;
use crate::pos::{Dir, Pos};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Connection classification
// ---------------------------------------------------------------------------

/// How a consumer is reached from its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// Direct neighbours, no connector in between.
    Adjacent,
    /// A chain of connectors with no crossroad.
    Simple,
    /// The route passes at least one crossroad, so its connectors may be
    /// shared with other routes.
    Variate,
}

impl ConnectionType {
    pub fn of(path: &Path) -> ConnectionType {
        if path.full().is_empty() {
            ConnectionType::Adjacent
        } else if path.cross().is_empty() {
            ConnectionType::Simple
        } else {
            ConnectionType::Variate
        }
    }
}

// ---------------------------------------------------------------------------
// Absorber
// ---------------------------------------------------------------------------

/// Running total of the traffic crossing one crossroad connector this tick,
/// against that connector's rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absorber {
    pub max: i32,
    total: i32,
}

impl Absorber {
    pub fn new(max: i32, initial: i32) -> Self {
        Self {
            max,
            total: initial,
        }
    }

    pub fn add(&mut self, amount: i32) {
        self.total = self.total.saturating_add(amount);
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn is_over(&self) -> bool {
        self.total > self.max
    }
}

// ---------------------------------------------------------------------------
// Consumer wrappers
// ---------------------------------------------------------------------------

/// A resource-specific record of one reachable consumer.
pub trait Consumer {
    /// Position of the consumer node.
    fn node(&self) -> Pos;

    /// Cost of the route to it. Lower is better.
    fn loss(&self) -> i32;

    /// Take over the route data of `other`, which reaches the same node.
    fn replace_route(&mut self, other: Self)
    where
        Self: Sized;
}

/// Fold `incoming` into `existing`, keeping one wrapper per consumer node.
/// When a node is already present, the route with the lower loss wins.
pub fn merge_consumers<W: Consumer>(existing: &mut Vec<W>, incoming: Vec<W>) {
    for consumer in incoming {
        match existing.iter_mut().find(|c| c.node() == consumer.node()) {
            Some(current) => {
                if current.loss() > consumer.loss() {
                    current.replace_route(consumer);
                }
            }
            None => existing.push(consumer),
        }
    }
}

// ---------------------------------------------------------------------------
// Core state
// ---------------------------------------------------------------------------

/// State shared by every controller kind.
#[derive(Debug, Clone)]
pub struct ControllerCore<W> {
    dim: Dim,
    group: GroupId,
    data: Vec<(Pos, Vec<W>)>,
    absorbs: BTreeMap<Pos, Absorber>,
    revision: Option<u64>,
}

impl<W> ControllerCore<W> {
    pub fn new(dim: Dim, group: GroupId) -> Self {
        Self {
            dim,
            group,
            data: Vec::new(),
            absorbs: BTreeMap::new(),
            revision: None,
        }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Producers and their consumers, in discovery order.
    pub fn data(&self) -> &[(Pos, Vec<W>)] {
        &self.data
    }

    pub fn consumers_of(&self, producer: Pos) -> Option<&[W]> {
        self.data
            .iter()
            .find(|(pos, _)| *pos == producer)
            .map(|(_, consumers)| consumers.as_slice())
    }

    pub fn absorbs(&self) -> &BTreeMap<Pos, Absorber> {
        &self.absorbs
    }

    pub fn absorbs_mut(&mut self) -> &mut BTreeMap<Pos, Absorber> {
        &mut self.absorbs
    }

    /// The producer table and the absorbers, borrowed at the same time.
    pub fn parts_mut(&mut self) -> (&[(Pos, Vec<W>)], &mut BTreeMap<Pos, Absorber>) {
        (&self.data, &mut self.absorbs)
    }

    /// Clear the per-tick scratch state.
    pub fn begin_tick(&mut self) {
        self.absorbs.clear();
    }

    /// Force a rebuild on the next refresh. Needed when node properties that
    /// admission depends on change without any topology change.
    pub fn invalidate(&mut self) {
        self.revision = None;
    }

    /// Whether the producer table was built against another revision.
    pub fn is_stale(&self, revision: u64) -> bool {
        self.revision != Some(revision)
    }

    fn install(&mut self, data: Vec<(Pos, Vec<W>)>, revision: u64) {
        self.data = data;
        self.revision = Some(revision);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// A corrupted route stopped distribution part way through.
    Aborted,
}

/// A resource-specific tick algorithm bound to one group.
pub trait Controller<C, N>: Sized {
    type Consumer: Consumer;
    /// Where faults are reported.
    type Events: ?Sized;

    fn create(dim: Dim, group: GroupId) -> Self;

    fn core(&self) -> &ControllerCore<Self::Consumer>;

    fn core_mut(&mut self) -> &mut ControllerCore<Self::Consumer>;

    /// Whether the node at `node` can act as a producer, in general
    /// (`dir == None`) or through one particular side.
    fn is_valid(&self, group: &Group<C, N>, node: Pos, dir: Option<Dir>) -> bool;

    /// Decide whether the node at `consumer`, reached from `producer` along
    /// `path`, is admitted. Admitted consumers are pushed onto `consumers`.
    fn on_check(
        &self,
        group: &Group<C, N>,
        producer: Pos,
        consumers: &mut Vec<Self::Consumer>,
        path: &Path,
        consumer: Pos,
        events: &mut Self::Events,
    );

    /// Reconcile a further batch of consumers for a producer already seen.
    fn on_merge(&self, existing: &mut Vec<Self::Consumer>, incoming: Vec<Self::Consumer>) {
        merge_consumers(existing, incoming);
    }

    /// Distribute for one tick. Implementations reset their own per-tick
    /// state, so calling this directly on a built controller is safe.
    fn tick(&mut self, group: &mut Group<C, N>, events: &mut Self::Events) -> TickOutcome;

    /// Bind to a different group, keeping the dimension.
    fn rebind(&mut self, group: GroupId) {
        let dim = self.core().dim();
        *self.core_mut() = ControllerCore::new(dim, group);
    }

    /// Rebuild the producer table if the group changed since the last build.
    fn refresh(&mut self, group: &mut Group<C, N>, events: &mut Self::Events) {
        if self.core().is_stale(group.revision()) {
            self.rebuild(group, events);
        }
    }

    /// Rebuild the producer table from the group's paths.
    fn rebuild(&mut self, group: &mut Group<C, N>, events: &mut Self::Events) {
        group.update_paths();
        let group: &Group<C, N> = group;

        let mut data = Vec::new();
        for &producer in group.nodes().keys() {
            if !self.is_valid(group, producer, None) {
                continue;
            }

            let mut entry: Option<Vec<Self::Consumer>> = None;
            for path in group.paths_from(producer) {
                let (Some(consumer), Some(exit)) = (path.target(), path.exit()) else {
                    continue;
                };
                if !self.is_valid(group, producer, Some(exit)) {
                    continue;
                }

                let mut batch = Vec::new();
                self.on_check(group, producer, &mut batch, path, consumer, events);
                if batch.is_empty() {
                    continue;
                }
                match entry {
                    Some(ref mut existing) => self.on_merge(existing, batch),
                    None => entry = Some(batch),
                }
            }

            if let Some(consumers) = entry {
                data.push((producer, consumers));
            }
        }

        log::debug!(
            "rebuilt controller for {:?}: {} producers",
            self.core().group(),
            data.len()
        );
        self.core_mut().install(data, group.revision());
    }

    /// Refresh if needed, reset the scratch state and tick.
    fn run(&mut self, group: &mut Group<C, N>, events: &mut Self::Events) -> TickOutcome {
        self.refresh(group, events);
        self.core_mut().begin_tick();
        self.tick(group, events)
    }
}
