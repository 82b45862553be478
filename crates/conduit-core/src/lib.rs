//! Conduit Core -- connectivity and distribution engine for voxel networks.
//!
//! Positions on a 3D lattice host either **nodes** (producers and consumers
//! of a resource) or **connectors** (cables, pipes). This crate keeps the
//! connected components of those blocks up to date as they are placed and
//! broken, computes routes between the nodes of each component, and drives a
//! per-component controller once per tick.
//!
//! # Topology
//!
//! - [`graph::Graph`] -- maps every occupied position to its owning group and
//!   merges or splits groups as blocks come and go.
//! - [`group::Group`] -- one connected component: its nodes, its grids, and a
//!   lazily built table of [`path::Path`]s between its nodes.
//! - [`grid::Grid`] -- a connected run of connectors inside a group.
//!
//! # Distribution
//!
//! - [`controller::Controller`] -- resource-specific tick algorithm bound to a
//!   group, with shared bookkeeping in [`controller::ControllerCore`].
//! - [`network::Network`] -- one graph plus one controller per live group,
//!   keeping controller identity in step with merges and splits.
//!
//! ```rust,ignore
//! let mut graph: Graph<Cable, Machine> = Graph::new();
//! graph.add_node(Pos::new(0, 64, 0), machine);
//! graph.add_connector(Pos::new(1, 64, 0), cable);
//! assert_eq!(graph.count_groups(), 1);
//! ```

pub mod connectivity;
pub mod controller;
pub mod graph;
pub mod grid;
pub mod group;
pub mod id;
pub mod network;
pub mod path;
pub mod pos;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
