//! Call-edge collection for graph rendering.
//!
//! This crate turns a flat stream of call edges into a clustered,
//! deduplicated [`Graph`] that renderers (DOT, ...) can walk without
//! further bookkeeping.
//!
//! # Module Structure
//!
//! - [`types`]: Input records and build options
//! - [`attrs`]: Sorted attribute map shared by nodes, clusters and edges
//! - [`graph`]: Node/Cluster/Edge arenas and the finished Graph
//! - [`classify`]: Flag → visual attribute mapping
//! - [`cluster`]: Package/type cluster assignment
//! - [`aggregate`]: Edge deduplication and tooltip merging
//! - [`collect`]: The builder that ties the above together

mod aggregate;
mod attrs;
mod classify;
mod cluster;
mod collect;
mod graph;
mod types;

pub use aggregate::EdgeOutcome;
pub use attrs::Attrs;
pub use classify::{call_description, call_site_line, edge_attrs, node_attrs, node_label};
pub use cluster::{ClusterAssigner, ROOT_CLUSTER_KEY};
pub use collect::{GraphBuilder, SkipReason, build_graph};
pub use graph::{Cluster, ClusterId, Edge, EdgeId, EdgeKey, Graph, Node, NodeId};
pub use types::{
    BuildOptions, BuildStats, CallEdgeRecord, CallSite, DispatchKind, FuncRef, GraphConfig,
    GroupBy, RankDir,
};
