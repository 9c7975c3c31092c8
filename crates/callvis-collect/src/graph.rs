//! Node/cluster/edge arenas and the finished graph.

use std::collections::{BTreeMap, HashMap};

use callvis_error::{Error, Result};

use crate::attrs::Attrs;
use crate::cluster::{ROOT_CLUSTER_KEY, root_attrs};
use crate::types::GraphConfig;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn as_u32(self) -> u32 {
                self.0
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a node in [`Graph::nodes`].
    NodeId
);
arena_id!(
    /// Index of a cluster in [`Graph::clusters`].
    ClusterId
);
arena_id!(
    /// Index of an edge in the graph's edge arena.
    EdgeId
);

/// A function in the rendered graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Qualified function string; also the DOT node id.
    pub id: String,
    pub attrs: Attrs,
}

/// A (possibly nested) subgraph grouping nodes.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub key: String,
    pub attrs: Attrs,
    /// Directly contained nodes, in first-encounter order
    pub nodes: Vec<NodeId>,
    /// Child clusters by grouping key
    pub children: BTreeMap<String, ClusterId>,
}

impl Cluster {
    pub fn new(key: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            key: key.into(),
            attrs,
            nodes: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Synthetic subgraph name used in DOT output.
    pub fn dot_id(&self) -> String {
        format!("cluster_{}", self.key)
    }
}

/// Logical identity of an edge: caller, dispatch description, callee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub caller: String,
    pub description: String,
    pub callee: String,
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} => {}", self.caller, self.description, self.callee)
    }
}

/// A deduplicated call relationship.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub key: EdgeKey,
    pub attrs: Attrs,
}

/// The finished, clustered call graph.
///
/// Built once by [`crate::GraphBuilder`]; afterwards only shared access is
/// handed out.
#[derive(Debug, Clone)]
pub struct Graph {
    title: String,
    config: GraphConfig,
    nodes: Vec<Node>,
    node_index: HashMap<String, NodeId>,
    clusters: Vec<Cluster>,
    edges: Vec<Edge>,
    edge_index: BTreeMap<EdgeKey, EdgeId>,
}

impl Graph {
    pub(crate) fn new(title: impl Into<String>, config: GraphConfig) -> Self {
        Self {
            title: title.into(),
            config,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            clusters: vec![Cluster::new(ROOT_CLUSTER_KEY, root_attrs())],
            edges: Vec::new(),
            edge_index: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn root(&self) -> ClusterId {
        ClusterId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by its qualified function string.
    pub fn node_by_key(&self, key: &str) -> Option<NodeId> {
        self.node_index.get(key).copied()
    }

    pub fn edge_by_key(&self, key: &EdgeKey) -> Option<EdgeId> {
        self.edge_index.get(key).copied()
    }

    /// Edges ordered by logical key.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_index.values().map(|id| &self.edges[id.index()])
    }

    /// Edges whose endpoints are `from` and `to`, regardless of dispatch.
    pub fn edges_between(&self, from: NodeId, to: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges().filter(move |e| e.from == from && e.to == to)
    }

    /// Clusters that directly contain `node`.
    pub fn placements(&self, node: NodeId) -> Vec<ClusterId> {
        self.clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.nodes.contains(&node))
            .map(|(idx, _)| ClusterId(idx as u32))
            .collect()
    }

    /// Check the structural invariants the serializer relies on: every id
    /// resolves, and every node sits in exactly one cluster.
    pub fn validate(&self) -> Result<()> {
        let mut placed = vec![0usize; self.nodes.len()];
        for cluster in &self.clusters {
            for node in &cluster.nodes {
                let slot = placed.get_mut(node.index()).ok_or_else(|| {
                    dangling("cluster", &cluster.key, "node", node.as_u32())
                })?;
                *slot += 1;
            }
            for child in cluster.children.values() {
                if child.index() >= self.clusters.len() || child.index() == 0 {
                    return Err(dangling("cluster", &cluster.key, "cluster", child.as_u32()));
                }
            }
        }

        if let Some((idx, count)) = placed.iter().enumerate().find(|(_, c)| **c != 1) {
            return Err(Error::serialization_failure(format!(
                "node '{}' is placed in {} clusters",
                self.nodes[idx].id, count
            ))
            .with_operation("collect::Graph::validate"));
        }

        for (key, id) in &self.edge_index {
            let edge = self
                .edges
                .get(id.index())
                .ok_or_else(|| dangling("edge", &key.to_string(), "edge", id.as_u32()))?;
            for end in [edge.from, edge.to] {
                if end.index() >= self.nodes.len() {
                    return Err(dangling("edge", &key.to_string(), "node", end.as_u32()));
                }
            }
        }

        if self.edge_index.len() != self.edges.len() {
            return Err(Error::serialization_failure(format!(
                "{} edges but {} indexed",
                self.edges.len(),
                self.edge_index.len()
            ))
            .with_operation("collect::Graph::validate"));
        }

        Ok(())
    }

    // Mutation, only reachable from the builder.

    /// Return the node for `key`, creating it with `make` if absent.
    /// The flag is true when the node was created by this call.
    pub(crate) fn node_entry(
        &mut self,
        key: &str,
        make: impl FnOnce() -> Node,
    ) -> (NodeId, bool) {
        if let Some(id) = self.node_index.get(key) {
            return (*id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(make());
        self.node_index.insert(key.to_string(), id);
        (id, true)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Return the child of `parent` under `key`, creating it with `make`
    /// if absent.
    pub(crate) fn child_cluster(
        &mut self,
        parent: ClusterId,
        key: &str,
        make: impl FnOnce() -> Cluster,
    ) -> ClusterId {
        if let Some(id) = self.clusters[parent.index()].children.get(key) {
            return *id;
        }
        let id = ClusterId(self.clusters.len() as u32);
        self.clusters.push(make());
        self.clusters[parent.index()]
            .children
            .insert(key.to_string(), id);
        id
    }

    pub(crate) fn place_node(&mut self, cluster: ClusterId, node: NodeId) {
        self.clusters[cluster.index()].nodes.push(node);
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edge_index.insert(edge.key.clone(), id);
        self.edges.push(edge);
        id
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.index()]
    }
}

fn dangling(owner: &str, owner_key: &str, target: &str, id: u32) -> Error {
    Error::serialization_failure(format!(
        "{owner} '{owner_key}' references missing {target} #{id}"
    ))
    .with_operation("collect::Graph::validate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use callvis_error::ErrorKind;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            attrs: Attrs::new(),
        }
    }

    #[test]
    fn test_node_entry_is_identity_map() {
        let mut graph = Graph::new("t", GraphConfig::default());
        let (a, created) = graph.node_entry("x.A", || node("x.A"));
        assert!(created);
        let (again, created) = graph.node_entry("x.A", || node("x.A"));
        assert!(!created);
        assert_eq!(a, again);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node_by_key("x.A"), Some(a));
    }

    #[test]
    fn test_child_cluster_idempotent() {
        let mut graph = Graph::new("t", GraphConfig::default());
        let root = graph.root();
        let first = graph.child_cluster(root, "x", || Cluster::new("x", Attrs::new()));
        let second = graph.child_cluster(root, "x", || Cluster::new("x", Attrs::new()));
        assert_eq!(first, second);
        assert_eq!(graph.clusters().len(), 2);
        assert_eq!(graph.cluster(root).children.len(), 1);
    }

    #[test]
    fn test_validate_rejects_unplaced_node() {
        let mut graph = Graph::new("t", GraphConfig::default());
        graph.node_entry("x.A", || node("x.A"));
        let err = graph.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationFailure);
        assert!(err.message().contains("x.A"));
    }

    #[test]
    fn test_validate_rejects_double_placement() {
        let mut graph = Graph::new("t", GraphConfig::default());
        let root = graph.root();
        let (a, _) = graph.node_entry("x.A", || node("x.A"));
        let x = graph.child_cluster(root, "x", || Cluster::new("x", Attrs::new()));
        graph.place_node(root, a);
        graph.place_node(x, a);
        assert_eq!(graph.placements(a), vec![root, x]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_edge() {
        let mut graph = Graph::new("t", GraphConfig::default());
        let root = graph.root();
        let (a, _) = graph.node_entry("x.A", || node("x.A"));
        graph.place_node(root, a);
        graph.insert_edge(Edge {
            from: a,
            to: NodeId(7),
            key: EdgeKey {
                caller: "x.A".into(),
                description: "static function call".into(),
                callee: "x.Z".into(),
            },
            attrs: Attrs::new(),
        });
        let err = graph.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationFailure);
        assert!(err.message().contains("missing node #7"));
    }

    #[test]
    fn test_root_cluster() {
        let graph = Graph::new("t", GraphConfig::default());
        let root = graph.cluster(graph.root());
        assert_eq!(root.dot_id(), "cluster_focus");
        assert_eq!(root.attrs.get("label"), Some(""));
        assert!(graph.validate().is_ok());
    }
}
