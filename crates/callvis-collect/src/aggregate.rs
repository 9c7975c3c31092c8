//! Edge deduplication and tooltip aggregation.

use crate::attrs::Attrs;
use crate::graph::{Edge, EdgeId, EdgeKey, Graph, NodeId};

/// What happened to a call site offered to [`record_call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// First call site for this logical key; a new edge was created.
    Created(EdgeId),
    /// Folded into an existing edge's tooltip.
    Merged(EdgeId),
}

impl EdgeOutcome {
    pub fn edge(self) -> EdgeId {
        match self {
            EdgeOutcome::Created(id) | EdgeOutcome::Merged(id) => id,
        }
    }
}

/// Record one call site under `key`. The first occurrence creates the edge
/// with `attrs` and a one-line tooltip; later ones append their line to
/// that tooltip and leave the style alone.
pub(crate) fn record_call(
    graph: &mut Graph,
    from: NodeId,
    to: NodeId,
    key: EdgeKey,
    attrs: Attrs,
    site_line: &str,
) -> EdgeOutcome {
    if let Some(id) = graph.edge_by_key(&key) {
        graph.edge_mut(id).attrs.append_line("tooltip", site_line);
        return EdgeOutcome::Merged(id);
    }

    let mut attrs = attrs;
    attrs.set("tooltip", site_line);
    EdgeOutcome::Created(graph.insert_edge(Edge {
        from,
        to,
        key,
        attrs,
    }))
}

/// Append every edge's tooltip to its caller node's tooltip, in edge-key
/// order. Callee nodes are left untouched.
pub(crate) fn fold_tooltips(graph: &mut Graph) {
    let folds: Vec<(NodeId, String)> = graph
        .edges()
        .filter_map(|e| e.attrs.get("tooltip").map(|t| (e.from, t.to_string())))
        .collect();

    for (node, tooltip) in folds {
        graph.node_mut(node).attrs.append_line("tooltip", &tooltip);
    }
}
