//! DOT serialization for clustered call graphs.
//!
//! The serializer walks a finished [`Graph`] pre-order: header, the root
//! cluster with its nodes and nested clusters, then every edge. Attributes
//! come out sorted by key and edges by logical key, so the same graph
//! always produces the same bytes.
//!
//! # Module Structure
//!
//! - [`dot`]: DOT text primitives and the [`DotWriter`] builder

mod dot;

use std::collections::HashSet;
use std::io;

use tracing::debug;

use callvis_collect::{ClusterId, Graph};
use callvis_error::{Error, Result};

pub use dot::{DotWriter, escape_label, graph_id, write_indent};

// ============================================================================
// Public API
// ============================================================================

/// Render `graph` to DOT text.
///
/// Fails with `SerializationFailure` if the graph references ids it does
/// not own; no partial text is returned in that case.
pub fn render_graph(graph: &Graph) -> Result<String> {
    graph
        .validate()
        .map_err(|e| e.with_operation("dot::render_graph"))?;

    let estimated_size = graph.node_count() * 200 + graph.edge_count() * 120 + 1024;
    let mut w = DotWriter::with_capacity(&graph.config().name, estimated_size);

    write_header(&mut w, graph);
    write_cluster(&mut w, graph, graph.root(), &mut HashSet::new());

    if graph.edge_count() > 0 {
        w.blank();
    }
    for edge in graph.edges() {
        w.edge(
            &graph.node(edge.from).id,
            &graph.node(edge.to).id,
            edge.attrs.iter(),
        );
    }

    let output = w.build();
    debug!(
        nodes = graph.node_count(),
        clusters = graph.clusters().len(),
        edges = graph.edge_count(),
        bytes = output.len(),
        "dot rendered"
    );
    Ok(output)
}

/// Render `graph` and write it to `out`.
pub fn write_graph(graph: &Graph, out: &mut impl io::Write) -> Result<()> {
    let dot = render_graph(graph)?;
    out.write_all(dot.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| Error::from(e).with_operation("dot::write_graph"))
}

// ============================================================================
// Tree Walk
// ============================================================================

fn write_header(w: &mut DotWriter, graph: &Graph) {
    let config = graph.config();
    let rankdir = config.rankdir.to_string();
    let nodesep = config.nodesep.to_string();

    w.attr("label", graph.title())
        .attr("labeljust", "l")
        .attr("fontname", "Arial")
        .attr("fontsize", "14")
        .attr("rankdir", &rankdir)
        .attr("bgcolor", "lightgray")
        .attr("style", "solid")
        .attr("penwidth", "0.5")
        .attr("pad", "0.0")
        .attr("nodesep", &nodesep)
        .blank()
        .node_defaults(&[
            ("shape", config.node_shape.as_str()),
            ("style", config.node_style.as_str()),
            ("fillcolor", "honeydew"),
            ("fontname", "Verdana"),
            ("penwidth", "1.0"),
            ("margin", "0.05,0.0"),
        ])
        .edge_defaults(config.minlen)
        .blank();
}

/// Subgraph ids are `cluster_<key>`. A key that would repeat an id already
/// emitted (a package named `focus`, a package path equal to a receiver)
/// gets the cluster's arena index appended until it is unique; the walk is
/// pre-order, so earlier clusters keep the plain form.
fn write_cluster(w: &mut DotWriter, graph: &Graph, id: ClusterId, used: &mut HashSet<String>) {
    let cluster = graph.cluster(id);

    let mut dot_id = cluster.dot_id();
    while !used.insert(dot_id.clone()) {
        dot_id = format!("{dot_id}_{}", id.as_u32());
    }

    w.start_cluster(&dot_id);
    for (key, value) in cluster.attrs.iter() {
        w.attr(key, value);
    }
    for node in &cluster.nodes {
        let node = graph.node(*node);
        w.node(&node.id, node.attrs.iter());
    }
    for child in cluster.children.values() {
        write_cluster(w, graph, *child, used);
    }
    w.end_cluster();
}
