//! Graph building from a call-edge stream.

use strum_macros::{Display, IntoStaticStr};
use tracing::{debug, info};

use callvis_error::Result;

use crate::aggregate::{EdgeOutcome, fold_tooltips, record_call};
use crate::classify::{call_description, call_site_line, edge_attrs, node_attrs};
use crate::cluster::ClusterAssigner;
use crate::graph::{EdgeKey, Graph, Node, NodeId};
use crate::types::{BuildOptions, BuildStats, CallEdgeRecord, FuncRef};

/// Why a record was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Caller or callee identity missing
    Malformed,
    /// Caller without a package, or compiler-synthesized callee
    Synthetic,
    /// An endpoint lives in the standard library
    Std,
    /// An endpoint lies outside the base module
    OutOfScope,
}

impl SkipReason {
    /// First filter that rejects `record`, checked in order: malformed,
    /// synthetic, std, scope.
    pub fn of(record: &CallEdgeRecord, options: &BuildOptions) -> Option<SkipReason> {
        let (caller, callee) = (&record.caller, &record.callee);

        if caller.id.is_empty() || callee.id.is_empty() {
            return Some(SkipReason::Malformed);
        }
        if caller.package.is_empty() || callee.is_synthetic() {
            return Some(SkipReason::Synthetic);
        }
        if options.omit_std && (caller.std || callee.std) {
            return Some(SkipReason::Std);
        }
        let base = options.base_module.as_str();
        if !caller.package.starts_with(base) || !callee.package.starts_with(base) {
            return Some(SkipReason::OutOfScope);
        }
        None
    }
}

/// Single-pass builder: push records, then [`GraphBuilder::finish`].
pub struct GraphBuilder {
    options: BuildOptions,
    assigner: ClusterAssigner,
    graph: Graph,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        let graph = Graph::new(options.title.clone(), options.graph.clone());
        Self {
            assigner: ClusterAssigner::new(options.group),
            options,
            graph,
            stats: BuildStats::default(),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Offer one record. Filtered records leave no trace besides the
    /// counters.
    pub fn push(&mut self, record: &CallEdgeRecord) {
        self.stats.visited += 1;

        if let Some(reason) = SkipReason::of(record, &self.options) {
            debug!(
                caller = %record.caller.id,
                callee = %record.callee.id,
                reason = %reason,
                "skip edge"
            );
            match reason {
                SkipReason::Malformed => self.stats.malformed += 1,
                SkipReason::Synthetic => self.stats.synthetic += 1,
                SkipReason::Std => self.stats.std += 1,
                SkipReason::OutOfScope => self.stats.out_of_scope += 1,
            }
            return;
        }
        self.stats.kept += 1;

        let from = self.resolve_node(&record.caller);
        let to = self.resolve_node(&record.callee);

        let key = EdgeKey {
            caller: record.caller.id.clone(),
            description: call_description(&record.site, &record.callee),
            callee: record.callee.id.clone(),
        };
        let line = call_site_line(&record.site, &record.callee);

        match record_call(
            &mut self.graph,
            from,
            to,
            key,
            edge_attrs(record.site.kind),
            &line,
        ) {
            EdgeOutcome::Created(_) => self.stats.edges += 1,
            EdgeOutcome::Merged(_) => self.stats.merged += 1,
        }
    }

    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a CallEdgeRecord>) {
        for record in records {
            self.push(record);
        }
    }

    /// Fold edge tooltips into caller nodes and hand out the graph.
    pub fn finish(self) -> (Graph, BuildStats) {
        let Self {
            mut graph, stats, ..
        } = self;

        fold_tooltips(&mut graph);

        info!(
            visited = stats.visited,
            kept = stats.kept,
            skipped = stats.skipped(),
            nodes = graph.node_count(),
            edges = stats.edges,
            merged = stats.merged,
            "call graph built"
        );
        (graph, stats)
    }

    fn resolve_node(&mut self, func: &FuncRef) -> NodeId {
        let group = self.assigner.group();
        let (id, created) = self.graph.node_entry(&func.id, || Node {
            id: func.id.clone(),
            attrs: node_attrs(func, group),
        });
        if created {
            let cluster = self.assigner.assign(&mut self.graph, func);
            self.graph.place_node(cluster, id);
        }
        id
    }
}

/// Build a graph from `records` in one go.
///
/// Only fails if the finished graph breaks its own invariants, which
/// indicates a bug rather than bad input.
pub fn build_graph<'a>(
    records: impl IntoIterator<Item = &'a CallEdgeRecord>,
    options: BuildOptions,
) -> Result<(Graph, BuildStats)> {
    let mut builder = GraphBuilder::new(options);
    builder.extend(records);
    let (graph, stats) = builder.finish();
    graph
        .validate()
        .map_err(|e| e.with_operation("collect::build_graph"))?;
    Ok((graph, stats))
}
