//! Cluster assignment by package and receiver type.

use tracing::debug;

use crate::attrs::Attrs;
use crate::graph::{Cluster, ClusterId, Graph};
use crate::types::{FuncRef, GroupBy};

/// Key of the top-level cluster every other cluster hangs off.
pub const ROOT_CLUSTER_KEY: &str = "focus";

pub(crate) fn root_attrs() -> Attrs {
    Attrs::from_pairs(&[
        ("bgcolor", "white"),
        ("label", ""),
        ("labelloc", "t"),
        ("labeljust", "c"),
        ("fontsize", "18"),
    ])
}

/// Places functions into the cluster tree according to a [`GroupBy`].
///
/// Package clusters are always the outer level; type clusters nest inside
/// the matching package cluster (or the root when packages are not
/// grouped).
#[derive(Debug, Clone, Copy)]
pub struct ClusterAssigner {
    group: GroupBy,
}

impl ClusterAssigner {
    pub fn new(group: GroupBy) -> Self {
        Self { group }
    }

    pub fn group(&self) -> GroupBy {
        self.group
    }

    /// Resolve (creating lazily) the cluster `func` belongs in.
    pub fn assign(&self, graph: &mut Graph, func: &FuncRef) -> ClusterId {
        let mut cluster = graph.root();
        if self.group.is_flat() {
            return cluster;
        }

        if self.group.pkg {
            cluster = graph.child_cluster(cluster, &func.package, || {
                debug!(package = %func.package, "new package cluster");
                package_cluster(func)
            });
        }

        if self.group.ty
            && let Some(receiver) = func.receiver.as_deref().filter(|r| !r.is_empty())
        {
            cluster = graph.child_cluster(cluster, receiver, || {
                debug!(receiver, "new type cluster");
                type_cluster(func, receiver)
            });
        }

        cluster
    }
}

fn package_cluster(func: &FuncRef) -> Cluster {
    let key = func.package.as_str();
    let label = if func.std {
        key
    } else {
        func.package_name.as_str()
    };

    let mut attrs = Attrs::from_pairs(&[
        ("penwidth", "0.8"),
        ("fontsize", "16"),
        ("label", label),
        ("style", "filled"),
        ("fillcolor", "lightyellow"),
        ("fontname", "Tahoma bold"),
        ("rank", "sink"),
    ]);
    attrs.set("URL", format!("/?f={key}"));
    attrs.set("tooltip", format!("package: {key}"));
    if func.std {
        attrs.set("fillcolor", "#E0FFE1");
    }

    Cluster::new(key, attrs)
}

fn type_cluster(func: &FuncRef, receiver: &str) -> Cluster {
    let name = func.relative_name();
    let label = name.split('.').next().unwrap_or(name);

    let mut attrs = Attrs::from_pairs(&[
        ("penwidth", "0.5"),
        ("fontsize", "15"),
        ("fontcolor", "#222222"),
        ("label", label),
        ("labelloc", "b"),
        ("style", "rounded,filled"),
        ("fillcolor", "wheat2"),
    ]);
    attrs.set("tooltip", format!("type: {receiver}"));
    if func.std {
        attrs.set("fillcolor", "#c2e3c2");
    }

    Cluster::new(receiver, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphConfig;

    fn graph() -> Graph {
        Graph::new("test", GraphConfig::default())
    }

    #[test]
    fn test_flat_grouping_uses_root() {
        let mut g = graph();
        let assigner = ClusterAssigner::new(GroupBy::NONE);
        let f = FuncRef::method("x", "T", "M", true);
        assert_eq!(assigner.assign(&mut g, &f), g.root());
        assert_eq!(g.clusters().len(), 1);
    }

    #[test]
    fn test_package_cluster_is_reused() {
        let mut g = graph();
        let assigner = ClusterAssigner::new(GroupBy {
            pkg: true,
            ty: false,
        });
        let a = FuncRef::function("example.com/app/util", "A");
        let b = FuncRef::function("example.com/app/util", "B");

        let first = assigner.assign(&mut g, &a);
        let second = assigner.assign(&mut g, &b);
        assert_eq!(first, second);

        let cluster = g.cluster(first);
        assert_eq!(cluster.key, "example.com/app/util");
        assert_eq!(cluster.dot_id(), "cluster_example.com/app/util");
        assert_eq!(cluster.attrs.get("label"), Some("util"));
        assert_eq!(cluster.attrs.get("fillcolor"), Some("lightyellow"));
        assert_eq!(cluster.attrs.get("URL"), Some("/?f=example.com/app/util"));
        assert_eq!(
            cluster.attrs.get("tooltip"),
            Some("package: example.com/app/util")
        );
    }

    #[test]
    fn test_std_package_cluster() {
        let mut g = graph();
        let assigner = ClusterAssigner::new(GroupBy {
            pkg: true,
            ty: false,
        });
        let f = FuncRef::function("encoding/json", "Marshal").with_std(true);
        let id = assigner.assign(&mut g, &f);
        let cluster = g.cluster(id);
        assert_eq!(cluster.attrs.get("label"), Some("encoding/json"));
        assert_eq!(cluster.attrs.get("fillcolor"), Some("#E0FFE1"));
    }

    #[test]
    fn test_type_cluster_nests_under_package() {
        let mut g = graph();
        let assigner = ClusterAssigner::new(GroupBy { pkg: true, ty: true });
        let m = FuncRef::method("x/srv", "Server", "Run", true);
        let free = FuncRef::function("x/srv", "New");

        let ty = assigner.assign(&mut g, &m);
        let pkg = assigner.assign(&mut g, &free);

        assert_eq!(g.cluster(g.root()).children.get("x/srv"), Some(&pkg));
        assert_eq!(
            g.cluster(pkg).children.get("*x/srv.Server"),
            Some(&ty)
        );
        let cluster = g.cluster(ty);
        assert_eq!(cluster.attrs.get("label"), Some("(*Server)"));
        assert_eq!(cluster.attrs.get("style"), Some("rounded,filled"));
        assert_eq!(cluster.attrs.get("fillcolor"), Some("wheat2"));
        assert_eq!(cluster.attrs.get("tooltip"), Some("type: *x/srv.Server"));
    }

    #[test]
    fn test_type_only_grouping_hangs_off_root() {
        let mut g = graph();
        let assigner = ClusterAssigner::new(GroupBy {
            pkg: false,
            ty: true,
        });
        let m = FuncRef::method("bytes", "Buffer", "Write", true).with_std(true);
        let f = FuncRef::function("x", "main");

        let ty = assigner.assign(&mut g, &m);
        assert_eq!(g.cluster(g.root()).children.get("*bytes.Buffer"), Some(&ty));
        assert_eq!(g.cluster(ty).attrs.get("fillcolor"), Some("#c2e3c2"));
        assert_eq!(assigner.assign(&mut g, &f), g.root());
    }
}
