//! Flag → visual attribute mapping for nodes and edges.
//!
//! Everything here is pure: any combination of flags yields a valid
//! attribute set.

use crate::attrs::Attrs;
use crate::types::{CallSite, DispatchKind, FuncRef, GroupBy, file_basename};

/// Fill for standard-library functions.
pub const STD_FILL: &str = "#adedad";
/// Fill for everything else.
pub const USER_FILL: &str = "moccasin";

/// Node label: the package-relative name, shortened to the method name
/// under type grouping and prefixed with the package name when packages
/// are not clustered.
pub fn node_label(func: &FuncRef, group: GroupBy) -> String {
    let mut label = func.relative_name();

    if group.ty && func.has_receiver() {
        label = label.rsplit('.').next().unwrap_or(label);
    }

    if group.pkg {
        label.to_string()
    } else {
        format!("{}\n{}", func.package_name, label)
    }
}

/// Initial node attributes for `func`.
pub fn node_attrs(func: &FuncRef, group: GroupBy) -> Attrs {
    let mut attrs = Attrs::new();

    attrs.set("fillcolor", if func.std { STD_FILL } else { USER_FILL });
    attrs.set("label", node_label(func, group));

    if func.parent.is_some() {
        attrs.set("style", "dotted,filled");
    } else if func.exported {
        attrs.set("penwidth", "1.5");
    } else {
        attrs.set("penwidth", "0.5");
    }

    attrs.set(
        "tooltip",
        format!(
            "{} | defined in {}:{}",
            func.id,
            file_basename(&func.file),
            func.line
        ),
    );
    attrs
}

/// Edge attributes for a dispatch kind.
pub fn edge_attrs(kind: DispatchKind) -> Attrs {
    let mut attrs = Attrs::new();
    match kind {
        DispatchKind::Static => {}
        DispatchKind::Dynamic => {
            attrs.set("style", "dashed");
        }
        DispatchKind::Go => {
            attrs.set("arrowhead", "normalnoneodot");
        }
        DispatchKind::Defer => {
            attrs.set("arrowhead", "normalnoneodiamond");
        }
    }
    attrs
}

/// Description used in the logical edge key. Taken from the record when
/// present, otherwise derived from the dispatch kind.
pub fn call_description(site: &CallSite, callee: &FuncRef) -> String {
    if let Some(description) = site.description.as_deref().filter(|d| !d.is_empty()) {
        return description.to_string();
    }

    let target = if callee.has_receiver() {
        "method"
    } else {
        "function"
    };
    match site.kind {
        DispatchKind::Static => format!("static {target} call"),
        DispatchKind::Dynamic => format!("dynamic {target} call"),
        DispatchKind::Go => format!("concurrent static {target} call"),
        DispatchKind::Defer => format!("deferred static {target} call"),
    }
}

/// One tooltip line describing a call site.
pub fn call_site_line(site: &CallSite, callee: &FuncRef) -> String {
    format!(
        "at {}:{}: calling [{}]",
        file_basename(&site.file),
        site.line,
        callee.id
    )
}
