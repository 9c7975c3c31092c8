//! Core types for call-edge ingestion.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};

use callvis_error::{Error, Result};

// Input records

/// `null` decodes like an absent field. Front ends emit `null` for
/// identities they could not resolve; such records are then skipped as
/// malformed by the builder instead of failing the whole stream.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a call site reaches its callee.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    /// Statically resolved callee
    #[default]
    Static,
    /// Interface or function-value call, no static callee
    Dynamic,
    /// `go f()` call site
    Go,
    /// `defer f()` call site
    Defer,
}

/// One endpoint (caller or callee) of a call edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncRef {
    /// Fully qualified function string, e.g. `(*example.com/app/srv.Server).Run`
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Name relative to the declaring package, e.g. `(*Server).Run`
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Package path; empty when the function has no resolvable package
    #[serde(deserialize_with = "null_as_default")]
    pub package: String,
    /// Short package name
    #[serde(deserialize_with = "null_as_default")]
    pub package_name: String,
    /// Belongs to the standard library
    pub std: bool,
    pub exported: bool,
    /// Receiver type string for methods (and closures inside methods)
    pub receiver: Option<String>,
    /// Enclosing function for closures
    pub parent: Option<String>,
    /// Non-empty for compiler-synthesized wrappers
    pub synthetic: Option<String>,
    /// Definition position
    #[serde(deserialize_with = "null_as_default")]
    pub file: String,
    pub line: u32,
}

impl FuncRef {
    /// A package-level function `package.name`.
    pub fn function(package: &str, name: &str) -> Self {
        Self {
            id: format!("{package}.{name}"),
            name: name.to_string(),
            package: package.to_string(),
            package_name: short_package_name(package).to_string(),
            ..Self::default()
        }
    }

    /// A method `name` on type `ty` declared in `package`.
    pub fn method(package: &str, ty: &str, name: &str, pointer: bool) -> Self {
        let (receiver, rel) = if pointer {
            (format!("*{package}.{ty}"), format!("(*{ty}).{name}"))
        } else {
            (format!("{package}.{ty}"), format!("({ty}).{name}"))
        };
        let id = if pointer {
            format!("(*{package}.{ty}).{name}")
        } else {
            format!("({package}.{ty}).{name}")
        };
        Self {
            id,
            name: rel,
            package: package.to_string(),
            package_name: short_package_name(package).to_string(),
            receiver: Some(receiver),
            ..Self::default()
        }
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn with_std(mut self, std: bool) -> Self {
        self.std = std;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_synthetic(mut self, tag: impl Into<String>) -> Self {
        self.synthetic = Some(tag.into());
        self
    }

    pub fn with_position(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Display name relative to the package, falling back to the full id.
    pub fn relative_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn has_receiver(&self) -> bool {
        self.receiver.as_deref().is_some_and(|r| !r.is_empty())
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Where and how a call happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSite {
    pub kind: DispatchKind,
    pub file: String,
    pub line: u32,
    /// Human-readable description; derived from `kind` when absent
    pub description: Option<String>,
}

impl CallSite {
    pub fn new(kind: DispatchKind, file: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            file: file.into(),
            line,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A raw caller → callee edge as produced by the analysis front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdgeRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub caller: FuncRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub callee: FuncRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub site: CallSite,
}

impl CallEdgeRecord {
    pub fn new(caller: FuncRef, callee: FuncRef, site: CallSite) -> Self {
        Self {
            caller,
            callee,
            site,
        }
    }
}

/// Last path segment of a package path (`a/b/c` → `c`).
pub fn short_package_name(package: &str) -> &str {
    package.rsplit('/').next().unwrap_or(package)
}

/// Final path component, used for call-site positions in tooltips.
pub(crate) fn file_basename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
}

// Grouping

/// Which cluster levels to build. Package is always the outer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupBy {
    pub pkg: bool,
    pub ty: bool,
}

impl GroupBy {
    pub const NONE: GroupBy = GroupBy {
        pkg: false,
        ty: false,
    };

    /// Parse grouping tokens (`pkg`, `type`). Each token may itself be a
    /// comma-separated list; empty entries are ignored.
    pub fn parse<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut group = GroupBy::NONE;
        for token in tokens {
            for part in token.as_ref().split(',') {
                match part.trim() {
                    "" => {}
                    "pkg" => group.pkg = true,
                    "type" => group.ty = true,
                    other => {
                        return Err(Error::invalid_configuration("group", other)
                            .with_operation("collect::GroupBy::parse"));
                    }
                }
            }
        }
        Ok(group)
    }

    pub fn is_flat(&self) -> bool {
        !self.pkg && !self.ty
    }
}

// Rendering configuration

/// Graph layout direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum RankDir {
    /// Left to right
    #[default]
    LR,
    /// Top to bottom
    TB,
    /// Right to left
    RL,
    /// Bottom to top
    BT,
}

/// Rendering options carried by the graph into the serializer header.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Name after `digraph`
    pub name: String,
    /// Minimum edge length in ranks
    pub minlen: u32,
    /// Node separation in inches
    pub nodesep: f64,
    pub node_shape: String,
    pub node_style: String,
    pub rankdir: RankDir,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "callgraph".to_string(),
            minlen: 2,
            nodesep: 0.35,
            node_shape: "box".to_string(),
            node_style: "filled,rounded".to_string(),
            rankdir: RankDir::LR,
        }
    }
}

// Build options

/// Everything the builder needs besides the edges themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub group: GroupBy,
    /// Only packages with this prefix are in scope; empty keeps everything.
    pub base_module: String,
    /// Drop edges touching the standard library.
    pub omit_std: bool,
    pub title: String,
    pub graph: GraphConfig,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            group: GroupBy::NONE,
            base_module: String::new(),
            omit_std: true,
            title: String::new(),
            graph: GraphConfig::default(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from raw grouping tokens and a base module, as supplied by
    /// the analysis front end.
    pub fn from_tokens<I, S>(tokens: I, base_module: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::default()
            .with_group(GroupBy::parse(tokens)?)
            .with_base_module(base_module))
    }

    pub fn with_group(mut self, group: GroupBy) -> Self {
        self.group = group;
        self
    }

    pub fn with_base_module(mut self, base_module: impl Into<String>) -> Self {
        self.base_module = base_module.into();
        self
    }

    pub fn with_omit_std(mut self, omit_std: bool) -> Self {
        self.omit_std = omit_std;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_graph(mut self, graph: GraphConfig) -> Self {
        self.graph = graph;
        self
    }
}

/// Counters gathered over one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Records offered to the builder
    pub visited: usize,
    /// Records that passed every filter
    pub kept: usize,
    pub malformed: usize,
    pub synthetic: usize,
    pub std: usize,
    pub out_of_scope: usize,
    /// Distinct edges in the finished graph
    pub edges: usize,
    /// Records folded into an existing edge
    pub merged: usize,
}

impl BuildStats {
    pub fn skipped(&self) -> usize {
        self.malformed + self.synthetic + self.std + self.out_of_scope
    }
}
