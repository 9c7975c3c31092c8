//! Shared CLI options for callvis tools.
//!
//! These are flattened into both the `callvis` binary and the corpus runner
//! so a corpus case's `args:` line means the same thing as a command line.

use clap::Args;

use callvis_collect::{BuildOptions, GraphConfig, GroupBy, RankDir};
use callvis_error::Result;

use crate::config::FileConfig;

/// Which edges make it into the graph, and how they are grouped.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterOptions {
    /// Keep only functions whose package path starts with this prefix.
    #[arg(long = "base-module", value_name = "PREFIX")]
    pub base_module: Option<String>,

    /// Grouping levels: 'pkg', 'type' (repeatable or comma-separated).
    #[arg(
        long = "group",
        value_name = "pkg,type",
        action = clap::ArgAction::Append
    )]
    pub group: Vec<String>,

    /// Keep calls into and out of the standard library.
    #[arg(long = "include-std")]
    pub include_std: bool,

    /// Drop the standard library even when the config file keeps it.
    #[arg(long = "omit-std", conflicts_with = "include_std")]
    pub omit_std: bool,

    /// Graph title (defaults to the base module).
    #[arg(long)]
    pub title: Option<String>,
}

/// Layout knobs written into the DOT header.
#[derive(Args, Debug, Clone, Default)]
pub struct GraphOptions {
    /// Minimum edge length in ranks.
    #[arg(long)]
    pub minlen: Option<u32>,

    /// Node separation in inches.
    #[arg(long)]
    pub nodesep: Option<f64>,

    #[arg(long = "node-shape", value_name = "SHAPE")]
    pub node_shape: Option<String>,

    #[arg(long = "node-style", value_name = "STYLE")]
    pub node_style: Option<String>,

    /// Layout direction: LR, TB, RL or BT.
    #[arg(long, value_name = "DIR")]
    pub rankdir: Option<RankDir>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_module(mut self, base_module: impl Into<String>) -> Self {
        self.base_module = Some(base_module.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group.push(group.into());
        self
    }

    pub fn with_include_std(mut self, include_std: bool) -> Self {
        self.include_std = include_std;
        self
    }

    pub fn with_omit_std(mut self, omit_std: bool) -> Self {
        self.omit_std = omit_std;
        self
    }
}

/// Merge command-line options over the config file over built-in defaults.
pub fn resolve_build_options(
    filter: &FilterOptions,
    graph: &GraphOptions,
    file: Option<&FileConfig>,
) -> Result<BuildOptions> {
    let empty = FileConfig::default();
    let file = file.unwrap_or(&empty);

    let group = if !filter.group.is_empty() {
        GroupBy::parse(&filter.group)?
    } else if let Some(tokens) = &file.group {
        GroupBy::parse(tokens)?
    } else {
        GroupBy::NONE
    };

    let base_module = filter
        .base_module
        .clone()
        .or_else(|| file.base_module.clone())
        .unwrap_or_default();

    let title = filter
        .title
        .clone()
        .or_else(|| file.title.clone())
        .unwrap_or_else(|| base_module.clone());

    let include_std = if filter.include_std {
        true
    } else if filter.omit_std {
        false
    } else {
        file.include_std.unwrap_or(false)
    };

    Ok(BuildOptions::new()
        .with_group(group)
        .with_base_module(base_module)
        .with_omit_std(!include_std)
        .with_title(title)
        .with_graph(resolve_graph_config(graph, file)?))
}

fn resolve_graph_config(graph: &GraphOptions, file: &FileConfig) -> Result<GraphConfig> {
    let defaults = GraphConfig::default();
    let section = &file.graph;

    let rankdir = match graph.rankdir {
        Some(dir) => dir,
        None => section.rankdir()?.unwrap_or(defaults.rankdir),
    };

    Ok(GraphConfig {
        name: section.name.clone().unwrap_or(defaults.name),
        minlen: graph.minlen.or(section.minlen).unwrap_or(defaults.minlen),
        nodesep: graph.nodesep.or(section.nodesep).unwrap_or(defaults.nodesep),
        node_shape: graph
            .node_shape
            .clone()
            .or_else(|| section.node_shape.clone())
            .unwrap_or(defaults.node_shape),
        node_style: graph
            .node_style
            .clone()
            .or_else(|| section.node_style.clone())
            .unwrap_or(defaults.node_style),
        rankdir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use callvis_error::ErrorKind;

    #[test]
    fn test_defaults() {
        let options =
            resolve_build_options(&FilterOptions::new(), &GraphOptions::default(), None).unwrap();
        assert_eq!(options, BuildOptions::new());
    }

    #[test]
    fn test_title_falls_back_to_base_module() {
        let filter = FilterOptions::new().with_base_module("example.com/app");
        let options = resolve_build_options(&filter, &GraphOptions::default(), None).unwrap();
        assert_eq!(options.title, "example.com/app");
        assert!(options.omit_std);
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let file = FileConfig::parse(
            r#"
            base_module = "example.com/lib"
            group = ["type"]
            title = "from file"

            [graph]
            minlen = 4
            rankdir = "tb"
            "#,
        )
        .unwrap();
        let filter = FilterOptions::new()
            .with_base_module("example.com/app")
            .with_group("pkg");
        let graph = GraphOptions {
            minlen: Some(1),
            ..GraphOptions::default()
        };

        let options = resolve_build_options(&filter, &graph, Some(&file)).unwrap();
        assert_eq!(options.base_module, "example.com/app");
        assert_eq!(
            options.group,
            GroupBy {
                pkg: true,
                ty: false
            }
        );
        assert_eq!(options.title, "from file");
        assert_eq!(options.graph.minlen, 1);
        assert_eq!(options.graph.rankdir, RankDir::TB);
        assert_eq!(options.graph.nodesep, 0.35);
    }

    #[test]
    fn test_std_flags_override_file() {
        let file = FileConfig::parse("include_std = true").unwrap();
        let graph = GraphOptions::default();

        let options = resolve_build_options(&FilterOptions::new(), &graph, Some(&file)).unwrap();
        assert!(!options.omit_std);

        let filter = FilterOptions::new().with_omit_std(true);
        let options = resolve_build_options(&filter, &graph, Some(&file)).unwrap();
        assert!(options.omit_std);

        let filter = FilterOptions::new().with_include_std(true);
        let options = resolve_build_options(&filter, &graph, None).unwrap();
        assert!(!options.omit_std);
    }

    #[test]
    fn test_bad_group_token() {
        let filter = FilterOptions::new().with_group("pkg,file");
        let err = resolve_build_options(&filter, &GraphOptions::default(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}
