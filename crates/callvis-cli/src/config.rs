//! TOML configuration file.
//!
//! ```toml
//! base_module = "example.com/app"
//! group = ["pkg", "type"]
//! include_std = false
//! title = "app"
//!
//! [graph]
//! name = "callgraph"
//! minlen = 2
//! nodesep = 0.35
//! node_shape = "box"
//! node_style = "filled,rounded"
//! rankdir = "LR"
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use callvis_collect::RankDir;
use callvis_error::{Error, Result};

/// Every field is optional; unset fields fall through to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_module: Option<String>,
    pub group: Option<Vec<String>>,
    pub include_std: Option<bool>,
    pub title: Option<String>,
    pub graph: GraphSection,
}

/// The `[graph]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSection {
    pub name: Option<String>,
    pub minlen: Option<u32>,
    pub nodesep: Option<f64>,
    pub node_shape: Option<String>,
    pub node_style: Option<String>,
    rankdir: Option<String>,
}

impl FileConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::FileConfig::from_path")
                .with_context("path", path.display().to_string())
        })?;
        Self::parse(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(text).map_err(|e| {
            Error::parse_failed(format!("invalid TOML: {}", e.message()))
                .with_operation("config::FileConfig::parse")
                .set_source(e)
        })?;
        // surface a bad direction at load time rather than at build time
        config.graph.rankdir()?;
        Ok(config)
    }
}

impl GraphSection {
    /// Parsed `rankdir`, case-insensitive.
    pub fn rankdir(&self) -> Result<Option<RankDir>> {
        self.rankdir
            .as_deref()
            .map(|dir| {
                RankDir::from_str(dir).map_err(|_| {
                    Error::invalid_configuration("rankdir", dir)
                        .with_operation("config::GraphSection::rankdir")
                })
            })
            .transpose()
    }
}
