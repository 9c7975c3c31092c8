//! callvis command-line interface.
//!
pub mod config;
pub mod input;
pub mod options;
pub mod output;
pub mod pipeline;

use std::path::PathBuf;

use tracing::info;

use callvis_collect::BuildOptions;
use callvis_error::Result;

pub use config::FileConfig;
pub use input::{decode_records, read_input};
pub use options::{FilterOptions, GraphOptions, resolve_build_options};
pub use output::{Renderer, write_output};
pub use pipeline::{PipelineOutput, process_input, process_text};

/// Options for running callvis.
#[derive(Debug, Clone)]
pub struct CallvisOptions {
    /// Input path, or `-` for stdin
    pub input: String,
    /// DOT output path; stdout when unset
    pub output: Option<String>,
    /// Image format to render with Graphviz, if any
    pub render: Option<String>,
    /// Image name without extension; empty picks a temp path
    pub image_name: String,
    pub build: BuildOptions,
}

/// Main entry point. Returns the rendered image path when `render` is set.
pub fn run_main(opts: &CallvisOptions) -> Result<Option<PathBuf>> {
    let PipelineOutput { dot, stats } = process_input(&opts.input, &opts.build)?;

    info!(
        kept = stats.kept,
        skipped = stats.skipped(),
        edges = stats.edges,
        "edges processed"
    );

    write_output(&dot, opts.output.as_deref())?;

    match opts.render.as_deref() {
        Some(format) => {
            let image = Renderer::graphviz().render_image(&dot, format, &opts.image_name)?;
            Ok(Some(image))
        }
        None => Ok(None),
    }
}
