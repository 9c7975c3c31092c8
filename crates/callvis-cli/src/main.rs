use std::time::Instant;

use clap::Parser;

use callvis::{
    CallvisOptions, FileConfig, FilterOptions, GraphOptions, resolve_build_options, run_main,
};
use callvis_error::Result;

#[derive(Parser, Debug)]
#[command(
    name = "callvis",
    about = "callvis: turn call edges into clustered Graphviz call graphs",
    version
)]
pub struct Cli {
    /// Call-edge input (JSON array or JSON lines); '-' reads stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    #[command(flatten)]
    filter: FilterOptions,

    #[command(flatten)]
    graph: GraphOptions,

    /// TOML config file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Output file path (writes to file instead of stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,

    /// Also render an image in this format with Graphviz (svg, png, ...)
    #[arg(long, value_name = "FORMAT")]
    render: Option<String>,

    /// Image file name without extension
    #[arg(long = "image-name", value_name = "NAME", default_value = "")]
    image_name: String,
}

pub fn run(args: Cli) -> Result<()> {
    let total_start = Instant::now();

    // Initialize tracing subscriber for logging
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let file = args.config.as_deref().map(FileConfig::from_path).transpose()?;
    let build = resolve_build_options(&args.filter, &args.graph, file.as_ref())?;

    let opts = CallvisOptions {
        input: args.input,
        output: args.output,
        render: args.render,
        image_name: args.image_name,
        build,
    };

    if let Some(image) = run_main(&opts)? {
        eprintln!("Image written to {}", image.display());
    }

    let total_secs = total_start.elapsed().as_secs_f64();
    tracing::info!(total_secs, "complete");
    Ok(())
}

pub fn main() {
    let args = Cli::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        tracing::error!(error = %e, "execution failed");
        std::process::exit(e.exit_code());
    }
}
