//! Core processing pipeline: read → decode → build graph → serialize.

use std::time::Instant;

use tracing::info;

use callvis_collect::{BuildOptions, BuildStats, build_graph};
use callvis_dot::render_graph;
use callvis_error::Result;

use crate::input::{decode_records, read_input};

/// What one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dot: String,
    pub stats: BuildStats,
}

/// Run the whole pipeline over the input named by `input`.
pub fn process_input(input: &str, options: &BuildOptions) -> Result<PipelineOutput> {
    let read_start = Instant::now();
    let text = read_input(input)?;
    info!(
        input,
        bytes = text.len(),
        "Reading input: {:.2}s",
        read_start.elapsed().as_secs_f64()
    );

    process_text(&text, options)
}

/// Same as [`process_input`] for text already in memory.
pub fn process_text(text: &str, options: &BuildOptions) -> Result<PipelineOutput> {
    // 1. Decode
    let decode_start = Instant::now();
    let records = decode_records(text)?;
    info!(
        records = records.len(),
        "Decoding records: {:.2}s",
        decode_start.elapsed().as_secs_f64()
    );

    // 2. Build graph
    let build_start = Instant::now();
    let (graph, stats) = build_graph(&records, options.clone())?;
    info!(
        "Graph building: {:.2}s",
        build_start.elapsed().as_secs_f64()
    );

    // 3. Serialize
    let render_start = Instant::now();
    let dot = render_graph(&graph)?;
    info!(
        "DOT rendering: {:.2}s",
        render_start.elapsed().as_secs_f64()
    );

    Ok(PipelineOutput { dot, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_text_filters_and_renders() {
        let text = concat!(
            r#"{"caller":{"id":"x.A","package":"x","name":"A"},"callee":{"id":"x.B","package":"x","name":"B"},"site":{"kind":"static","file":"a.go","line":1}}"#,
            "\n",
            r#"{"caller":{"id":"x.A","package":"x","name":"A"},"callee":{"id":"fmt.Println","package":"fmt","std":true},"site":{"kind":"static","file":"a.go","line":2}}"#,
            "\n",
        );
        let output = process_text(text, &BuildOptions::new().with_base_module("x")).unwrap();
        assert_eq!(output.stats.visited, 2);
        assert_eq!(output.stats.std, 1);
        assert!(output.dot.contains(r#""x.A" -> "x.B""#));
        assert!(!output.dot.contains("fmt.Println"));
    }
}
