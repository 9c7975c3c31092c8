//! Edge-stream decoding: a JSON array, or JSON lines with one record each.

use std::fs;
use std::io::{self, Read};

use rayon::prelude::*;
use serde_json::error::Category;
use tracing::debug;

use callvis_collect::CallEdgeRecord;
use callvis_error::{Error, Result};

/// Path meaning "read standard input".
pub const STDIN: &str = "-";

/// Read the whole input named by `path`, or stdin for `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == STDIN {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| Error::from(e).with_operation("input::read_input"))?;
        return Ok(text);
    }

    fs::read_to_string(path).map_err(|e| {
        Error::from(e)
            .with_operation("input::read_input")
            .with_context("path", path)
    })
}

/// Decode records, preserving input order.
///
/// Text whose first non-blank character is `[` is a JSON array; anything
/// else is JSON lines, decoded in parallel. Blank lines are ignored.
pub fn decode_records(text: &str) -> Result<Vec<CallEdgeRecord>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| {
            let line = e.line();
            decode_error(e, line).with_operation("input::decode_records")
        });
    }

    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    debug!(lines = lines.len(), "decoding json lines");

    lines
        .par_iter()
        .map(|(line_no, line)| {
            serde_json::from_str::<CallEdgeRecord>(line)
                .map_err(|e| decode_error(e, *line_no).with_operation("input::decode_records"))
        })
        .collect()
}

/// Syntax errors are parse failures; well-formed JSON of the wrong shape is
/// a malformed record.
fn decode_error(err: serde_json::Error, line: usize) -> Error {
    let error = match err.classify() {
        Category::Data => Error::malformed_record(line, err.to_string()),
        Category::Io | Category::Syntax | Category::Eof => Error::parse_failed(err.to_string())
            .with_context("line", line.to_string()),
    };
    error.set_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callvis_collect::DispatchKind;
    use callvis_error::ErrorKind;

    const LINE_A: &str = r#"{"caller":{"id":"x.A","package":"x"},"callee":{"id":"x.B","package":"x"},"site":{"kind":"static","file":"a.go","line":1}}"#;
    const LINE_B: &str = r#"{"caller":{"id":"x.B","package":"x"},"callee":{"id":"x.C","package":"x"},"site":{"kind":"dynamic","file":"b.go","line":2}}"#;

    #[test]
    fn test_json_lines_keep_order() {
        let text = format!("{LINE_A}\n\n   \n{LINE_B}\n");
        let records = decode_records(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].caller.id, "x.A");
        assert_eq!(records[1].site.kind, DispatchKind::Dynamic);
    }

    #[test]
    fn test_json_array() {
        let text = format!("  [{LINE_A}, {LINE_B}]");
        let records = decode_records(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].callee.id, "x.C");
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_records("").unwrap().is_empty());
        assert!(decode_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let text = format!("{LINE_A}\n{{not json\n");
        let err = decode_records(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert!(err.context().contains(&("line", "2".to_string())));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let text = r#"{"caller":{"id":"x.A","line":"seven"}}"#;
        let err = decode_records(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInputRecord);
        assert!(err.context().contains(&("record", "1".to_string())));
    }

    #[test]
    fn test_null_identity_is_skipped_not_fatal() {
        let unresolved = r#"{"caller":{"id":null,"package":"x"},"callee":{"id":"x.B","package":"x"},"site":{"kind":"static","file":"c.go","line":3}}"#;
        let text = format!("{LINE_A}\n{unresolved}\n");
        let records = decode_records(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].caller.id.is_empty());

        let (graph, stats) =
            callvis_collect::build_graph(&records, callvis_collect::BuildOptions::default())
                .unwrap();
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_input("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
