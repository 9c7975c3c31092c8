use std::fmt::Write as _;
use std::io::Write as _;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use similar::{ChangeTag, TextDiff};

use callvis::{FilterOptions, GraphOptions, decode_records, resolve_build_options};
use callvis_collect::{BuildStats, ClusterId, Graph, build_graph};
use callvis_dot::render_graph;

use crate::corpus::{Corpus, CorpusCase, CorpusFile};

/// Expectation kinds a case may declare.
pub const EXPECTATION_KINDS: &[&str] = &["dot", "edges", "clusters", "stats"];

/// A case's `args:` line, parsed with the same options as the `callvis` binary.
#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
struct CaseArgs {
    #[command(flatten)]
    filter: FilterOptions,

    #[command(flatten)]
    graph: GraphOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Only run cases whose id contains this substring
    pub filter: Option<String>,
    /// Rewrite mismatching expectations with the actual output
    pub update: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed,
    Updated,
    NoExpectations,
}

#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub id: String,
    pub status: CaseStatus,
    pub message: Option<String>,
}

pub fn run_cases(corpus: &mut Corpus, config: RunnerConfig) -> Result<Vec<CaseOutcome>> {
    let mut outcomes = Vec::new();
    let mut matched = 0usize;

    for file in corpus.files_mut() {
        outcomes.extend(run_cases_in_file(
            file,
            config.update,
            config.filter.as_deref(),
            &mut matched,
        )?);
    }

    if matched == 0 {
        return Err(anyhow!(
            "no callvis-test cases matched filter {:?}",
            config.filter
        ));
    }

    Ok(outcomes)
}

fn run_cases_in_file(
    file: &mut CorpusFile,
    update: bool,
    filter: Option<&str>,
    matched: &mut usize,
) -> Result<Vec<CaseOutcome>> {
    let mut outcomes = Vec::new();
    let mut dirty = false;

    for case in file.cases.iter_mut() {
        if filter.is_some_and(|term| !case.id().contains(term)) {
            continue;
        }

        *matched += 1;
        print!("  {} ... ", case.id());
        let _ = std::io::stdout().flush();

        let (outcome, mutated) = evaluate_case(case, update)?;

        match outcome.status {
            CaseStatus::Passed => println!("ok"),
            CaseStatus::Updated => println!("updated"),
            CaseStatus::Failed => {
                println!("FAILED");
                if let Some(message) = &outcome.message {
                    for line in message.lines() {
                        println!("        {line}");
                    }
                }
            }
            CaseStatus::NoExpectations => println!("skipped (no expectations)"),
        }

        dirty |= mutated;
        outcomes.push(outcome);
    }

    if dirty {
        file.mark_dirty();
    }
    Ok(outcomes)
}

fn evaluate_case(case: &mut CorpusCase, update: bool) -> Result<(CaseOutcome, bool)> {
    let case_id = case.id();

    if case.expectations.is_empty() {
        return Ok((
            CaseOutcome {
                id: case_id,
                status: CaseStatus::NoExpectations,
                message: Some("no expectation blocks declared".to_string()),
            },
            false,
        ));
    }

    let summary = build_case_summary(case)?;
    let mut mutated = false;
    let mut status = CaseStatus::Passed;
    let mut failures = Vec::new();

    for expect in &mut case.expectations {
        let actual = render_expectation(&expect.kind, &summary, &case_id)?;
        let expected_norm = normalize(&expect.value);
        let actual_norm = normalize(&actual);

        if expected_norm == actual_norm {
            continue;
        }

        if update {
            expect.value = ensure_trailing_newline(actual);
            mutated = true;
            status = CaseStatus::Updated;
        } else {
            status = CaseStatus::Failed;
            failures.push(format_expectation_diff(
                &expect.kind,
                &expected_norm,
                &actual_norm,
            ));
        }
    }

    let message = (!failures.is_empty()).then(|| failures.join("\n"));
    Ok((
        CaseOutcome {
            id: case_id,
            status,
            message,
        },
        mutated,
    ))
}

/// Everything any expectation kind can be rendered from.
struct CaseSummary {
    graph: Graph,
    stats: BuildStats,
    dot: String,
}

fn build_case_summary(case: &CorpusCase) -> Result<CaseSummary> {
    let args = CaseArgs::try_parse_from(&case.args)
        .map_err(|err| anyhow!("invalid args for {}: {}", case.id(), err))?;
    let options = resolve_build_options(&args.filter, &args.graph, None)
        .map_err(|err| anyhow!("invalid options for {}: {}", case.id(), err))?;

    // files are concatenated in declaration order
    let mut records = Vec::new();
    for file in &case.files {
        let decoded = decode_records(&file.contents)
            .map_err(|err| anyhow!("{}: {}", file.path, err))
            .with_context(|| format!("failed to decode input for {}", case.id()))?;
        records.extend(decoded);
    }

    let (graph, stats) =
        build_graph(&records, options).map_err(|err| anyhow!("{}: {}", case.id(), err))?;
    let dot = render_graph(&graph).map_err(|err| anyhow!("{}: {}", case.id(), err))?;

    Ok(CaseSummary { graph, stats, dot })
}

fn render_expectation(kind: &str, summary: &CaseSummary, case_id: &str) -> Result<String> {
    match kind {
        "dot" => Ok(summary.dot.clone()),
        "edges" => Ok(render_edges_snapshot(&summary.graph)),
        "clusters" => Ok(render_clusters_snapshot(&summary.graph)),
        "stats" => Ok(render_stats_snapshot(&summary.stats)),
        other => Err(anyhow!(
            "case {case_id} uses unsupported expectation '{other}' (expected one of {})",
            EXPECTATION_KINDS.join(", ")
        )),
    }
}

/// `caller -> callee [description] sites=N`, one line per logical edge.
fn render_edges_snapshot(graph: &Graph) -> String {
    if graph.edge_count() == 0 {
        return "none\n".to_string();
    }

    let mut buf = String::new();
    for edge in graph.edges() {
        let sites = edge
            .attrs
            .get("tooltip")
            .map_or(0, |tooltip| tooltip.lines().count());
        let _ = writeln!(
            buf,
            "{} -> {} [{}] sites={}",
            edge.key.caller, edge.key.callee, edge.key.description, sites
        );
    }
    buf
}

/// Cluster tree: `[key]` per cluster, node ids beneath, two-space indent.
fn render_clusters_snapshot(graph: &Graph) -> String {
    fn walk(graph: &Graph, id: ClusterId, depth: usize, buf: &mut String) {
        let cluster = graph.cluster(id);
        let _ = writeln!(buf, "{:indent$}[{}]", "", cluster.key, indent = depth * 2);
        for node in &cluster.nodes {
            let _ = writeln!(
                buf,
                "{:indent$}{}",
                "",
                graph.node(*node).id,
                indent = (depth + 1) * 2
            );
        }
        for child in cluster.children.values() {
            walk(graph, *child, depth + 1, buf);
        }
    }

    let mut buf = String::new();
    walk(graph, graph.root(), 0, &mut buf);
    buf
}

fn render_stats_snapshot(stats: &BuildStats) -> String {
    let mut buf = String::new();
    for (name, value) in [
        ("visited", stats.visited),
        ("kept", stats.kept),
        ("malformed", stats.malformed),
        ("synthetic", stats.synthetic),
        ("std", stats.std),
        ("out_of_scope", stats.out_of_scope),
        ("edges", stats.edges),
        ("merged", stats.merged),
    ] {
        let _ = writeln!(buf, "{name}={value}");
    }
    buf
}

fn format_expectation_diff(kind: &str, expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut buf = String::new();
    let _ = writeln!(buf, "Expectation '{kind}' mismatch:");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        let _ = write!(buf, "{sign}{change}");
        if change.missing_newline() {
            buf.push('\n');
        }
    }
    buf
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_args_parse() {
        let args = CaseArgs::try_parse_from([
            "--group",
            "pkg,type",
            "--base-module",
            "x",
            "--rankdir",
            "TB",
            "--include-std",
        ])
        .unwrap();
        assert_eq!(args.filter.group, vec!["pkg,type"]);
        assert_eq!(args.filter.base_module.as_deref(), Some("x"));
        assert!(args.filter.include_std);
        assert!(args.graph.rankdir.is_some());

        assert!(CaseArgs::try_parse_from(["--depth", "3"]).is_err());
        assert!(CaseArgs::try_parse_from(["--include-std", "--omit-std"]).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a\r\nb\n\n"), "a\nb");
    }

    #[test]
    fn test_diff_marks_changes() {
        let diff = format_expectation_diff("stats", "kept=1\nedges=1", "kept=2\nedges=1");
        assert!(diff.starts_with("Expectation 'stats' mismatch:\n"));
        assert!(diff.contains("-kept=1\n"));
        assert!(diff.contains("+kept=2\n"));
        assert!(diff.contains(" edges=1\n"));
    }
}
