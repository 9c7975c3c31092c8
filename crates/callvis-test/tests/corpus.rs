use std::path::PathBuf;

use callvis_test::{CaseStatus, Corpus, RunnerConfig, run_cases};

#[test]
fn corpus_cases_pass() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/corpus");
    let mut corpus = Corpus::load(&root).unwrap();
    assert!(corpus.case_count() > 0);

    let outcomes = run_cases(&mut corpus, RunnerConfig::default()).unwrap();
    let failed: Vec<_> = outcomes
        .iter()
        .filter(|outcome| outcome.status != CaseStatus::Passed)
        .map(|outcome| {
            format!(
                "{}: {}",
                outcome.id,
                outcome.message.as_deref().unwrap_or("")
            )
        })
        .collect();
    assert!(failed.is_empty(), "corpus failures:\n{}", failed.join("\n"));
}
