pub mod corpus;
pub mod runner;

pub use corpus::{Corpus, CorpusCase, CorpusCaseExpectation, CorpusFile, TestFile};
pub use runner::{CaseOutcome, CaseStatus, EXPECTATION_KINDS, RunnerConfig, run_cases};
