use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use shell_words::{join, split};
use walkdir::WalkDir;

/// Extension of corpus files under the corpus root.
pub const CORPUS_EXTENSION: &str = "callvis";

const CASE_BANNER: &str =
    "===============================================================================";

fn slugify_case_name(raw: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else if !slug.is_empty() {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "case".to_string()
    } else {
        slug
    }
}

/// All corpus files discovered under a root directory (e.g. `tests/corpus`).
pub struct Corpus {
    files: Vec<CorpusFile>,
}

impl Corpus {
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            bail!("corpus root {} does not exist", root.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_map(|res| res.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CORPUS_EXTENSION) {
                continue;
            }

            let rel = path.strip_prefix(root).unwrap_or(path);
            let suite = rel.with_extension("").to_string_lossy().replace('\\', "/");
            files.push(CorpusFile::load(path, suite)?);
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { files })
    }

    pub fn files(&self) -> &[CorpusFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [CorpusFile] {
        &mut self.files
    }

    pub fn case_count(&self) -> usize {
        self.files.iter().map(|f| f.cases.len()).sum()
    }

    /// Rewrite every file whose expectations were updated.
    pub fn write_updates(&mut self) -> Result<()> {
        for file in self.files.iter_mut().filter(|f| f.dirty) {
            fs::write(&file.path, file.render())
                .with_context(|| format!("failed to update {}", file.path.display()))?;
            file.dirty = false;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub suite: String,
    pub cases: Vec<CorpusCase>,
    dirty: bool,
}

impl CorpusFile {
    fn load(path: &Path, suite: String) -> Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cases = parse_corpus_file(&suite, &path, &content)?;
        Ok(Self {
            path,
            suite,
            cases,
            dirty: false,
        })
    }

    pub fn cases(&self) -> &[CorpusCase] {
        &self.cases
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn render(&self) -> String {
        let mut buf = self
            .cases
            .iter()
            .map(|case| case.render().trim_end_matches('\n').to_string())
            .collect::<Vec<_>>()
            .join("\n\n\n");
        buf.push('\n');
        buf
    }
}

/// One named case: CLI-style args, input files, expected outputs.
#[derive(Debug, Clone)]
pub struct CorpusCase {
    pub suite: String,
    pub name: String,
    pub args: Vec<String>,
    pub files: Vec<TestFile>,
    pub expectations: Vec<CorpusCaseExpectation>,
    /// Comment lines (starting with `$//`) preceding the case
    pub comments: Vec<String>,
}

impl CorpusCase {
    fn new(suite: &str, name: String, comments: Vec<String>) -> Self {
        Self {
            suite: suite.to_string(),
            name,
            args: Vec::new(),
            files: Vec::new(),
            expectations: Vec::new(),
            comments,
        }
    }

    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }

    pub fn expectation(&self, kind: &str) -> Option<&str> {
        self.expectations
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.value.as_str())
    }

    pub fn render(&self) -> String {
        let mut buf = String::new();
        for comment in &self.comments {
            buf.push_str(comment);
            buf.push('\n');
        }
        buf.push_str(CASE_BANNER);
        buf.push('\n');
        buf.push_str(&self.name);
        buf.push('\n');
        buf.push_str(CASE_BANNER);
        buf.push_str("\n\n");
        if !self.args.is_empty() {
            buf.push_str(&format!("args: {}\n\n", join(&self.args)));
        }

        let sections = self
            .files
            .iter()
            .map(|f| (format!("file: {}", f.path), &f.contents))
            .chain(
                self.expectations
                    .iter()
                    .map(|e| (format!("expect:{}", e.kind), &e.value)),
            );
        for (header, body) in sections {
            buf.push_str(&format!("--- {header} ---\n"));
            buf.push_str(body);
            if !body.ends_with('\n') {
                buf.push('\n');
            }
            buf.push('\n');
        }

        buf
    }
}

#[derive(Debug, Clone)]
pub struct TestFile {
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct CorpusCaseExpectation {
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone)]
enum SectionHeader {
    File { path: String },
    Expect { kind: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerState {
    None,
    AwaitingName,
    AwaitingClose,
}

/// Line-driven parser state for one corpus file.
struct CaseParser<'a> {
    suite: &'a str,
    path: &'a Path,
    cases: Vec<CorpusCase>,
    current: Option<CorpusCase>,
    section: Option<SectionHeader>,
    section_lines: Vec<String>,
    comments: Vec<String>,
    banner: BannerState,
}

impl<'a> CaseParser<'a> {
    fn new(suite: &'a str, path: &'a Path) -> Self {
        Self {
            suite,
            path,
            cases: Vec::new(),
            current: None,
            section: None,
            section_lines: Vec::new(),
            comments: Vec::new(),
            banner: BannerState::None,
        }
    }

    fn line(&mut self, raw: &str) -> Result<()> {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.starts_with("$//") {
            self.comments.push(line.to_string());
            return Ok(());
        }

        match self.banner {
            BannerState::AwaitingClose => {
                if trimmed.is_empty() {
                    return Ok(());
                }
                if !is_banner_line(line) {
                    bail!(
                        "expected closing banner after case '{}' in {}",
                        self.current.as_ref().map_or("unknown", |c| c.name.as_str()),
                        self.path.display()
                    );
                }
                self.banner = BannerState::None;
                return Ok(());
            }
            BannerState::AwaitingName => {
                if trimmed.is_empty() {
                    return Ok(());
                }
                self.start_case(slugify_case_name(trimmed))?;
                self.banner = BannerState::AwaitingClose;
                return Ok(());
            }
            BannerState::None => {}
        }

        if is_banner_line(line) {
            self.finish_case()?;
            self.banner = BannerState::AwaitingName;
            return Ok(());
        }

        if let Some(name) = parse_case_header(line) {
            return self.start_case(name);
        }

        if let Some(section) = parse_section_header(line) {
            self.finish_section()?;
            self.section = Some(section);
            return Ok(());
        }

        if self.section.is_some() {
            self.section_lines.push(line.to_string());
            return Ok(());
        }

        if trimmed.is_empty() {
            return Ok(());
        }
        self.metadata(line, trimmed)
    }

    fn metadata(&mut self, line: &str, trimmed: &str) -> Result<()> {
        let path = self.path;
        let case = self.current.as_mut().ok_or_else(|| {
            anyhow!("content encountered before case header in {}", path.display())
        })?;

        match trimmed.split_once(':') {
            Some(("args", value)) => {
                case.args = split(value.trim())
                    .map_err(|err| anyhow!("invalid args in {}: {}", path.display(), err))?;
                Ok(())
            }
            Some((other, _)) => Err(anyhow!(
                "unsupported metadata '{}' in {} case {}",
                other.trim(),
                path.display(),
                case.name
            )),
            None => Err(anyhow!(
                "unexpected line '{}' in {} (within case {})",
                line,
                path.display(),
                case.name
            )),
        }
    }

    fn start_case(&mut self, name: String) -> Result<()> {
        self.finish_case()?;
        let comments = std::mem::take(&mut self.comments);
        self.current = Some(CorpusCase::new(self.suite, name, comments));
        Ok(())
    }

    fn finish_case(&mut self) -> Result<()> {
        self.finish_section()?;
        if let Some(case) = self.current.take() {
            self.cases.push(case);
        }
        Ok(())
    }

    fn finish_section(&mut self) -> Result<()> {
        let Some(section) = self.section.take() else {
            self.section_lines.clear();
            return Ok(());
        };

        let case = self
            .current
            .as_mut()
            .ok_or_else(|| anyhow!("section declared before any case header"))?;

        let mut content = self.section_lines.join("\n");
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        self.section_lines.clear();

        match section {
            SectionHeader::File { path } => case.files.push(TestFile {
                path,
                contents: content,
            }),
            SectionHeader::Expect { kind } => {
                case.expectations.push(CorpusCaseExpectation {
                    kind,
                    value: content,
                })
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<CorpusCase>> {
        if self.banner != BannerState::None {
            bail!(
                "unterminated banner in {} (missing case name or closing separator)",
                self.path.display()
            );
        }
        self.finish_case()?;

        if self.cases.is_empty() {
            bail!("corpus file {} does not contain any cases", self.path.display());
        }
        if let Some(case) = self.cases.iter().find(|c| c.files.is_empty()) {
            bail!(
                "case {} in {} does not declare any files",
                case.id(),
                self.path.display()
            );
        }
        Ok(self.cases)
    }
}

fn parse_corpus_file(suite: &str, path: &Path, content: &str) -> Result<Vec<CorpusCase>> {
    let mut parser = CaseParser::new(suite, path);
    for line in content.lines() {
        parser.line(line)?;
    }
    parser.finish()
}

/// Single-line form: `=== name ===`.
fn parse_case_header(line: &str) -> Option<String> {
    if !line.starts_with("===") || !line.ends_with("===") {
        return None;
    }
    let name = line.trim_matches('=').trim();
    (!name.is_empty()).then(|| slugify_case_name(name))
}

fn is_banner_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 5 && trimmed.chars().all(|ch| ch == '=')
}

fn parse_section_header(line: &str) -> Option<SectionHeader> {
    if !line.starts_with("---") || !line.ends_with("---") {
        return None;
    }

    let inner = line.trim_matches('-').trim();
    if let Some(rest) = inner.strip_prefix("file:") {
        return Some(SectionHeader::File {
            path: rest.trim().to_string(),
        });
    }
    inner.strip_prefix("expect:").map(|rest| SectionHeader::Expect {
        kind: rest.trim().to_string(),
    })
}
