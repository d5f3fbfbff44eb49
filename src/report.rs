use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::{BatchOptions, BatchStrategy};
use crate::classification::RewriteBlocker;
use crate::query::ParsedStatement;
use crate::segment::Segment;

/// Analysis of one statement of an input file.
#[derive(Debug, Clone)]
pub struct StatementReport {
    /// 1-based line the statement starts on.
    pub line: usize,
    pub statement: Arc<ParsedStatement>,
}

impl StatementReport {
    pub fn parameter_count(&self) -> usize {
        self.statement.parameter_count()
    }

    pub fn blocker(&self) -> Option<RewriteBlocker> {
        self.statement.blocker()
    }

    /// A parameterized INSERT that cannot be batched by rewriting.
    pub fn fails_check(&self) -> bool {
        self.statement.classification.is_insert_statement
            && self.parameter_count() > 0
            && !self.statement.is_rewritable()
    }

    /// `rewritable` or `not rewritable (<reason>)`.
    pub fn status_text(&self) -> String {
        match self.blocker() {
            None => "rewritable".to_string(),
            Some(blocker) => format!("not rewritable ({})", blocker),
        }
    }

    /// Multi-line breakdown of the segments, rewrite template and the batch
    /// strategy `options` would select.
    pub fn explain(&self, options: &BatchOptions) -> String {
        let stmt = &self.statement;
        let mut out = String::new();
        for (i, segment) in stmt.segments.iter().enumerate() {
            let _ = match segment {
                Segment::Text(text) => writeln!(out, "  [{}] text {:?}", i, text),
                Segment::Parameter => writeln!(out, "  [{}] parameter", i),
            };
        }
        if let Some(template) = stmt.rewrite_template() {
            let _ = writeln!(out, "  prefix {:?}", template.prefix);
            let tuple: String = template
                .tuple
                .iter()
                .map(|s| s.text().unwrap_or("?"))
                .collect();
            let _ = writeln!(out, "  tuple  {:?}", tuple);
            let _ = writeln!(out, "  suffix {:?}", template.suffix);
        }
        let _ = writeln!(out, "  batch  {:?}", BatchStrategy::choose(stmt, options));
        out
    }
}

/// Status of analyzing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Analyzed,
    /// An error occurred while reading the file.
    Error,
}

/// Result of analyzing a single file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    pub statements: Vec<StatementReport>,
    pub error: Option<String>,
}

impl FileResult {
    pub fn analyzed(path: PathBuf, statements: Vec<StatementReport>) -> Self {
        Self {
            path,
            status: FileStatus::Analyzed,
            statements,
            error: None,
        }
    }

    pub fn error(path: PathBuf, error: String) -> Self {
        Self {
            path,
            status: FileStatus::Error,
            statements: Vec::new(),
            error: Some(error),
        }
    }
}

/// Aggregated report of analysis results.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn statements(&self) -> impl Iterator<Item = &StatementReport> {
        self.results.iter().flat_map(|r| r.statements.iter())
    }

    pub fn rewritable(&self) -> usize {
        self.statements()
            .filter(|s| s.statement.is_rewritable())
            .count()
    }

    pub fn check_failures(&self) -> usize {
        self.statements().filter(|s| s.fails_check()).count()
    }

    pub fn errors(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == FileStatus::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("{} file(s) processed", self.total()));
        parts.push(format!("{} statement(s)", self.statements().count()));
        if self.rewritable() > 0 {
            parts.push(format!("{} rewritable", self.rewritable()));
        }
        if self.check_failures() > 0 {
            parts.push(format!(
                "{} parameterized insert(s) not rewritable",
                self.check_failures()
            ));
        }
        if self.errors() > 0 {
            parts.push(format!("{} error(s)", self.errors()));
        }
        parts.join(", ")
    }

    /// Print error details.
    pub fn print_errors(&self) {
        for result in &self.results {
            if let Some(ref error) = result.error {
                eprintln!("error: {}: {}", result.path.display(), error);
            }
        }
    }
}
