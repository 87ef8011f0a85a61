//! Lint and validation diagnostics.

use crate::config::ValidationLevel;
use std::collections::HashSet;
use std::path::PathBuf;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Map a configured rule level to a severity; `None` means the rule is off.
    pub fn from_level(level: ValidationLevel) -> Option<Severity> {
        match level {
            ValidationLevel::Error => Some(Severity::Error),
            ValidationLevel::Warn => Some(Severity::Warning),
            ValidationLevel::Ignore => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A problem found in a source file, with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Path to the file containing the problem
    pub file: PathBuf,
    /// Line number (1-indexed, None if unknown)
    pub line: Option<usize>,
    /// Column number (1-indexed, None if unknown)
    pub column: Option<usize>,
    /// Rule name, `syntax` for scanner failures
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        file: impl Into<PathBuf>,
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
            rule: rule.into(),
            severity,
            message: message.into(),
        }
    }

    /// A syntax error; always fatal.
    pub fn syntax(file: impl Into<PathBuf>, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(file, "syntax", Severity::Error, message).at(line, column)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(col) = self.column {
                write!(f, ":{}", col)?;
            }
        }
        write!(f, ": {} [{}] {}", self.severity, self.rule, self.message)
    }
}

/// Emit diagnostics through the log, errors first.
pub fn report(diagnostics: &[Diagnostic]) {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
    for diagnostic in sorted {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic),
            Severity::Warning => tracing::warn!("{}", diagnostic),
        }
    }
}

pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

/// Tracks files with errors across watch rebuilds to report recoveries.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    files_with_errors: HashSet<PathBuf>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the files that failed in the latest run of a binding.
    ///
    /// Only files matched by `scope` are replaced, so independent bindings do
    /// not clear each other's errors. Returns files that had errors before and
    /// no longer do.
    pub fn update<F>(&mut self, diagnostics: &[Diagnostic], scope: F) -> Vec<PathBuf>
    where
        F: Fn(&PathBuf) -> bool,
    {
        let current: HashSet<PathBuf> =
            diagnostics.iter().filter(|d| d.is_error()).map(|d| d.file.clone()).collect();

        let mut fixed: Vec<PathBuf> = self
            .files_with_errors
            .iter()
            .filter(|f| scope(f) && !current.contains(*f))
            .cloned()
            .collect();
        fixed.sort();

        self.files_with_errors.retain(|f| !scope(f));
        self.files_with_errors.extend(current);

        fixed
    }

    pub fn has_errors(&self) -> bool {
        !self.files_with_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.files_with_errors.len()
    }
}
