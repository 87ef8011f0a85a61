//! Markup handling: validation, minification and template scripting.

pub mod lexer;
pub mod lint;
pub mod minify;
pub mod templates;

pub use lexer::{tokenize, MarkupError, Node, NodeKind};
pub use minify::minify;

use crate::config::MarkupConfig;
use crate::diagnostic::Diagnostic;
use std::path::Path;

/// Whether a file is checked as a full page or as a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Document,
    Partial,
}

/// Check markup. A tokenizer failure yields a single syntax diagnostic.
pub fn check(file: &Path, source: &str, config: &MarkupConfig, kind: MarkupKind) -> Vec<Diagnostic> {
    match tokenize(source) {
        Ok(nodes) => lint::lint(file, &nodes, config, kind == MarkupKind::Document),
        Err(e) => vec![Diagnostic::syntax(file, e.line, e.column, e.message)],
    }
}
