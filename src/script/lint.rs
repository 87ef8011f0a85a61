//! Token-level lint rules for scripts.

use super::lexer::{Token, TokenKind};
use crate::config::ScriptsConfig;
use crate::diagnostic::{Diagnostic, Severity};
use std::path::Path;

/// Run the configured rules over a tokenized script.
pub fn lint(file: &Path, source: &str, tokens: &[Token], config: &ScriptsConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let no_debugger = Severity::from_level(config.no_debugger);
    let eqeqeq = Severity::from_level(config.eqeqeq);
    let no_console = Severity::from_level(config.no_console);

    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.is_trivia()).collect();
    for (i, token) in significant.iter().enumerate() {
        let after_dot = i > 0 && (significant[i - 1].is_punct(".") || significant[i - 1].is_punct("?."));

        if let Some(severity) = no_debugger {
            if token.is_ident("debugger") && !after_dot {
                diagnostics.push(
                    Diagnostic::new(file, "no-debugger", severity, "unexpected 'debugger' statement")
                        .at(token.line + 1, token.column + 1),
                );
            }
        }

        if let Some(severity) = eqeqeq {
            if token.is_punct("==") || token.is_punct("!=") {
                let expected = if token.text == "==" { "===" } else { "!==" };
                diagnostics.push(
                    Diagnostic::new(
                        file,
                        "eqeqeq",
                        severity,
                        format!("expected '{}' and instead saw '{}'", expected, token.text),
                    )
                    .at(token.line + 1, token.column + 1),
                );
            }
        }

        if let Some(severity) = no_console {
            let next_is_dot = significant.get(i + 1).is_some_and(|t| t.is_punct("."));
            if token.kind == TokenKind::Ident && token.text == "console" && next_is_dot && !after_dot {
                diagnostics.push(
                    Diagnostic::new(file, "no-console", severity, "unexpected console statement")
                        .at(token.line + 1, token.column + 1),
                );
            }
        }
    }

    if let Some(severity) = Severity::from_level(config.no_trailing_spaces) {
        for (n, line) in source.lines().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() != line.len() {
                diagnostics.push(
                    Diagnostic::new(file, "no-trailing-spaces", severity, "trailing spaces not allowed")
                        .at(n + 1, trimmed.chars().count() + 1),
                );
            }
        }
    }

    diagnostics.sort_by_key(|d| (d.line, d.column));
    diagnostics
}
