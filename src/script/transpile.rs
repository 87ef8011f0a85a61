//! JSX and modern syntax lowering.
//!
//! Sources are parsed and transformed by oxc: JSX becomes classic
//! `React.createElement` calls and newer syntax is lowered to ES2015.

use crate::diagnostic::Diagnostic;
use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{JsxRuntime, TransformOptions, Transformer};
use std::path::Path;

/// Syntax level of transpiled output.
pub const TARGET: &str = "es2015";

fn transform_options() -> TransformOptions {
    let mut options = TransformOptions::from_target(TARGET).unwrap_or_default();
    options.jsx.jsx_plugin = true;
    options.jsx.runtime = JsxRuntime::Classic;
    options
}

/// Transpile one source. Parse and transform failures come back as syntax
/// diagnostics positioned in the original text.
pub fn transpile(path: &Path, source: &str) -> Result<String, Vec<Diagnostic>> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs()).with_jsx(true);

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(to_diagnostics(path, source, &parsed.errors));
    }
    let mut program = parsed.program;

    let (symbols, scopes) = SemanticBuilder::new().build(&program).semantic.into_symbol_table_and_scope_tree();
    let transformed = Transformer::new(&allocator, path, &transform_options())
        .build_with_symbols_and_scopes(symbols, scopes, &mut program);
    if !transformed.errors.is_empty() {
        return Err(to_diagnostics(path, source, &transformed.errors));
    }

    tracing::trace!("transpiled {}", path.display());
    Ok(Codegen::new().build(&program).code)
}

fn to_diagnostics(path: &Path, source: &str, errors: &[OxcDiagnostic]) -> Vec<Diagnostic> {
    errors
        .iter()
        .map(|error| {
            let offset = error.labels.as_ref().and_then(|labels| labels.first()).map_or(0, |label| label.offset());
            let (line, column) = line_column(source, offset);
            Diagnostic::syntax(path, line, column, error.message.to_string())
        })
        .collect()
}

/// 1-based line and column (in chars) of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str = "function Hello(props) {\n  \
                             return <div className=\"greeting\">Hello, {props.name}</div>;\n}\n";

    #[test]
    fn test_jsx_becomes_create_element() {
        let code = transpile(Path::new("app/hello.jsx"), COMPONENT).unwrap();
        assert!(code.contains("React.createElement"), "{}", code);
        assert!(code.contains("\"greeting\""), "{}", code);
        assert!(!code.contains("</div>"), "{}", code);
    }

    #[test]
    fn test_plain_script_survives() {
        let code = transpile(Path::new("app/app.js"), "angular.module('app', []);\n").unwrap();
        assert!(code.contains("angular.module("), "{}", code);
        assert!(code.contains("app"), "{}", code);
    }

    #[test]
    fn test_syntax_error_is_positioned() {
        let source = "var ok = 1;\nvar broken = <div>;\n";
        let diagnostics = transpile(Path::new("app/broken.jsx"), source).unwrap_err();
        assert!(!diagnostics.is_empty());
        assert_eq!(diagnostics[0].rule, "syntax");
        assert_eq!(diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
        assert_eq!(line_column("é\nx", 3), (2, 1));
    }
}
