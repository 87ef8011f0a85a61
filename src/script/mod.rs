//! Script handling: transpiling, linting, ordering, bundling.

pub mod lexer;
pub mod lint;
pub mod minify;
pub mod order;
pub mod transpile;

pub use lexer::{tokenize, ScanError, Token, TokenKind};
pub use minify::{minify, ScriptBundle};
pub use order::{order_by_dependencies, OrderError};
pub use transpile::transpile;

use crate::asset::Asset;
use crate::config::ScriptsConfig;
use crate::diagnostic::Diagnostic;

/// Transpile a source and lint the result.
///
/// Token rules run on the transpiled code, line rules on the original text.
/// The output asset has a `.js` extension. A source that does not transpile
/// yields no asset, only its syntax diagnostics.
pub fn validate(asset: &Asset, config: &ScriptsConfig) -> (Option<Asset>, Vec<Diagnostic>) {
    let source = asset.text();
    let code = match transpile(&asset.path, &source) {
        Ok(code) => code,
        Err(diagnostics) => return (None, diagnostics),
    };

    let diagnostics = match tokenize(&code) {
        Ok(tokens) => lint::lint(&asset.path, &source, &tokens, config),
        Err(e) => vec![Diagnostic::syntax(&asset.path, e.line, e.column, e.message)],
    };
    (Some(asset.clone().with_contents(code).with_extension("js")), diagnostics)
}
