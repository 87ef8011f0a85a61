//! Compile partials into a script that preloads them into `$templateCache`.

use crate::asset::{Asset, FileSet};
use crate::config::TemplatesConfig;
use std::path::Path;

/// Escape text for a single-quoted script string literal.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Build the templates script from (already minified) partials.
///
/// Every partial is registered under its path relative to its glob base. The
/// module is declared even when there are no partials so that application
/// modules listing it as a requirement still load.
pub fn to_script(partials: &FileSet, base: &Path, config: &TemplatesConfig) -> Asset {
    let mut script = format!(
        "angular.module('{}', []).run(['$templateCache', function($templateCache) {{\n",
        escape_string(&config.module)
    );
    for partial in partials {
        script.push_str(&format!(
            "  $templateCache.put('{}', '{}');\n",
            escape_string(&partial.relative_url()),
            escape_string(&partial.text())
        ));
    }
    script.push_str("}]);\n");

    Asset::new(base, base.join(&config.file), script.into_bytes())
}
