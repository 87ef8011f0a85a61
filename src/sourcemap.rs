//! Source map support shared by script and style output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parcel_sourcemap::SourceMapError;
use thiserror::Error;

/// A source map could not be built or serialized.
#[derive(Debug, Error)]
#[error("failed to encode source map: {message}")]
pub struct MapError {
    pub message: String,
}

impl From<SourceMapError> for MapError {
    fn from(e: SourceMapError) -> Self {
        MapError { message: format!("{:?}", e) }
    }
}

/// Width of `text` in UTF-16 code units, the unit of source map columns.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

/// Comment syntax for the trailing `sourceMappingURL` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Script,
    Style,
}

/// Inline a JSON source map as a `data:` URL comment.
pub fn inline_comment(map_json: &str, style: CommentStyle) -> String {
    let url = format!("data:application/json;charset=utf8;base64,{}", STANDARD.encode(map_json));
    match style {
        CommentStyle::Script => format!("\n//# sourceMappingURL={}\n", url),
        CommentStyle::Style => format!("\n/*# sourceMappingURL={} */\n", url),
    }
}
