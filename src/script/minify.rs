//! Script concatenation and whitespace/comment minification.
//!
//! Identifiers are never renamed. Line breaks that separated tokens in the
//! source are kept (collapsed to one) so automatic semicolon insertion behaves
//! the same after minification.

use super::lexer::{tokenize, ScanError, TokenKind};
use crate::sourcemap::{inline_comment, utf16_len, CommentStyle, MapError};
use parcel_sourcemap::{OriginalLocation, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gap {
    None,
    Space,
    Newline,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#' || c == '\\'
}

/// Whether two adjacent characters would merge into a different token.
fn needs_space(prev: char, next: char) -> bool {
    (is_word_char(prev) && is_word_char(next))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
        || (prev == '/' && next == '/')
        || (prev.is_ascii_digit() && next == '.')
}

/// Concatenates and minifies scripts, optionally recording a source map.
#[derive(Default)]
pub struct ScriptBundle {
    out: String,
    line: u32,
    /// Column in UTF-16 code units
    column: u32,
    map: Option<SourceMap>,
}

impl ScriptBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_map(mut self) -> Self {
        self.map = Some(SourceMap::new("/"));
        self
    }

    fn write(&mut self, text: &str) {
        match text.rfind('\n') {
            Some(pos) => {
                self.line += text.matches('\n').count() as u32;
                self.column = utf16_len(&text[pos + 1..]);
            }
            None => self.column += utf16_len(text),
        }
        self.out.push_str(text);
    }

    /// Append one source file. `name` is recorded in the source map.
    pub fn add(&mut self, name: &str, source: &str) -> Result<(), ScanError> {
        let tokens = tokenize(source)?;
        let lines: Vec<&str> = source.split('\n').collect();
        let source_index = match self.map.as_mut() {
            Some(map) => {
                let index = map.add_source(name);
                // Fails only for an index the map does not know
                let _ = map.set_source_content(index as usize, source);
                Some(index)
            }
            None => None,
        };

        let mut gap = if self.out.is_empty() { Gap::None } else { Gap::Newline };
        for token in &tokens {
            match token.kind {
                TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => {
                    let this = if token.contains_newline() || token.kind == TokenKind::LineComment {
                        Gap::Newline
                    } else {
                        Gap::Space
                    };
                    gap = gap.max(this);
                }
                _ => {
                    let last = self.out.chars().next_back();
                    let first = token.text.chars().next().unwrap_or(' ');
                    match (gap, last) {
                        (_, None) | (_, Some('\n')) => {}
                        (Gap::Newline, Some(_)) => self.write("\n"),
                        (Gap::Space, Some(prev)) | (Gap::None, Some(prev)) if needs_space(prev, first) => {
                            self.write(" ")
                        }
                        _ => {}
                    }

                    if let (Some(map), Some(index)) = (self.map.as_mut(), source_index) {
                        let line_text = lines.get(token.line).copied().unwrap_or("");
                        let prefix: String = line_text.chars().take(token.column).collect();
                        let original = OriginalLocation::new(token.line as u32, utf16_len(&prefix), index, None);
                        map.add_mapping(self.line, self.column, Some(original));
                    }
                    self.write(&token.text);
                    gap = Gap::None;
                }
            }
        }

        Ok(())
    }

    /// Append a source without minifying it. No mappings are recorded.
    pub fn add_raw(&mut self, source: &str) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.write("\n");
        }
        self.write(source.trim_end_matches('\n'));
    }

    /// Finish the bundle. With a source map, it is inlined at the end of the code.
    pub fn finish(mut self) -> Result<String, MapError> {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }

        match self.map.as_mut() {
            Some(map) => {
                let json = map.to_json(None)?;
                Ok(format!("{}{}", self.out.trim_end_matches('\n'), inline_comment(&json, CommentStyle::Script)))
            }
            None => Ok(self.out),
        }
    }
}

/// Minify a single script.
pub fn minify(source: &str) -> Result<String, ScanError> {
    let mut bundle = ScriptBundle::new();
    bundle.add("input.js", source)?;
    Ok(bundle.out)
}
