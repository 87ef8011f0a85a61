//! HTML tokenizer.
//!
//! Produces a flat node list. Contents of raw-text elements (`script`, `style`,
//! `textarea`, `pre`) are kept as a single text node so they can be preserved.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written
    pub name: String,
    pub value: Option<String>,
    /// Quote character used, if any
    pub quote: Option<char>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Doctype,
    Comment,
    /// Start tag; `name` is as written
    StartTag { name: String, attributes: Vec<Attribute>, self_closing: bool },
    EndTag { name: String },
    Text,
    /// Unparsed contents of a raw-text element
    RawText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Exact source text of the node
    pub raw: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Node {
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::StartTag { name, .. } | NodeKind::EndTag { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct MarkupError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Elements whose contents are not markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "pre"];

/// Elements that never have an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    nodes: Vec<Node>,
}

impl<'a> Tokenizer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn advance(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        for c in self.src[self.pos..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> MarkupError {
        MarkupError { line, column, message: message.into() }
    }

    fn push(&mut self, kind: NodeKind, start: usize, line: usize, column: usize) {
        let raw = self.src[start..self.pos].to_string();
        self.nodes.push(Node { kind, raw, line, column });
    }

    fn run(mut self) -> Result<Vec<Node>, MarkupError> {
        while self.pos < self.src.len() {
            let (start, line, column) = (self.pos, self.line, self.column);
            let rest = self.rest();

            if rest.starts_with("<!--") {
                let end = rest[4..]
                    .find("-->")
                    .ok_or_else(|| self.error(line, column, "unterminated comment"))?;
                self.advance(4 + end + 3);
                self.push(NodeKind::Comment, start, line, column);
            } else if rest.get(..9).is_some_and(|head| head.eq_ignore_ascii_case("<!doctype")) {
                let end = rest.find('>').ok_or_else(|| self.error(line, column, "unterminated doctype"))?;
                self.advance(end + 1);
                self.push(NodeKind::Doctype, start, line, column);
            } else if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let end = rest.find('>').ok_or_else(|| self.error(line, column, "unterminated end tag"))?;
                let name = rest[2..end].trim().to_string();
                self.advance(end + 1);
                self.push(NodeKind::EndTag { name }, start, line, column);
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let (name, attributes, self_closing) = self.scan_start_tag(line, column)?;
                self.push(
                    NodeKind::StartTag { name: name.clone(), attributes, self_closing },
                    start,
                    line,
                    column,
                );
                let lower = name.to_ascii_lowercase();
                if !self_closing && RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
                    self.scan_raw_text(&lower)?;
                }
            } else {
                let end = rest.char_indices().skip(1).find(|(_, c)| *c == '<').map_or(rest.len(), |(i, _)| i);
                self.advance(end);
                self.push(NodeKind::Text, start, line, column);
            }
        }
        Ok(self.nodes)
    }

    fn scan_start_tag(&mut self, line: usize, column: usize) -> Result<(String, Vec<Attribute>, bool), MarkupError> {
        self.advance(1);
        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(self.rest().len());
        let name = self.rest()[..name_len].to_string();
        self.advance(name_len);

        let mut attributes = Vec::new();
        loop {
            let ws = self.rest().len() - self.rest().trim_start().len();
            self.advance(ws);

            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(line, column, format!("unterminated <{}> tag", name)));
            }
            if rest.starts_with("/>") {
                self.advance(2);
                return Ok((name, attributes, true));
            }
            if rest.starts_with('>') {
                self.advance(1);
                return Ok((name, attributes, false));
            }
            if rest.starts_with('<') {
                return Err(self.error(line, column, format!("unterminated <{}> tag", name)));
            }

            let (attr_line, attr_column) = (self.line, self.column);
            let name_len = match rest.find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '<' || c == '/') {
                Some(0) | None if !rest.is_empty() => {
                    rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or(rest.len()).max(1)
                }
                Some(n) => n,
                None => rest.len(),
            };
            let attr_name = rest[..name_len].to_string();
            self.advance(name_len);

            let ws = self.rest().len() - self.rest().trim_start().len();
            let mut value = None;
            let mut quote = None;
            if self.rest()[ws..].starts_with('=') {
                self.advance(ws + 1);
                let ws = self.rest().len() - self.rest().trim_start().len();
                self.advance(ws);
                let rest = self.rest();
                match rest.chars().next() {
                    Some(q @ ('"' | '\'')) => {
                        let end = rest[1..].find(q).ok_or_else(|| {
                            self.error(attr_line, attr_column, format!("unterminated value for attribute '{}'", attr_name))
                        })?;
                        value = Some(rest[1..1 + end].to_string());
                        quote = Some(q);
                        self.advance(end + 2);
                    }
                    _ => {
                        let end = rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or(rest.len());
                        value = Some(rest[..end].to_string());
                        self.advance(end);
                    }
                }
            }

            attributes.push(Attribute { name: attr_name, value, quote, line: attr_line, column: attr_column });
        }
    }

    fn scan_raw_text(&mut self, name: &str) -> Result<(), MarkupError> {
        let closing = format!("</{}", name);
        let lower = self.rest().to_ascii_lowercase();
        let (start, line, column) = (self.pos, self.line, self.column);
        match lower.find(&closing) {
            Some(0) => Ok(()),
            Some(end) => {
                self.advance(end);
                self.push(NodeKind::RawText, start, line, column);
                Ok(())
            }
            None => Err(self.error(line, column, format!("missing </{}>", name))),
        }
    }
}

/// Tokenize an HTML document or fragment.
pub fn tokenize(source: &str) -> Result<Vec<Node>, MarkupError> {
    Tokenizer { src: source, pos: 0, line: 1, column: 1, nodes: Vec::new() }.run()
}
