//! Token scanner for JavaScript sources.
//!
//! Not a parser: it recognises enough structure (strings, template literals,
//! regular expressions, comments, bracket nesting) to reject malformed files
//! and to let the minifier drop whitespace safely.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    Ident,
    Number,
    String,
    /// A template literal piece (head, middle or tail)
    Template,
    Regex,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 0-based line of the first character
    pub line: usize,
    /// 0-based column (in chars) of the first character
    pub column: usize,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }

    pub fn contains_newline(&self) -> bool {
        self.text.contains('\n')
    }
}

/// A malformed source. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ScanError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which a `/` starts a regular expression.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Paren,
    Bracket,
    Brace,
    /// `${` inside a template literal
    Substitution,
}

impl Open {
    fn closer(self) -> char {
        match self {
            Open::Paren => ')',
            Open::Bracket => ']',
            Open::Brace | Open::Substitution => '}',
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    stack: Vec<(Open, usize, usize)>,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' || (!c.is_ascii() && c.is_alphanumeric())
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphanumeric())
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, line: 0, column: 0, tokens: Vec::new(), stack: Vec::new() }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ScanError {
        ScanError { line: line + 1, column: column + 1, message: message.into() }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) {
        let text: String = self.chars[start..self.pos].iter().collect();
        self.tokens.push(Token { kind, text, line, column });
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.iter().rev().find(|t| !t.is_trivia()) {
            None => true,
            Some(t) => match t.kind {
                TokenKind::Punct => !matches!(t.text.as_str(), ")" | "]" | "}"),
                TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&t.text.as_str()),
                _ => false,
            },
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ScanError> {
        if self.peek(0) == Some('#') && self.peek(1) == Some('!') {
            let (start, line, column) = (self.pos, self.line, self.column);
            while self.peek(0).is_some_and(|c| c != '\n') {
                self.bump();
            }
            self.push(TokenKind::LineComment, start, line, column);
        }

        while let Some(c) = self.peek(0) {
            let (start, line, column) = (self.pos, self.line, self.column);

            if c.is_whitespace() {
                while self.peek(0).is_some_and(char::is_whitespace) {
                    self.bump();
                }
                self.push(TokenKind::Whitespace, start, line, column);
            } else if c == '/' && self.peek(1) == Some('/') {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.bump();
                }
                self.push(TokenKind::LineComment, start, line, column);
            } else if c == '/' && self.peek(1) == Some('*') {
                self.bump();
                self.bump();
                loop {
                    match self.peek(0) {
                        None => return Err(self.error(line, column, "unterminated block comment")),
                        Some('*') if self.peek(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            break;
                        }
                        Some(_) => {
                            self.bump();
                        }
                    }
                }
                self.push(TokenKind::BlockComment, start, line, column);
            } else if c == '/' && self.regex_allowed() {
                self.scan_regex(line, column)?;
                self.push(TokenKind::Regex, start, line, column);
            } else if c == '"' || c == '\'' {
                self.scan_string(c, line, column)?;
                self.push(TokenKind::String, start, line, column);
            } else if c == '`' {
                self.bump();
                self.scan_template(start, line, column)?;
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
                self.scan_number();
                self.push(TokenKind::Number, start, line, column);
            } else if is_ident_start(c) {
                self.bump();
                while self.peek(0).is_some_and(is_ident_continue) {
                    self.bump();
                }
                self.push(TokenKind::Ident, start, line, column);
            } else {
                self.scan_punct(start, line, column)?;
            }
        }

        if let Some((open, line, column)) = self.stack.last() {
            let what = match open {
                Open::Substitution => "unterminated template substitution".to_string(),
                other => format!("unclosed '{}'", opener_char(*other)),
            };
            return Err(self.error(*line, *column, what));
        }

        Ok(self.tokens)
    }

    fn scan_string(&mut self, quote: char, line: usize, column: usize) -> Result<(), ScanError> {
        self.bump();
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(self.error(line, column, "unterminated string literal")),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Scan template characters after the opening backtick or closing `}`.
    fn scan_template(&mut self, start: usize, line: usize, column: usize) -> Result<(), ScanError> {
        loop {
            match self.peek(0) {
                None => return Err(self.error(line, column, "unterminated template literal")),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('`') => {
                    self.bump();
                    self.push(TokenKind::Template, start, line, column);
                    return Ok(());
                }
                Some('$') if self.peek(1) == Some('{') => {
                    let (sub_line, sub_column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    self.push(TokenKind::Template, start, line, column);
                    self.stack.push((Open::Substitution, sub_line, sub_column));
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn scan_regex(&mut self, line: usize, column: usize) -> Result<(), ScanError> {
        self.bump();
        let mut in_class = false;
        loop {
            match self.peek(0) {
                None | Some('\n') => {
                    return Err(self.error(line, column, "unterminated regular expression"))
                }
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('[') => {
                    in_class = true;
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        while self.peek(0).is_some_and(is_ident_continue) {
            self.bump();
        }
        Ok(())
    }

    fn scan_number(&mut self) {
        let hex = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X'));
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.bump();
                if !hex && (c == 'e' || c == 'E') && matches!(self.peek(0), Some('+' | '-')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn scan_punct(&mut self, start: usize, line: usize, column: usize) -> Result<(), ScanError> {
        let c = self.peek(0).unwrap_or_default();
        match c {
            '(' | '[' | '{' => {
                let open = match c {
                    '(' => Open::Paren,
                    '[' => Open::Bracket,
                    _ => Open::Brace,
                };
                self.stack.push((open, line, column));
                self.bump();
                self.push(TokenKind::Punct, start, line, column);
            }
            ')' | ']' | '}' => {
                match self.stack.pop() {
                    None => return Err(self.error(line, column, format!("unexpected '{}'", c))),
                    Some((open, open_line, open_column)) if open.closer() != c => {
                        return Err(self.error(
                            line,
                            column,
                            format!(
                                "expected '{}' to close '{}' from {}:{}, found '{}'",
                                open.closer(),
                                opener_char(open),
                                open_line + 1,
                                open_column + 1,
                                c
                            ),
                        ));
                    }
                    Some((Open::Substitution, _, _)) => {
                        // `}` resumes the enclosing template literal
                        self.bump();
                        return self.scan_template(start, line, column);
                    }
                    Some(_) => {
                        self.bump();
                        self.push(TokenKind::Punct, start, line, column);
                    }
                }
            }
            _ => {
                let rest: String = self.chars[self.pos..(self.pos + 4).min(self.chars.len())].iter().collect();
                let len = PUNCTUATORS
                    .iter()
                    .find(|p| rest.starts_with(*p))
                    .map(|p| p.chars().count())
                    .unwrap_or(1);
                for _ in 0..len {
                    self.bump();
                }
                self.push(TokenKind::Punct, start, line, column);
            }
        }
        Ok(())
    }
}

fn opener_char(open: Open) -> char {
    match open {
        Open::Paren => '(',
        Open::Bracket => '[',
        Open::Brace => '{',
        Open::Substitution => '$',
    }
}

/// Split a source into tokens, failing on malformed input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    Lexer::new(source).run()
}
