//! Reading and writing `searchData` fragment files.
//!
//! A fragment is a JavaScript assignment of a nested array literal:
//!
//! ```text
//! var searchData=
//! [
//!   ['makeinstance',['makeInstance',['../class_scene.html#afe26...',1,'Scene']]],
//!   ['meshid',['meshId',['../struct_instance.html#af621...',1,'Instance']]]
//! ];
//! ```
//!
//! The reader accepts any whitespace layout, either quote style and trailing
//! commas. The writer always produces the layout above, so a generated file
//! survives a read/write cycle unchanged.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::models::{Entry, Link, Symbol};

const VARIABLE: &str = "searchData";

/// Array nesting allowed in a fragment. Generated files nest three deep
/// (entry, symbol, link) inside the outer table.
const MAX_DEPTH: usize = 8;

/// A syntax or shape error, positioned at 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: &'static str, found: Found },

    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("number out of range")]
    NumberOutOfRange,

    #[error("{path}: {message}")]
    Shape { path: String, message: &'static str },

    #[error("unexpected content after the searchData assignment")]
    TrailingContent,

    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),
}

/// What the reader ran into instead of the expected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Char(char),
    Word(String),
    End,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "`{}`", c),
            Self::Word(w) => write!(f, "`{}`", w),
            Self::End => f.write_str("end of input"),
        }
    }
}

/// Parse a complete fragment file into its entries.
pub fn parse(source: &str) -> Result<Vec<Entry>, ParseError> {
    let mut reader = Reader::new(source);
    let root = reader.assignment()?;
    to_entries(root)
}

/// Render entries in the layout Doxygen generates.
pub fn write(entries: &[Entry]) -> String {
    let mut out = String::from("var searchData=\n[\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str("  ");
        write_entry(&mut out, entry);
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

fn write_entry(out: &mut String, entry: &Entry) {
    out.push('[');
    write_str(out, &entry.key);
    for symbol in &entry.symbols {
        out.push_str(",[");
        write_str(out, &symbol.label);
        for link in &symbol.links {
            out.push_str(",[");
            write_str(out, &link.anchor_url);
            out.push(',');
            out.push_str(&link.local.to_string());
            out.push(',');
            write_str(out, &link.scope);
            out.push(']');
        }
        out.push(']');
    }
    out.push(']');
}

fn write_str(out: &mut String, value: &str) {
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
}

// ============================================================
// Literal reader
// ============================================================

#[derive(Debug)]
enum Value {
    Str(String),
    Int(i64),
    Array(Vec<Node>),
}

#[derive(Debug)]
struct Node {
    value: Value,
    line: usize,
    column: usize,
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            kind,
        }
    }

    fn expected(&mut self, expected: &'static str) -> ParseError {
        let found = match self.chars.peek() {
            Some(&c) => Found::Char(c),
            None => Found::End,
        };
        self.error(ParseErrorKind::Expected { expected, found })
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek().copied() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut star = false;
                            while let Some(c) = self.bump() {
                                if star && c == '/' {
                                    break;
                                }
                                star = c == '*';
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.chars.peek() == Some(&ch) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    /// `[var|let|const] searchData = <array> [;]`
    fn assignment(&mut self) -> Result<Node, ParseError> {
        self.skip_trivia();
        let (mut line, mut column) = (self.line, self.column);
        let mut name = self.word();
        if matches!(name.as_str(), "var" | "let" | "const") {
            self.skip_trivia();
            (line, column) = (self.line, self.column);
            name = self.word();
        }
        if name != VARIABLE {
            let found = if name.is_empty() {
                match self.chars.peek() {
                    Some(&c) => Found::Char(c),
                    None => Found::End,
                }
            } else {
                Found::Word(name)
            };
            return Err(ParseError {
                line,
                column,
                kind: ParseErrorKind::Expected {
                    expected: "`searchData`",
                    found,
                },
            });
        }

        self.skip_trivia();
        if !self.eat('=') {
            return Err(self.expected("`=`"));
        }
        self.skip_trivia();
        let root = self.value()?;
        self.skip_trivia();
        self.eat(';');
        self.skip_trivia();
        if self.chars.peek().is_some() {
            return Err(self.error(ParseErrorKind::TrailingContent));
        }
        Ok(root)
    }

    fn value(&mut self) -> Result<Node, ParseError> {
        let (line, column) = (self.line, self.column);
        let value = match self.chars.peek().copied() {
            Some('[') => Value::Array(self.array()?),
            Some(q @ ('\'' | '"')) => Value::Str(self.string(q)?),
            Some(c) if c.is_ascii_digit() || c == '-' => Value::Int(self.number()?),
            _ => return Err(self.expected("a value")),
        };
        Ok(Node {
            value,
            line,
            column,
        })
    }

    fn array(&mut self) -> Result<Vec<Node>, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep(MAX_DEPTH)));
        }
        self.depth += 1;
        let items = self.array_items();
        self.depth -= 1;
        items
    }

    fn array_items(&mut self) -> Result<Vec<Node>, ParseError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(']') {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Ok(items);
            }
            return Err(self.expected("`,` or `]`"));
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        let (line, column) = (self.line, self.column);
        let unterminated = ParseError {
            line,
            column,
            kind: ParseErrorKind::UnterminatedString,
        };
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(unterminated),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| unterminated.clone())?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' | '/' => out.push(escaped),
                        'u' => out.push(self.unicode_escape()?),
                        other => return Err(self.error(ParseErrorKind::InvalidEscape(other))),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// The four hex digits after `\u`, joining a UTF-16 surrogate pair
    /// written as two escapes.
    fn unicode_escape(&mut self) -> Result<char, ParseError> {
        let high = self.hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if !(self.eat('\\') && self.eat('u')) {
                    return Err(self.error(ParseErrorKind::InvalidEscape('u')));
                }
                let low = self.hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error(ParseErrorKind::InvalidEscape('u')));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            code => code,
        };
        char::from_u32(code).ok_or_else(|| self.error(ParseErrorKind::InvalidEscape('u')))
    }

    fn hex4(&mut self) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .chars
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(ParseErrorKind::InvalidEscape('u')))?;
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn number(&mut self) -> Result<i64, ParseError> {
        let mut digits = String::new();
        if self.eat('-') {
            digits.push('-');
        }
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.bump();
        }
        if digits == "-" {
            return Err(self.expected("a digit"));
        }
        digits
            .parse()
            .map_err(|_| self.error(ParseErrorKind::NumberOutOfRange))
    }
}

// ============================================================
// Shape checking
// ============================================================

fn shape_error(node: &Node, path: String, message: &'static str) -> ParseError {
    ParseError {
        line: node.line,
        column: node.column,
        kind: ParseErrorKind::Shape { path, message },
    }
}

fn to_entries(root: Node) -> Result<Vec<Entry>, ParseError> {
    let Value::Array(items) = root.value else {
        return Err(shape_error(&root, VARIABLE.to_string(), "expected an array"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, node)| to_entry(node, format!("entry {}", i + 1)))
        .collect()
}

/// `['key', symbol, symbol, ...]`
fn to_entry(node: Node, path: String) -> Result<Entry, ParseError> {
    let (key, rest) = split_head(node, &path, "expected `[key, symbol...]`")?;
    let symbols = rest
        .into_iter()
        .enumerate()
        .map(|(i, node)| to_symbol(node, format!("{}: symbol {}", path, i + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Entry { key, symbols })
}

/// `['Label', link, link, ...]`
fn to_symbol(node: Node, path: String) -> Result<Symbol, ParseError> {
    let (label, rest) = split_head(node, &path, "expected `[label, link...]`")?;
    let links = rest
        .into_iter()
        .enumerate()
        .map(|(i, node)| to_link(node, format!("{}: link {}", path, i + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Symbol { label, links })
}

/// `['../page.html#anchor', 1, 'Scope']`
fn to_link(node: Node, path: String) -> Result<Link, ParseError> {
    const SHAPE: &str = "expected `[url, flag, scope]`";
    let Value::Array(ref items) = node.value else {
        return Err(shape_error(&node, path, SHAPE));
    };
    let [url, flag, scope] = items.as_slice() else {
        return Err(shape_error(&node, path, SHAPE));
    };
    match (&url.value, &flag.value, &scope.value) {
        (Value::Str(url), Value::Int(local), Value::Str(scope)) => {
            let local = u8::try_from(*local)
                .map_err(|_| shape_error(flag, path, "link flag out of range"))?;
            Ok(Link {
                anchor_url: url.clone(),
                local,
                scope: scope.clone(),
            })
        }
        _ => Err(shape_error(&node, path, SHAPE)),
    }
}

/// Split `[string, rest...]` into the leading string and the remaining nodes.
fn split_head(
    node: Node,
    path: &str,
    message: &'static str,
) -> Result<(String, Vec<Node>), ParseError> {
    let (line, column) = (node.line, node.column);
    let err = || ParseError {
        line,
        column,
        kind: ParseErrorKind::Shape {
            path: path.to_string(),
            message,
        },
    };
    let Value::Array(items) = node.value else {
        return Err(err());
    };
    let mut items = items.into_iter();
    match items.next() {
        Some(Node {
            value: Value::Str(head),
            ..
        }) => Ok((head, items.collect())),
        _ => Err(err()),
    }
}
