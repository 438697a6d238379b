//! Permissive reader for Valve's brace-delimited key-value text.
//!
//! ```text
//! // comment
//! "solid"
//! {
//!     "index" "0"
//!     mass 10.0
//! }
//! ```

use std::{iter::Peekable, str::Chars};

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Process `\n`, `\t`, `\\` and `\"` inside quoted strings.
    pub allow_escapes: bool,
    /// Quoted strings may not span lines, and a value must be on its key's line.
    pub single_line: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_escapes: true,
            single_line: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unexpected closing brace")]
    UnexpectedClose,
    #[error("block opened on line {0} is never closed")]
    UnclosedBlock(usize),
    #[error("key {0:?} has no value")]
    MissingValue(String),
    #[error("block has no name")]
    UnnamedBlock,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{filename}:{line}: {kind}")]
pub struct KeyValuesError {
    pub filename: String,
    pub line: usize,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropValue {
    Leaf(String),
    Block(Vec<Property>),
}

/// One key-value pair. Names compare case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: PropValue,
}

impl Default for Property {
    fn default() -> Self {
        Self::block("", Vec::new())
    }
}

impl Property {
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropValue::Leaf(value.into()),
        }
    }

    pub fn block(name: impl Into<String>, children: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            value: PropValue::Block(children),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Leaf text, or `None` for blocks.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropValue::Leaf(value) => Some(value),
            PropValue::Block(_) => None,
        }
    }

    /// Children of a block. Leaves have none.
    pub fn children(&self) -> &[Property] {
        match &self.value {
            PropValue::Leaf(_) => &[],
            PropValue::Block(children) => children,
        }
    }

    /// The last direct child called `key`.
    pub fn find_key(&self, key: &str) -> Option<&Property> {
        self.children().iter().rev().find(|child| child.is_named(key))
    }

    /// Every descendant reached by following `path` one name at a time, in order.
    ///
    /// `find_all(&["break", "model"])` yields the `model` keys of every `break` block.
    pub fn find_all(&self, path: &[&str]) -> Vec<&Property> {
        let Some((first, rest)) = path.split_first() else {
            return vec![self];
        };
        self.children()
            .iter()
            .filter(|child| child.is_named(first))
            .flat_map(|child| child.find_all(rest))
            .collect()
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    filename: &'a str,
    options: ParseOptions,
}

impl<'a> Tokenizer<'a> {
    fn error(&self, line: usize, kind: ErrorKind) -> KeyValuesError {
        KeyValuesError {
            filename: self.filename.to_owned(),
            line,
            kind,
        }
    }

    /// Next token and the line it starts on.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, KeyValuesError> {
        while let Some(c) = self.chars.next() {
            let line = self.line;
            match c {
                '\n' => self.line += 1,
                '/' if self.chars.peek() == Some(&'/') => {
                    for c in self.chars.by_ref() {
                        if c == '\n' {
                            self.line += 1;
                            break;
                        }
                    }
                }
                c if c.is_whitespace() => {}
                '{' => return Ok(Some((Token::Open, line))),
                '}' => return Ok(Some((Token::Close, line))),
                '"' => return self.quoted().map(|s| Some((Token::Str(s), line))),
                c => {
                    let mut s = String::from(c);
                    while let Some(&c) = self.chars.peek() {
                        if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                            break;
                        }
                        s.push(c);
                        self.chars.next();
                    }
                    return Ok(Some((Token::Str(s), line)));
                }
            }
        }
        Ok(None)
    }

    fn quoted(&mut self) -> Result<String, KeyValuesError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error(start, ErrorKind::UnterminatedString)),
                Some('"') => return Ok(s),
                Some('\n') if self.options.single_line => {
                    return Err(self.error(start, ErrorKind::UnterminatedString))
                }
                Some('\\') if self.options.allow_escapes => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => {
                        if other == '\n' {
                            self.line += 1;
                        }
                        s.push('\\');
                        s.push(other);
                    }
                    None => return Err(self.error(start, ErrorKind::UnterminatedString)),
                },
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    s.push(c);
                }
            }
        }
    }
}

/// Parse a whole file into an unnamed root block.
pub fn parse(text: &str, filename: &str, options: ParseOptions) -> Result<Property, KeyValuesError> {
    let mut tokens = Tokenizer {
        chars: text.chars().peekable(),
        line: 1,
        filename,
        options,
    };
    let children = parse_block(&mut tokens, None)?;
    Ok(Property::block("", children))
}

fn parse_block(
    tokens: &mut Tokenizer,
    opened_on: Option<usize>,
) -> Result<Vec<Property>, KeyValuesError> {
    let mut out = Vec::new();
    // Key waiting for its value, with the line it was on.
    let mut pending: Option<(String, usize)> = None;

    while let Some((token, line)) = tokens.next_token()? {
        match (token, pending.take()) {
            (Token::Str(value), Some((name, key_line))) => {
                if tokens.options.single_line && line != key_line {
                    return Err(tokens.error(key_line, ErrorKind::MissingValue(name)));
                }
                out.push(Property::leaf(name, value));
            }
            (Token::Str(name), None) => pending = Some((name, line)),
            (Token::Open, Some((name, _))) => {
                let children = parse_block(tokens, Some(line))?;
                out.push(Property::block(name, children));
            }
            (Token::Open, None) => return Err(tokens.error(line, ErrorKind::UnnamedBlock)),
            (Token::Close, Some((name, key_line))) => {
                return Err(tokens.error(key_line, ErrorKind::MissingValue(name)))
            }
            (Token::Close, None) => {
                return match opened_on {
                    Some(_) => Ok(out),
                    None => Err(tokens.error(line, ErrorKind::UnexpectedClose)),
                }
            }
        }
    }

    if let Some((name, key_line)) = pending {
        return Err(tokens.error(key_line, ErrorKind::MissingValue(name)));
    }
    match opened_on {
        Some(open_line) => Err(tokens.error(tokens.line, ErrorKind::UnclosedBlock(open_line))),
        None => Ok(out),
    }
}
