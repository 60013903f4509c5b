//! Tokenizer for kit source text
//!
//! Splits on whitespace. `"..."` is a string literal (with `\"`, `\\`, `\n`
//! and `\t` escapes) and may touch neighbouring tokens. A token starting with
//! `#` comments out the rest of the line. Bare tokens are classified as
//! Integer, Double or Word.

use crate::error::{KitError, Result};
use crate::input::TokenSource;
use crate::value::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Integer,
    Double,
    Str,
    /// Explicit end of a string fed through `run_string`
    EndOfInput,
}

/// A token with its source position (1-based line and column)
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Word name, numeric text, or the unescaped string contents
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    pub fn end_of_input() -> Self {
        Token::new(TokenKind::EndOfInput, "^", 0, 0)
    }

    pub fn is_end_of_input(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    /// The Value a literal token stands for
    pub fn literal(&self) -> Result<Value> {
        match self.kind {
            TokenKind::Integer => self
                .text
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| KitError::invalid_param(format!("{}: {}", self.text, e))),
            TokenKind::Double => self
                .text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| KitError::invalid_param(format!("{}: {}", self.text, e))),
            TokenKind::Str => Ok(Value::Str(self.text.clone())),
            TokenKind::Word => Err(KitError::UnknownWord(self.text.clone())),
            TokenKind::EndOfInput => Err(KitError::UnknownTokenType(
                "end of input is not a literal".to_string(),
            )),
        }
    }
}

fn starts_numerically(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-' | '+' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

fn classify(text: &str) -> TokenKind {
    if text.parse::<i64>().is_ok() {
        TokenKind::Integer
    } else if starts_numerically(text) && text.parse::<f64>().is_ok() {
        TokenKind::Double
    } else {
        TokenKind::Word
    }
}

/// Tokenize `source`, numbering lines from `first_line`.
///
/// Tokens before an error are still returned; the error (an unterminated
/// string) comes last.
fn scan(source: &str, first_line: usize) -> Vec<Result<Token>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = (first_line, 1);
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;

    let mut line = first_line;
    let mut col = 0;

    let flush = |current: &mut String, start: (usize, usize), out: &mut Vec<Result<Token>>| {
        if !current.is_empty() {
            let text = std::mem::take(current);
            out.push(Ok(Token::new(classify(&text), text, start.0, start.1)));
        }
    };

    for ch in source.chars() {
        col += 1;

        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
        } else if in_string {
            if escaped {
                match ch {
                    'n' => current.push('\n'),
                    't' => current.push('\t'),
                    '"' | '\\' => current.push(ch),
                    other => {
                        current.push('\\');
                        current.push(other);
                    }
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                let text = std::mem::take(&mut current);
                out.push(Ok(Token::new(TokenKind::Str, text, start.0, start.1)));
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            flush(&mut current, start, &mut out);
            in_string = true;
            start = (line, col);
        } else if ch.is_whitespace() {
            flush(&mut current, start, &mut out);
        } else if ch == '#' && current.is_empty() {
            in_comment = true;
        } else {
            if current.is_empty() {
                start = (line, col);
            }
            current.push(ch);
        }

        if ch == '\n' {
            line += 1;
            col = 0;
        }
    }

    if in_string {
        out.push(Err(KitError::generic(format!(
            "unterminated string starting at {}:{}",
            start.0, start.1
        ))));
    } else {
        flush(&mut current, start, &mut out);
    }
    out
}

/// Tokenize a whole string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    scan(source, 1).into_iter().collect()
}

/// Token source over an in-memory string
#[derive(Debug, Default)]
pub struct Lexer {
    pending: VecDeque<Result<Token>>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self::starting_at(source, 1)
    }

    /// Lex `source` as if it began on line `first_line` of a larger input
    pub fn starting_at(source: &str, first_line: usize) -> Self {
        Lexer {
            pending: scan(source, first_line).into(),
        }
    }

    /// Terminate the stream with an explicit EndOfInput token
    pub fn with_end_marker(mut self) -> Self {
        self.pending.push_back(Ok(Token::end_of_input()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Option<Result<Token>> {
        self.pending.pop_front()
    }
}
