//! Token sources
//!
//! The interpreter reads from a stack of sources: the bottom is the file or
//! terminal it was started on, and `.i` or embedders can push more on top.
//! A source that runs dry is popped and reading continues underneath.

use crate::error::Result;
use crate::lexer::{Lexer, Token};
use std::io::BufRead;

/// Anything that yields tokens. `None` means the source is exhausted.
pub trait TokenSource {
    fn next_token(&mut self) -> Option<Result<Token>>;
}

/// Line-oriented source over a reader (a file, stdin).
///
/// String literals can't span lines.
pub struct ReaderSource<R: BufRead> {
    reader: R,
    line: usize,
    current: Lexer,
    done: bool,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            line: 0,
            current: Lexer::default(),
            done: false,
        }
    }
}

impl<R: BufRead> TokenSource for ReaderSource<R> {
    fn next_token(&mut self) -> Option<Result<Token>> {
        loop {
            if let Some(token) = self.current.next_token() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line += 1;
                    self.current = Lexer::starting_at(&buf, self.line);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

#[derive(Default)]
pub struct InputStack {
    sources: Vec<Box<dyn TokenSource>>,
}

impl InputStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Box<dyn TokenSource>) {
        self.sources.push(source);
    }

    /// Next token from the innermost source that still has one
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        while let Some(source) = self.sources.last_mut() {
            if let Some(token) = source.next_token() {
                return Some(token);
            }
            self.sources.pop();
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.sources.len()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use std::io::Cursor;

    fn texts(source: &mut dyn TokenSource) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(token) = source.next_token() {
            out.push(token.unwrap().text);
        }
        out
    }

    #[test]
    fn test_reader_source_numbers_lines() {
        let mut source = ReaderSource::new(Cursor::new("1 2\n\ndup\n"));
        let first = source.next_token().unwrap().unwrap();
        assert_eq!(first.line, 1);
        source.next_token();
        let third = source.next_token().unwrap().unwrap();
        assert_eq!(third.text, "dup");
        assert_eq!(third.line, 3);
        assert!(source.next_token().is_none());
        assert!(source.next_token().is_none());
    }

    #[test]
    fn test_stack_reads_innermost_first() {
        let mut input = InputStack::new();
        input.push(Box::new(Lexer::new("outer")));
        input.push(Box::new(Lexer::new("inner1 inner2")));
        assert_eq!(input.depth(), 2);

        struct Adapter<'a>(&'a mut InputStack);
        impl TokenSource for Adapter<'_> {
            fn next_token(&mut self) -> Option<Result<Token>> {
                self.0.next_token()
            }
        }
        assert_eq!(texts(&mut Adapter(&mut input)), vec!["inner1", "inner2", "outer"]);
        assert_eq!(input.depth(), 0);
    }

    #[test]
    fn test_reader_source_keeps_kinds() {
        let mut source = ReaderSource::new(Cursor::new("\"s\" 4.5"));
        assert_eq!(source.next_token().unwrap().unwrap().kind, TokenKind::Str);
        assert_eq!(source.next_token().unwrap().unwrap().kind, TokenKind::Double);
    }
}
