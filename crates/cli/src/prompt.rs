//! Line-editing token source for the terminal

use kit_core::{InterpreterConfig, KitError, Lexer, ReaderSource, Result, Token, TokenSource};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io;
use tracing::warn;

/// Reads one line at a time through rustyline, with history.
///
/// Ctrl-C drops the line being typed; Ctrl-D ends the source.
pub struct PromptSource {
    editor: DefaultEditor,
    prompt: String,
    line: usize,
    current: Lexer,
    done: bool,
}

impl PromptSource {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(PromptSource {
            editor,
            prompt: prompt.into(),
            line: 0,
            current: Lexer::default(),
            done: false,
        })
    }
}

impl TokenSource for PromptSource {
    fn next_token(&mut self) -> Option<Result<Token>> {
        loop {
            if let Some(token) = self.current.next_token() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            match self.editor.readline(&self.prompt) {
                Ok(line) => {
                    self.line += 1;
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    self.current = Lexer::starting_at(&line, self.line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(readline_error(err)));
                }
            }
        }
    }
}

fn readline_error(err: ReadlineError) -> KitError {
    KitError::generic(format!("readline: {}", err))
}

/// Prompt on the terminal, or plain stdin when line editing isn't available
pub fn interactive(config: &InterpreterConfig) -> Box<dyn TokenSource> {
    match PromptSource::new(config.prompt.clone()) {
        Ok(source) => Box::new(source),
        Err(e) => {
            warn!(error = %e, "line editing unavailable, reading stdin");
            Box::new(ReaderSource::new(io::stdin().lock()))
        }
    }
}
