//! Interpreter state
//!
//! One `Interpreter` holds everything a running kit program touches: the
//! dictionary, both stacks, the instruction pointer, the compile mode, the
//! printer registry and the token input. Every native operation receives it
//! by `&mut`.
//!
//! The control loop lives here too: `run` reads tokens until the input runs
//! out or `.q` sets the quit flag, and `run_string` evaluates a macro-expanded
//! string in the current mode against the current stacks.

use crate::compiler::Mode;
use crate::config::InterpreterConfig;
use crate::dictionary::{Dictionary, EntryId};
use crate::error::{KitError, Result};
use crate::input::{InputStack, ReaderSource, TokenSource};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::macros;
use crate::printer::PrinterRegistry;
use crate::stack::{DataStack, InstructionPointer, ReturnStack};
use crate::value::{Invocation, Routine, Value};
use crate::words;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::debug;

type SourceFactory = Box<dyn FnMut(&InterpreterConfig) -> Box<dyn TokenSource>>;

pub struct Interpreter {
    pub(crate) dictionary: Dictionary,
    pub(crate) data_stack: DataStack,
    pub(crate) return_stack: ReturnStack,
    pub(crate) ip: Option<InstructionPointer>,
    pub(crate) mode: Mode,
    /// Body indices of jumps waiting for a target
    pub(crate) control_stack: Vec<usize>,
    pub(crate) printers: PrinterRegistry,
    input: InputStack,
    pushed_back: Option<Token>,
    interactive: SourceFactory,
    out: Box<dyn Write>,
    diag: Box<dyn Write>,
    quit: bool,
    last_error: Option<KitError>,
    config: InterpreterConfig,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter with the basic word set, writing to stdout/stderr
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut interp = Interpreter {
            dictionary: Dictionary::new(),
            data_stack: DataStack::new(),
            return_stack: ReturnStack::new(),
            ip: None,
            mode: Mode::Execute,
            control_stack: Vec::new(),
            printers: PrinterRegistry::new(),
            input: InputStack::new(),
            pushed_back: None,
            interactive: Box::new(stdin_source),
            out: Box::new(io::stdout()),
            diag: Box::new(io::stderr()),
            quit: false,
            last_error: None,
            config,
        };
        words::add_basic_words(&mut interp);
        interp
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Where `.`, `.s` and `.d` write
    pub fn set_output(&mut self, out: impl Write + 'static) {
        self.out = Box::new(out);
    }

    /// Where reported errors are written
    pub fn set_diagnostics(&mut self, diag: impl Write + 'static) {
        self.diag = Box::new(diag);
    }

    /// Factory for the source `.i` switches to
    pub fn set_interactive_source<F>(&mut self, factory: F)
    where
        F: FnMut(&InterpreterConfig) -> Box<dyn TokenSource> + 'static,
    {
        self.interactive = Box::new(factory);
    }

    // ---------------------------------------------------------------------
    // Stack access
    // ---------------------------------------------------------------------

    pub fn push(&mut self, value: Value) {
        self.data_stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.data_stack.pop()
    }

    pub fn peek(&self) -> Result<&Value> {
        self.data_stack.peek()
    }

    pub fn stack(&self) -> &DataStack {
        &self.data_stack
    }

    pub fn stack_mut(&mut self) -> &mut DataStack {
        &mut self.data_stack
    }

    pub fn return_depth(&self) -> usize {
        self.return_stack.len()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    // ---------------------------------------------------------------------
    // Vocabulary
    // ---------------------------------------------------------------------

    /// Register a primitive word
    pub fn define_word(&mut self, word: &str, routine: Routine) -> EntryId {
        debug!(word, "define");
        self.dictionary.add(word, routine)
    }

    /// Register a word that runs even while compiling
    pub fn define_immediate(&mut self, word: &str, routine: Routine) -> EntryId {
        let id = self.define_word(word, routine);
        if let Some(entry) = self.dictionary.get_mut(id) {
            entry.immediate = true;
        }
        id
    }

    /// A variable holds its value in body[0] (initially 0) and pushes a
    /// reference to itself when invoked.
    pub fn define_variable(&mut self, word: &str) -> EntryId {
        let id = self.define_word(word, push_entry_ref);
        if let Some(entry) = self.dictionary.get_mut(id) {
            entry.body.push(Value::Integer(0));
        }
        id
    }

    /// A constant pushes a copy of body[0] when invoked
    pub fn define_constant(&mut self, word: &str, value: Value) -> EntryId {
        let id = self.define_word(word, push_param0);
        if let Some(entry) = self.dictionary.get_mut(id) {
            entry.body.push(value);
        }
        id
    }

    /// Variable Entry behind an EntryRef, or InvalidParam
    pub fn variable_slot(&mut self, var: &Value) -> Result<&mut Value> {
        let id = var.as_entry().ok_or_else(|| {
            KitError::invalid_param(format!("expected a variable, got {}", var.kind_name()))
        })?;
        let entry = self
            .dictionary
            .get_mut(id)
            .ok_or_else(|| KitError::MalformedBody(format!("dangling entry {}", id.index())))?;
        if !std::ptr::fn_addr_eq(entry.routine, push_entry_ref as Routine) {
            return Err(KitError::invalid_param(format!(
                "'{}' is not a variable",
                entry.word
            )));
        }
        if entry.body.is_empty() {
            return Err(KitError::MalformedBody(format!(
                "variable '{}' has no slot",
                entry.word
            )));
        }
        Ok(&mut entry.body[0])
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    pub fn push_source(&mut self, source: Box<dyn TokenSource>) {
        self.input.push(source);
    }

    /// Switch input to a fresh interactive source
    pub fn push_interactive(&mut self) {
        let source = (self.interactive)(&self.config);
        self.input.push(source);
    }

    pub fn input_depth(&self) -> usize {
        self.input.depth()
    }

    pub fn next_token(&mut self) -> Option<Result<Token>> {
        match self.pushed_back.take() {
            Some(token) => Some(Ok(token)),
            None => self.input.next_token(),
        }
    }

    /// Give a token back so the next read returns it again
    pub fn push_back(&mut self, token: Token) {
        self.pushed_back = Some(token);
    }

    // ---------------------------------------------------------------------
    // Control loop
    // ---------------------------------------------------------------------

    /// Read and process tokens until the input is exhausted or quit is
    /// requested. Errors are reported and the loop carries on.
    pub fn run(&mut self) {
        while !self.quit {
            match self.next_token() {
                None => break,
                Some(Err(e)) => self.report(e),
                Some(Ok(token)) if token.is_end_of_input() => continue,
                Some(Ok(token)) => {
                    if let Err(e) = self.process_token(token) {
                        self.report(e);
                    }
                }
            }
        }
    }

    /// Macro-expand `source` and evaluate it as if typed at the prompt.
    ///
    /// Only a failed expansion is returned; errors raised while evaluating are
    /// reported and evaluation moves on to the next token.
    pub fn run_string(&mut self, source: &str) -> Result<()> {
        let expanded = macros::expand(source, &self.data_stack, self.config.macro_marker)?;
        debug!(source = %expanded, "run_string");
        self.input.push(Box::new(Lexer::new(&expanded).with_end_marker()));

        loop {
            match self.next_token() {
                None => break,
                Some(Err(e)) => self.report(e),
                Some(Ok(token)) if token.is_end_of_input() => break,
                Some(Ok(token)) => {
                    if let Err(e) = self.process_token(token) {
                        self.report(e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Execute or compile one token depending on the mode
    pub fn process_token(&mut self, token: Token) -> Result<()> {
        match self.mode {
            Mode::Compile => self.compile_token(token),
            Mode::Execute => match token.kind {
                TokenKind::EndOfInput => Ok(()),
                TokenKind::Word => {
                    let id = self
                        .dictionary
                        .lookup(&token.text)
                        .ok_or(KitError::UnknownWord(token.text))?;
                    self.invoke(id)
                }
                _ => {
                    let value = token.literal()?;
                    self.push(value);
                    Ok(())
                }
            },
        }
    }

    /// Run an Entry's routine
    pub fn invoke(&mut self, id: EntryId) -> Result<()> {
        let routine = self
            .dictionary
            .get(id)
            .map(|entry| entry.routine)
            .ok_or_else(|| KitError::MalformedBody(format!("dangling entry {}", id.index())))?;
        routine(self, Invocation::Entry(id))
    }

    /// Invoke a word by name
    pub fn invoke_word(&mut self, word: &str) -> Result<()> {
        let id = self
            .dictionary
            .lookup(word)
            .ok_or_else(|| KitError::UnknownWord(word.to_string()))?;
        self.invoke(id)
    }

    // ---------------------------------------------------------------------
    // Output and errors
    // ---------------------------------------------------------------------

    pub fn write_out(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Write an error to the diagnostic sink and remember it
    pub fn report(&mut self, err: KitError) {
        debug!(error = %err, "reported");
        let _ = writeln!(self.diag, "{}{}", self.config.diagnostic_prefix, err);
        let _ = self.diag.flush();
        self.last_error = Some(err);
    }

    /// Most recently reported error, clearing it
    pub fn take_error(&mut self) -> Option<KitError> {
        self.last_error.take()
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Drain both stacks, drop the dictionary and printers, and close input
    pub fn shutdown(&mut self) {
        debug!(
            entries = self.dictionary.len(),
            stack = self.data_stack.len(),
            "shutdown"
        );
        self.data_stack.clear();
        self.return_stack.clear();
        self.ip = None;
        self.control_stack.clear();
        self.mode = Mode::Execute;
        self.dictionary.clear();
        self.printers.clear();
        self.input.clear();
        self.pushed_back = None;
        let _ = self.out.flush();
    }
}

fn stdin_source(_: &InterpreterConfig) -> Box<dyn TokenSource> {
    Box::new(ReaderSource::new(io::stdin().lock()))
}

fn push_entry_ref(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let id = invocation
        .entry()
        .ok_or_else(|| KitError::MalformedBody("variable invoked inline".to_string()))?;
    interp.push(Value::EntryRef(id));
    Ok(())
}

fn push_param0(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let value = invocation.param(interp, 0)?;
    interp.push(value);
    Ok(())
}

/// Cloneable in-memory sink for capturing output and diagnostics
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> (Interpreter, OutputBuffer, OutputBuffer) {
        let mut interp = Interpreter::new();
        let out = OutputBuffer::new();
        let diag = OutputBuffer::new();
        interp.set_output(out.clone());
        interp.set_diagnostics(diag.clone());
        (interp, out, diag)
    }

    #[test]
    fn test_literals_are_pushed() {
        let (mut interp, _, _) = capture();
        interp.run_string("1 2.5 \"three\"").unwrap();
        let stack: Vec<Value> = interp.stack().iter().cloned().collect();
        assert_eq!(
            stack,
            vec![Value::int(1), Value::double(2.5), Value::string("three")]
        );
    }

    #[test]
    fn test_unknown_word_is_reported_and_loop_continues() {
        let (mut interp, _, diag) = capture();
        interp.run_string("1 frobnicate 2").unwrap();
        assert_eq!(interp.stack().len(), 2);
        assert_eq!(
            interp.take_error(),
            Some(KitError::UnknownWord("frobnicate".to_string()))
        );
        assert_eq!(diag.contents(), "-----> unknown word: frobnicate\n");
        assert_eq!(interp.take_error(), None);
    }

    #[test]
    fn test_invoke_word_returns_errors_to_the_caller() {
        let (mut interp, _, diag) = capture();
        interp.push(Value::int(4));
        interp.invoke_word("negate").unwrap();
        assert_eq!(interp.pop().unwrap(), Value::int(-4));

        assert_eq!(
            interp.invoke_word("nope"),
            Err(KitError::UnknownWord("nope".to_string()))
        );
        assert_eq!(interp.invoke_word("pop"), Err(KitError::StackUnderflow));
        // Nothing is reported on the caller's behalf
        assert!(diag.contents().is_empty());
        assert_eq!(interp.take_error(), None);
    }

    #[test]
    fn test_underflow_is_reported() {
        let (mut interp, _, _) = capture();
        interp.run_string("pop").unwrap();
        assert_eq!(interp.take_error(), Some(KitError::StackUnderflow));
        assert!(interp.stack().is_empty());
    }

    #[test]
    fn test_run_reads_pushed_sources() {
        let (mut interp, out, _) = capture();
        interp.push_source(Box::new(Lexer::new("7 . .q 8 .")));
        interp.run();
        assert_eq!(out.contents(), "7\n");
        assert!(interp.quit_requested());
    }

    #[test]
    fn test_run_skips_end_markers() {
        let (mut interp, _, _) = capture();
        interp.push_source(Box::new(Lexer::new("1").with_end_marker()));
        interp.push_source(Box::new(Lexer::new("2").with_end_marker()));
        interp.run();
        assert_eq!(interp.stack().len(), 2);
        assert_eq!(interp.input_depth(), 0);
    }

    #[test]
    fn test_define_constant_and_variable() {
        let (mut interp, _, _) = capture();
        interp.define_constant("answer", Value::int(42));
        interp.define_variable("counter");
        interp.run_string("answer counter @").unwrap();
        assert_eq!(interp.pop().unwrap(), Value::int(0));
        assert_eq!(interp.pop().unwrap(), Value::int(42));
    }

    #[test]
    fn test_variable_slot_rejects_other_entries() {
        let (mut interp, _, _) = capture();
        let id = interp.define_constant("c", Value::int(1));
        assert!(matches!(
            interp.variable_slot(&Value::EntryRef(id)),
            Err(KitError::InvalidParam(_))
        ));
        assert!(matches!(
            interp.variable_slot(&Value::int(1)),
            Err(KitError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_custom_diagnostic_prefix() {
        let mut interp =
            Interpreter::with_config(InterpreterConfig::new().with_diagnostic_prefix("E: "));
        let diag = OutputBuffer::new();
        interp.set_diagnostics(diag.clone());
        interp.run_string("nope").unwrap();
        assert_eq!(diag.contents(), "E: unknown word: nope\n");
    }

    #[test]
    fn test_shutdown_drains_everything() {
        let (mut interp, _, _) = capture();
        interp.run_string("1 2 3").unwrap();
        interp.shutdown();
        assert!(interp.stack().is_empty());
        assert!(interp.dictionary().is_empty());
        assert_eq!(interp.return_depth(), 0);
    }

    #[test]
    fn test_output_buffer_is_shared() {
        let buf = OutputBuffer::new();
        let mut writer = buf.clone();
        write!(writer, "hi").unwrap();
        assert_eq!(buf.contents(), "hi");
        buf.clear();
        assert_eq!(buf.contents(), "");
    }
}
