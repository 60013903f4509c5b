//! Compiler
//!
//! `:` switches to Compile mode and every later token is appended to the
//! Entry under construction (always the latest Entry) until the immediate
//! word `;` finishes it:
//!
//! - a complete, non-immediate word compiles to an EntryRef
//! - an immediate word runs right away
//! - a literal compiles to a `push-literal` PseudoEntry
//!
//! `if`, `else` and `then` are immediate words that back-patch jump targets.
//! Pending jumps are tracked as body indices on the control stack:
//!
//! ```text
//! : sign  0 if "yes" else "no" then ;
//!
//! 0: push-literal 0
//! 1: jmp-if-false -> 4
//! 2: push-literal "yes"
//! 3: jmp -> 5
//! 4: push-literal "no"
//! 5: ;
//! ```

use crate::dictionary::EntryId;
use crate::engine::{self, execute_definition};
use crate::error::{KitError, Result};
use crate::interpreter::Interpreter;
use crate::lexer::{Token, TokenKind};
use crate::value::{Invocation, PseudoEntry, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Execute,
    Compile,
}

impl Interpreter {
    /// Handle one token while in Compile mode
    pub(crate) fn compile_token(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::EndOfInput => Ok(()),
            TokenKind::Word => {
                let id = self
                    .dictionary
                    .lookup(&token.text)
                    .ok_or(KitError::UnknownWord(token.text))?;
                let immediate = self.dictionary.get(id).is_some_and(|e| e.immediate);
                if immediate {
                    self.invoke(id)
                } else {
                    self.compile(Value::EntryRef(id)).map(|_| ())
                }
            }
            _ => {
                let literal = token.literal()?;
                let pseudo = PseudoEntry::new("push-literal", engine::push_literal)
                    .with_param(literal);
                self.compile(Value::Pseudo(Box::new(pseudo))).map(|_| ())
            }
        }
    }

    /// Append to the Entry under construction, returning the new index
    pub fn compile(&mut self, value: Value) -> Result<usize> {
        let entry = self.building()?;
        let body = &mut self
            .dictionary
            .get_mut(entry)
            .ok_or_else(|| KitError::ControlFlow("nothing is being defined".to_string()))?
            .body;
        body.push(value);
        Ok(body.len() - 1)
    }

    fn building(&self) -> Result<EntryId> {
        if self.mode != Mode::Compile {
            return Err(KitError::ControlFlow(
                "only valid inside a definition".to_string(),
            ));
        }
        self.dictionary
            .latest()
            .ok_or_else(|| KitError::ControlFlow("nothing is being defined".to_string()))
    }

    fn body_len(&self) -> Result<usize> {
        let entry = self.building()?;
        Ok(self.dictionary.get(entry).map_or(0, |e| e.body.len()))
    }

    /// Point the jump at `index` of the body under construction to `target`
    fn patch(&mut self, index: usize, target: usize) -> Result<()> {
        let entry = self.building()?;
        match self
            .dictionary
            .get_mut(entry)
            .and_then(|e| e.body.get_mut(index))
        {
            Some(Value::Pseudo(jump)) => {
                jump.body.clear();
                jump.body.push(Value::Integer(target as i64));
                Ok(())
            }
            _ => Err(KitError::MalformedBody(format!(
                "no jump to patch at {}",
                index
            ))),
        }
    }

    fn pending_jump(&mut self, word: &str) -> Result<usize> {
        self.control_stack
            .pop()
            .ok_or_else(|| KitError::ControlFlow(format!("'{}' without 'if'", word)))
    }
}

/// `:` ( -- ) read a name and start compiling a definition of it
pub fn begin_definition(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    if interp.mode == Mode::Compile {
        return Err(KitError::ControlFlow(
            "':' inside a definition".to_string(),
        ));
    }
    let token = match interp.next_token() {
        Some(token) => token?,
        None => return Err(KitError::ControlFlow("':' expects a name".to_string())),
    };
    match token.kind {
        TokenKind::Word => {}
        TokenKind::EndOfInput => {
            interp.push_back(token);
            return Err(KitError::ControlFlow("':' expects a name".to_string()));
        }
        _ => {
            return Err(KitError::invalid_param(format!(
                "':' expects a word for a name, got '{}'",
                token.text
            )));
        }
    }

    debug!(word = %token.text, "compile");
    interp.dictionary.define(token.text, execute_definition);
    interp.control_stack.clear();
    interp.mode = Mode::Compile;
    Ok(())
}

/// `;` (immediate) finish the definition with the return epilogue
pub fn end_definition(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let entry = interp.building()?;
    interp.compile(Value::pseudo(";", engine::pop_return_stack))?;
    interp.dictionary.mark_complete(entry);
    interp.mode = Mode::Execute;

    if !interp.control_stack.is_empty() {
        interp.control_stack.clear();
        let word = interp
            .dictionary
            .get(entry)
            .map(|e| e.word.clone())
            .unwrap_or_default();
        return Err(KitError::ControlFlow(format!(
            "unterminated 'if' in '{}'",
            word
        )));
    }
    Ok(())
}

/// `if` (immediate) compile a conditional jump with an open target
pub fn begin_if(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let index = interp.compile(Value::pseudo("jmp-if-false", engine::jump_if_false))?;
    interp.control_stack.push(index);
    Ok(())
}

/// `else` (immediate) close the `if` past a new unconditional jump
pub fn begin_else(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let len = interp.body_len()?;
    let pending = interp.pending_jump("else")?;
    interp.patch(pending, len + 1)?;
    let index = interp.compile(Value::pseudo("jmp", engine::jump))?;
    interp.control_stack.push(index);
    Ok(())
}

/// `then` (immediate) close the pending jump at the end of the body
pub fn end_if(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let len = interp.body_len()?;
    let pending = interp.pending_jump("then")?;
    interp.patch(pending, len)
}
