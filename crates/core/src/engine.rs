//! Threaded-code execution engine
//!
//! `execute` walks an Entry's body one Value at a time. EntryRefs call back
//! into `invoke` (and from there into `execute` for compiled definitions),
//! PseudoEntries run their own routine with access to their own body.
//!
//! A call frame is the return-stack slot `execute` pushes on entry. The frame
//! ends when the `;` epilogue pops that slot, when the instruction pointer
//! runs past the end of the body, or when an instruction fails. A failure is
//! reported and only truncates the current body: the caller resumes at its
//! own saved position.

use crate::dictionary::EntryId;
use crate::error::{KitError, Result};
use crate::interpreter::Interpreter;
use crate::stack::InstructionPointer;
use crate::value::{Invocation, Value};
use tracing::trace;

impl Interpreter {
    /// Run the compiled body of `id` in a new call frame
    pub fn execute(&mut self, id: EntryId) -> Result<()> {
        let limit = self.config().max_call_depth;
        if self.return_stack.len() >= limit {
            return Err(KitError::CallDepthExceeded(limit));
        }

        self.return_stack.push(self.ip.take());
        let frame_depth = self.return_stack.len();
        self.ip = Some(InstructionPointer::start_of(id));

        while self.return_stack.len() == frame_depth {
            let Some(ip) = self.ip else {
                break;
            };
            let instruction = self
                .dictionary
                .get(ip.entry)
                .and_then(|entry| entry.body.get(ip.position))
                .cloned();
            let Some(instruction) = instruction else {
                break;
            };

            self.ip = Some(InstructionPointer {
                position: ip.position + 1,
                ..ip
            });
            trace!(entry = ip.entry.index(), position = ip.position, ?instruction, "step");

            if let Err(e) = self.dispatch(instruction) {
                self.report(e);
                break;
            }
        }

        // Leave the frame unless the epilogue already did
        if self.return_stack.len() >= frame_depth {
            self.return_stack.truncate(frame_depth);
            self.ip = self.return_stack.pop().ok().flatten();
        }
        Ok(())
    }

    fn dispatch(&mut self, instruction: Value) -> Result<()> {
        match instruction {
            Value::EntryRef(id) => self.invoke(id),
            Value::Pseudo(pseudo) => (pseudo.routine)(self, Invocation::Pseudo(&pseudo)),
            other => Err(KitError::MalformedBody(format!(
                "cannot execute {}",
                self.describe(&other)
            ))),
        }
    }

    fn describe(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => format!("string \"{}\"", s),
            Value::Integer(n) => format!("integer {}", n),
            other => other.kind_name().to_string(),
        }
    }

    /// Jump to `target` within the body currently executing
    pub(crate) fn jump_to(&mut self, target: usize) -> Result<()> {
        let ip = self
            .ip
            .as_mut()
            .ok_or_else(|| KitError::ControlFlow("jump outside a definition".to_string()))?;
        ip.position = target;
        Ok(())
    }
}

/// Routine of every compiled definition
pub fn execute_definition(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let id = invocation
        .entry()
        .ok_or_else(|| KitError::MalformedBody("definition invoked inline".to_string()))?;
    interp.execute(id)
}

/// `;` epilogue: restore the caller's instruction pointer
pub fn pop_return_stack(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.ip = interp.return_stack.pop()?;
    Ok(())
}

/// Push a copy of the literal held in body[0]
pub fn push_literal(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let value = invocation.param(interp, 0)?;
    interp.push(value);
    Ok(())
}

fn jump_target(interp: &Interpreter, invocation: &Invocation<'_>) -> Result<usize> {
    match invocation.param(interp, 0)? {
        Value::Integer(n) if n >= 0 => Ok(n as usize),
        other => Err(KitError::MalformedBody(format!(
            "bad jump target: {:?}",
            other
        ))),
    }
}

/// Unconditional jump to body[0]
pub fn jump(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let target = jump_target(interp, &invocation)?;
    interp.jump_to(target)
}

/// Pop a condition and jump to body[0] when it is false
pub fn jump_if_false(interp: &mut Interpreter, invocation: Invocation<'_>) -> Result<()> {
    let condition = interp.pop()?;
    if condition.truthy()? {
        return Ok(());
    }
    let target = jump_target(interp, &invocation)?;
    interp.jump_to(target)
}
