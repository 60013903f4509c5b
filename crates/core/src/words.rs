//! Basic word set
//!
//! ### Interpreter control
//! - `.q` ( -- ) quit the control loop
//! - `.i` ( -- ) read from an interactive source until it runs dry
//!
//! ### Stack words
//! - `.` (x -- ) print
//! - `.s` ( -- ) print the stack, top first, without popping
//! - `pop`, `drop` (x -- )
//! - `dup` (x -- x x)
//! - `negate` (n -- -n)
//! - `not` (x -- flag)
//!
//! ### Constants and variables
//! - `constant` (val name -- )
//! - `variable` (name -- )
//! - `!` (val var -- )
//! - `@` (var -- val)
//!
//! ### Definitions
//! - `,` (str -- ?) evaluate a string after macro expansion
//! - `:` starts a definition, `;` (immediate) ends it
//! - `.d` (name -- ) print the body of a definition
//!
//! ### Branching
//! - `if`, `else`, `then` (immediate)

use crate::compiler;
use crate::error::{KitError, Result};
use crate::interpreter::Interpreter;
use crate::value::{Invocation, Value};

pub fn add_basic_words(interp: &mut Interpreter) {
    interp.define_word(".q", quit);
    interp.define_word(".i", interactive);

    interp.define_word(".", print);
    interp.define_word(".s", print_stack);
    interp.define_word("pop", pop);
    interp.define_word("drop", pop);
    interp.define_word("dup", dup);

    interp.define_word("negate", negate);
    interp.define_word("not", not);

    interp.define_word("constant", constant);
    interp.define_word("variable", variable);
    interp.define_word("!", store);
    interp.define_word("@", fetch);

    interp.define_word(",", execute_string);

    interp.define_word(":", compiler::begin_definition);
    interp.define_immediate(";", compiler::end_definition);
    interp.define_word(".d", print_definition);

    interp.define_immediate("if", compiler::begin_if);
    interp.define_immediate("else", compiler::begin_else);
    interp.define_immediate("then", compiler::end_if);
}

fn quit(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.request_quit();
    Ok(())
}

fn interactive(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.push_interactive();
    Ok(())
}

fn print(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let value = interp.pop()?;
    interp.print_value(&value)
}

fn print_stack(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let values: Vec<Value> = interp.stack().iter().rev().cloned().collect();
    for value in &values {
        interp.print_value(value)?;
    }
    interp.write_out("\n")
}

fn pop(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.pop().map(drop)
}

fn dup(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let top = interp.peek()?.clone();
    interp.push(top);
    Ok(())
}

fn negate(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let value = interp.pop()?;
    match value {
        Value::Integer(n) => interp.push(Value::Integer(n.wrapping_neg())),
        Value::Double(d) => interp.push(Value::Double(-d)),
        other => {
            let kind = other.kind_name().to_string();
            interp.push(other);
            return Err(KitError::invalid_param(format!("can't negate {}", kind)));
        }
    }
    Ok(())
}

fn not(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let value = interp.pop()?;
    let flag = match &value {
        Value::Integer(n) => *n == 0,
        Value::Double(d) => *d == 0.0,
        Value::Str(s) => s.is_empty(),
        other => {
            return Err(KitError::invalid_param(format!(
                "can't 'not' {}",
                other.kind_name()
            )));
        }
    };
    interp.push(Value::Integer(flag as i64));
    Ok(())
}

fn constant(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let name = interp.pop()?.into_string("constant")?;
    let value = interp.pop()?;
    interp.define_constant(&name, value);
    Ok(())
}

fn variable(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let name = interp.pop()?.into_string("variable")?;
    interp.define_variable(&name);
    Ok(())
}

fn store(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let var = interp.pop()?;
    let value = interp.pop()?;
    *interp.variable_slot(&var)? = value;
    Ok(())
}

fn fetch(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let var = interp.pop()?;
    let value = interp.variable_slot(&var)?.clone();
    interp.push(value);
    Ok(())
}

fn execute_string(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let source = interp.pop()?.into_string(",")?;
    interp.run_string(&source)
}

fn print_definition(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let word = interp.pop()?.into_string(".d")?;
    let id = interp
        .dictionary()
        .lookup(&word)
        .ok_or(KitError::UnknownWord(word))?;
    let body = interp
        .dictionary()
        .get(id)
        .map(|entry| entry.body.clone())
        .unwrap_or_default();
    for value in &body {
        interp.print_value(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::OutputBuffer;

    fn capture() -> (Interpreter, OutputBuffer) {
        let mut interp = Interpreter::new();
        let out = OutputBuffer::new();
        interp.set_output(out.clone());
        interp.set_diagnostics(OutputBuffer::new());
        (interp, out)
    }

    fn stack(interp: &Interpreter) -> Vec<Value> {
        interp.stack().iter().cloned().collect()
    }

    #[test]
    fn test_print_and_print_stack() {
        let (mut interp, out) = capture();
        interp.run_string("1 2.5 \"x\" .s .").unwrap();
        assert_eq!(out.contents(), "\"x\"\n2.500000\n1\n\n\"x\"\n");
        assert_eq!(stack(&interp), vec![Value::int(1), Value::double(2.5)]);
    }

    #[test]
    fn test_dup_copies_strings() {
        let (mut interp, _) = capture();
        interp.run_string("\"abc\" dup").unwrap();
        assert_eq!(
            stack(&interp),
            vec![Value::string("abc"), Value::string("abc")]
        );
    }

    #[test]
    fn test_negate() {
        let (mut interp, _) = capture();
        interp.run_string("5 negate 1.5 negate").unwrap();
        assert_eq!(stack(&interp), vec![Value::int(-5), Value::double(-1.5)]);

        interp.run_string("\"s\" negate").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
        assert_eq!(interp.pop().unwrap(), Value::string("s"));
    }

    #[test]
    fn test_not() {
        let (mut interp, _) = capture();
        interp.run_string("0 not 3 not 0.0 not \"\" not \"a\" not").unwrap();
        assert_eq!(
            stack(&interp),
            vec![
                Value::int(1),
                Value::int(0),
                Value::int(1),
                Value::int(1),
                Value::int(0)
            ]
        );
    }

    #[test]
    fn test_constant_pops_name_then_value() {
        let (mut interp, _) = capture();
        interp.run_string("42 \"answer\" constant answer answer").unwrap();
        assert_eq!(stack(&interp), vec![Value::int(42), Value::int(42)]);
    }

    #[test]
    fn test_variable_store_fetch() {
        let (mut interp, _) = capture();
        interp
            .run_string("\"x\" variable x @ 7 x ! x @ \"s\" x ! x @")
            .unwrap();
        assert_eq!(
            stack(&interp),
            vec![Value::int(0), Value::int(7), Value::string("s")]
        );
    }

    #[test]
    fn test_store_into_non_variable() {
        let (mut interp, _) = capture();
        interp.run_string("1 2 !").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
    }

    #[test]
    fn test_execute_string_expands_macros() {
        let (mut interp, out) = capture();
        interp.run_string("\"hi\" \"'`0' .\" ,").unwrap();
        // The template is popped before expansion, so `0 is "hi"
        assert_eq!(out.contents(), "\"hi\"\n");
        assert_eq!(stack(&interp), vec![Value::string("hi")]);
    }

    #[test]
    fn test_print_definition() {
        let (mut interp, out) = capture();
        interp.run_string(": w 1 dup ; \"w\" .d").unwrap();
        assert_eq!(
            out.contents(),
            "Pseudo-entry: push-literal\nEntry: dup\nPseudo-entry: ;\n"
        );

        interp.run_string("\"nothing\" .d").unwrap();
        assert_eq!(
            interp.take_error(),
            Some(KitError::UnknownWord("nothing".to_string()))
        );
    }

    #[test]
    fn test_quit_sets_flag() {
        let (mut interp, _) = capture();
        assert!(!interp.quit_requested());
        interp.run_string(".q").unwrap();
        assert!(interp.quit_requested());
    }

    #[test]
    fn test_interactive_reads_from_factory() {
        let (mut interp, _) = capture();
        interp.set_interactive_source(|_| Box::new(crate::lexer::Lexer::new("40 2")));
        interp.push_source(Box::new(crate::lexer::Lexer::new(".i 3")));
        interp.run();
        assert_eq!(
            stack(&interp),
            vec![Value::int(40), Value::int(2), Value::int(3)]
        );
    }
}
