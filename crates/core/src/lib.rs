//! Kit Core: the kit control language
//!
//! A small Forth: tagged values, an append-only dictionary where later
//! definitions shadow earlier ones, a compile/execute mode switch with
//! back-patched conditionals, and a threaded-code engine with a data stack,
//! a return stack and a single instruction pointer.
//!
//! # Modules
//!
//! - `value`: Value enum, PseudoEntry and the CustomValue extension trait
//! - `dictionary`: Entry arena with newest-first lookup
//! - `stack`: data stack, return stack and instruction pointer
//! - `lexer` / `input`: tokens and token sources
//! - `compiler`: Compile mode, `:` `;` `if` `else` `then`
//! - `engine`: `execute` and the inline jump/literal routines
//! - `macros`: backtick expansion for `run_string`
//! - `printer`: per-type printers and `render`
//! - `words`: the basic word set
//! - `interpreter`: the state all of the above runs against
//!
//! # Example
//!
//! ```rust,ignore
//! use kit_core::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! interp.run_string(": sign if \"yes\" else \"no\" then ; 1 sign")?;
//! assert_eq!(interp.pop()?, Value::string("yes"));
//! ```

pub mod compiler;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod input;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod printer;
pub mod stack;
pub mod value;
pub mod words;

pub use compiler::Mode;
pub use config::InterpreterConfig;
pub use dictionary::{Dictionary, Entry, EntryId};
pub use error::{KitError, Result};
pub use input::{InputStack, ReaderSource, TokenSource};
pub use interpreter::{Interpreter, OutputBuffer};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use printer::{Printer, PrinterRegistry};
pub use stack::{DataStack, InstructionPointer, ReturnStack, Stack};
pub use value::{CustomValue, Invocation, PseudoEntry, Routine, Value};
