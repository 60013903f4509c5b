//! Error Handling
//!
//! Every native operation returns [`Result`]. Errors are never fatal to the
//! process: they are reported where they are caught and the interpreter moves
//! on.
//!
//! # Usage
//!
//! Native operations propagate with `?`:
//! ```ignore
//! fn store(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
//!     let var = interp.pop()?;
//!     let value = interp.pop()?;
//!     ...
//! }
//! ```
//!
//! The innermost `execute` loop, `run_string` and the top-level control loop
//! catch errors and hand them to `Interpreter::report`, which writes them to
//! the diagnostic sink and keeps the last one for `Interpreter::take_error`.

use thiserror::Error;

/// Everything that can go wrong while compiling or executing a word.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KitError {
    /// Pop or peek on an empty (or too shallow) stack
    #[error("stack underflow")]
    StackUnderflow,

    /// Name not found in the dictionary and not a literal
    #[error("unknown word: {0}")]
    UnknownWord(String),

    /// Wrong Value kind for the requested operation
    #[error("invalid param: {0}")]
    InvalidParam(String),

    /// The token source produced a category the interpreter can't handle
    #[error("unknown token type: {0}")]
    UnknownTokenType(String),

    /// A compiled body holds something that can't be executed
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// Unbalanced or misplaced `if` / `else` / `then` / `;`
    #[error("control flow: {0}")]
    ControlFlow(String),

    /// Too many nested executions
    #[error("call depth exceeded (limit {0})")]
    CallDepthExceeded(usize),

    /// IO, parsing and collaborator failures
    #[error("{0}")]
    Generic(String),
}

impl KitError {
    pub fn invalid_param(detail: impl Into<String>) -> Self {
        KitError::InvalidParam(detail.into())
    }

    pub fn generic(detail: impl Into<String>) -> Self {
        KitError::Generic(detail.into())
    }
}

impl From<std::io::Error> for KitError {
    fn from(err: std::io::Error) -> Self {
        KitError::Generic(err.to_string())
    }
}

pub type Result<T, E = KitError> = std::result::Result<T, E>;
