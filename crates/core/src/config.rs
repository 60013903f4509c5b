//! Interpreter configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use kit_core::{Interpreter, InterpreterConfig};
//!
//! let config = InterpreterConfig::new()
//!     .with_max_call_depth(64)
//!     .with_diagnostic_prefix("error: ");
//!
//! let mut interp = Interpreter::with_config(config);
//! ```

/// Default limit on nested `execute` calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// Deepest return stack allowed before `execute` refuses to nest further
    pub max_call_depth: usize,

    /// Character that introduces a stack reference in `run_string` input
    pub macro_marker: char,

    /// Written before every reported error
    pub diagnostic_prefix: String,

    /// Prompt shown by interactive token sources
    pub prompt: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            macro_marker: '`',
            diagnostic_prefix: "-----> ".to_string(),
            prompt: "kit> ".to_string(),
        }
    }
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_macro_marker(mut self, marker: char) -> Self {
        self.macro_marker = marker;
        self
    }

    pub fn with_diagnostic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.diagnostic_prefix = prefix.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InterpreterConfig::new();
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.macro_marker, '`');
        assert_eq!(config.diagnostic_prefix, "-----> ");
        assert_eq!(config.prompt, "kit> ");
    }

    #[test]
    fn test_builder() {
        let config = InterpreterConfig::new()
            .with_max_call_depth(4)
            .with_macro_marker('$')
            .with_prompt("> ");
        assert_eq!(config.max_call_depth, 4);
        assert_eq!(config.macro_marker, '$');
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.diagnostic_prefix, "-----> ");
    }
}
