//! Macro preprocessor for `run_string`
//!
//! A marker followed by a digit N is replaced by the String at depth N of the
//! data stack (0 = top). Single quotes become double quotes so templates can
//! carry string literals. Substituted text is inserted verbatim, quotes
//! included. The stack is only read, never popped.

use crate::error::{KitError, Result};
use crate::stack::DataStack;

pub fn expand(template: &str, stack: &DataStack, marker: char) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == marker {
            if let Some(depth) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                let value = stack.peek_nth(depth as usize)?;
                let text = value.as_str().ok_or_else(|| {
                    KitError::invalid_param(format!(
                        "macro reference {}{} is a {}, not a string",
                        marker,
                        depth,
                        value.kind_name()
                    ))
                })?;
                out.push_str(text);
                continue;
            }
            out.push(ch);
        } else if ch == '\'' {
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}
