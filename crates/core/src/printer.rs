//! Printer registry and value rendering
//!
//! Built-in kinds have fixed renderings. Custom values are rendered by the
//! printer registered for their type tag; without one they print as
//! `Custom param (tag)`.

use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::collections::HashMap;

/// Renders a Custom value. Printers get the interpreter so they can render
/// nested values (or run words) while building their text.
pub type Printer = fn(&mut Interpreter, &Value) -> Result<String>;

#[derive(Debug, Default)]
pub struct PrinterRegistry {
    printers: HashMap<String, Printer>,
}

impl PrinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the printer for `tag`
    pub fn register(&mut self, tag: impl Into<String>, printer: Printer) {
        self.printers.insert(tag.into(), printer);
    }

    pub fn get(&self, tag: &str) -> Option<Printer> {
        self.printers.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }

    pub fn clear(&mut self) {
        self.printers.clear();
    }
}

fn default_render(dictionary: &Dictionary, value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Double(d) => format!("{:.6}", d),
        Value::Str(s) => format!("\"{}\"", s),
        Value::EntryRef(id) => match dictionary.get(*id) {
            Some(entry) => format!("Entry: {}", entry.word),
            None => format!("Entry: <{}>", id.index()),
        },
        Value::Routine(r) => format!("Routine: {:#x}", *r as usize),
        Value::Pseudo(p) => format!("Pseudo-entry: {}", p.word),
        Value::Custom(c) => format!("Custom param ({})", c.type_tag()),
    }
}

impl Interpreter {
    pub fn register_printer(&mut self, tag: &str, printer: Printer) {
        self.printers.register(tag, printer);
    }

    /// Text for a value, without a trailing newline
    pub fn render(&mut self, value: &Value) -> String {
        let printer = match value {
            Value::Custom(custom) => self.printers.get(custom.type_tag()),
            _ => None,
        };
        if let Some(printer) = printer {
            match printer(self, value) {
                Ok(text) => return text,
                Err(e) => self.report(e),
            }
        }
        default_render(&self.dictionary, value)
    }

    /// Write a value's rendering and a newline to the output sink
    pub fn print_value(&mut self, value: &Value) -> Result<()> {
        let mut text = self.render(value);
        text.push('\n');
        self.write_out(&text)
    }
}
