//! Records lexicon
//!
//! A Record is one string-keyed row, the shape a "select rows" query hands
//! back. Columns keep the order they were given in.
//!
//! - `record` (seq -- record) build from alternating key/value strings
//! - `@field` (record name -- value)

use crate::sequence::into_sequence;
use kit_core::{CustomValue, Interpreter, Invocation, KitError, Result, Value};
use std::any::Any;

pub const RECORD_TAG: &str = "Record";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an existing one of the same name
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.columns.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl CustomValue for Record {
    fn type_tag(&self) -> &str {
        RECORD_TAG
    }

    fn clone_box(&self) -> Box<dyn CustomValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn equals(&self, other: &dyn CustomValue) -> bool {
        other
            .as_any()
            .downcast_ref::<Record>()
            .is_some_and(|o| o == self)
    }
}

pub fn add_records_lexicon(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    crate::ensure_loaded(interp, "[", "lex-sequence")?;
    interp.define_word("record", make_record);
    interp.define_word("@field", get_field);
    interp.register_printer(RECORD_TAG, print_record);
    Ok(())
}

fn make_record(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let seq = into_sequence(interp.pop()?, "record")?;
    let items = seq.items();
    if items.len() % 2 != 0 {
        return Err(KitError::invalid_param(
            "record needs key/value pairs",
        ));
    }

    let mut record = Record::new();
    for pair in items.chunks(2) {
        match (&pair[0], &pair[1]) {
            (Value::Str(k), Value::Str(v)) => record.set(k.as_str(), v.as_str()),
            (k, v) => {
                return Err(KitError::invalid_param(format!(
                    "record keys and values must be strings, got {} and {}",
                    k.kind_name(),
                    v.kind_name()
                )));
            }
        }
    }
    interp.push(Value::custom(record));
    Ok(())
}

fn get_field(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let name = interp.pop()?.into_string("@field")?;
    let value = interp.pop()?;
    let record = value.downcast_ref::<Record>().ok_or_else(|| {
        KitError::invalid_param(format!("@field expects a record, got {}", value.kind_name()))
    })?;
    let field = record
        .get(&name)
        .ok_or_else(|| KitError::invalid_param(format!("no field '{}'", name)))?
        .to_string();
    interp.push(Value::Str(field));
    Ok(())
}

fn print_record(_: &mut Interpreter, value: &Value) -> Result<String> {
    let record = value
        .downcast_ref::<Record>()
        .ok_or_else(|| KitError::invalid_param("not a record"))?;
    let parts: Vec<String> = record
        .columns()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect();
    Ok(format!("{{{}}}", parts.join(", ")))
}
