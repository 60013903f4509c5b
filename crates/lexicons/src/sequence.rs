//! Sequence lexicon
//!
//! - `[` ( -- mark) start a sequence
//! - `]` (mark x1 .. xn -- seq) collect everything above the nearest mark
//! - `len` (seq -- seq n)
//! - `map` (seq word -- seq') run `word` on every element
//! - `sort` (seq word -- seq) stable sort by the key `word` computes; the word
//!   has the effect (item -- item key)

use kit_core::{CustomValue, Interpreter, Invocation, KitError, Result, Value};
use std::any::Any;
use std::cmp::Ordering;

pub const SEQUENCE_TAG: &str = "[?]";
const START_TAG: &str = "[";

/// Ordered values collected by `]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence(pub Vec<Value>);

impl Sequence {
    pub fn items(&self) -> &[Value] {
        &self.0
    }
}

impl CustomValue for Sequence {
    fn type_tag(&self) -> &str {
        SEQUENCE_TAG
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
            .downcast_ref::<Sequence>()
            .is_some_and(|o| o == self)
    }
}

/// Marker pushed by `[`
#[derive(Debug, Clone, Copy)]
struct SequenceStart;

impl CustomValue for SequenceStart {
    fn type_tag(&self) -> &str {
        START_TAG
    }

    fn clone_box(&self) -> Box<dyn CustomValue> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn equals(&self, other: &dyn CustomValue) -> bool {
        other.as_any().is::<SequenceStart>()
    }
}

fn is_start(value: &Value) -> bool {
    value.downcast_ref::<SequenceStart>().is_some()
}

/// Take a Sequence out of a popped value
pub fn into_sequence(value: Value, context: &str) -> Result<Sequence> {
    match value.downcast_ref::<Sequence>() {
        Some(seq) => Ok(seq.clone()),
        None => Err(KitError::invalid_param(format!(
            "{} expects a sequence, got {}",
            context,
            value.kind_name()
        ))),
    }
}

pub fn add_sequence_lexicon(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.define_word("[", start_sequence);
    interp.define_word("]", end_sequence);
    interp.define_word("len", len);
    interp.define_word("map", map);
    interp.define_word("sort", sort);
    interp.register_printer(SEQUENCE_TAG, print_sequence);
    interp.register_printer(START_TAG, |_, _| Ok("[".to_string()));
    Ok(())
}

fn start_sequence(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    interp.push(Value::custom(SequenceStart));
    Ok(())
}

/// Collect everything above the nearest start mark. Without a mark the
/// stack is left alone.
fn collect(interp: &mut Interpreter) -> Result<Sequence> {
    let stack = interp.stack_mut();
    let mark = stack
        .iter()
        .rposition(is_start)
        .ok_or(KitError::StackUnderflow)?;
    let items = stack.split_off(mark + 1);
    stack.pop()?;
    Ok(Sequence(items))
}

fn end_sequence(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let seq = collect(interp)?;
    interp.push(Value::custom(seq));
    Ok(())
}

fn len(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let n = match interp.peek()?.downcast_ref::<Sequence>() {
        Some(seq) => seq.0.len(),
        None => return Err(KitError::invalid_param("len expects a sequence")),
    };
    interp.push(Value::Integer(n as i64));
    Ok(())
}

fn map(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let word = interp.pop()?.into_string("map")?;
    let seq = into_sequence(interp.pop()?, "map")?;

    // The mark and partial results are dropped if anything goes wrong
    let depth = interp.stack().len();
    interp.push(Value::custom(SequenceStart));
    for item in seq.0 {
        interp.push(item);
        if let Err(e) = interp.run_string(&word) {
            interp.stack_mut().truncate(depth);
            return Err(e);
        }
    }

    let stack = interp.stack_mut();
    if !stack.iter().nth(depth).is_some_and(is_start) {
        stack.truncate(depth);
        return Err(KitError::invalid_param(format!(
            "map word '{}' consumed the sequence mark",
            word
        )));
    }
    let items = stack.split_off(depth + 1);
    stack.truncate(depth);
    interp.push(Value::custom(Sequence(items)));
    Ok(())
}

#[derive(Debug, PartialEq)]
enum SortKey {
    Integer(i64),
    Double(f64),
    Text(String),
}

impl SortKey {
    fn is_number(&self) -> bool {
        !matches!(self, SortKey::Text(_))
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Integer(a), SortKey::Integer(b)) => a.cmp(b),
            (SortKey::Double(a), SortKey::Double(b)) => a.total_cmp(b),
            (SortKey::Integer(a), SortKey::Double(b)) => (*a as f64).total_cmp(b),
            (SortKey::Double(a), SortKey::Integer(b)) => a.total_cmp(&(*b as f64)),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (a, _) if a.is_number() => Ordering::Less,
            _ => Ordering::Greater,
        }
    }
}

/// Run `word` on a copy of `item` and take the key it leaves on top
fn sort_key(interp: &mut Interpreter, item: &Value, word: &str) -> Result<SortKey> {
    let depth = interp.stack().len();
    interp.push(item.clone());
    if let Err(e) = interp.run_string(word) {
        interp.stack_mut().truncate(depth);
        return Err(e);
    }

    if interp.stack().len() != depth + 2 {
        interp.stack_mut().truncate(depth);
        return Err(KitError::invalid_param(format!(
            "sort word '{}' must leave the item and one key",
            word
        )));
    }
    let key = interp.pop()?;
    interp.pop()?;
    match key {
        Value::Integer(n) => Ok(SortKey::Integer(n)),
        Value::Double(d) => Ok(SortKey::Double(d)),
        Value::Str(s) => Ok(SortKey::Text(s)),
        other => Err(KitError::invalid_param(format!(
            "can't sort by {}",
            other.kind_name()
        ))),
    }
}

fn sort_keys(interp: &mut Interpreter, items: &[Value], word: &str) -> Result<Vec<SortKey>> {
    let mut keys = Vec::with_capacity(items.len());
    for item in items {
        keys.push(sort_key(interp, item, word)?);
    }

    let numeric = keys.iter().filter(|k| k.is_number()).count();
    if numeric != 0 && numeric != keys.len() {
        return Err(KitError::invalid_param(
            "sort keys mix numbers and strings",
        ));
    }
    Ok(keys)
}

/// On failure the sequence goes back on the stack unsorted
fn sort(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let word = interp.pop()?.into_string("sort")?;
    let seq = into_sequence(interp.pop()?, "sort")?;

    let keys = match sort_keys(interp, &seq.0, &word) {
        Ok(keys) => keys,
        Err(e) => {
            interp.push(Value::custom(seq));
            return Err(e);
        }
    };

    let mut keyed: Vec<(SortKey, Value)> = keys.into_iter().zip(seq.0).collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b));
    let sorted = keyed.into_iter().map(|(_, item)| item).collect();
    interp.push(Value::custom(Sequence(sorted)));
    Ok(())
}

fn print_sequence(interp: &mut Interpreter, value: &Value) -> Result<String> {
    let seq = value
        .downcast_ref::<Sequence>()
        .ok_or_else(|| KitError::invalid_param("not a sequence"))?;
    let parts: Vec<String> = seq.0.iter().map(|item| interp.render(item)).collect();
    Ok(format!("[{}]", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook_up_extensions;
    use kit_core::OutputBuffer;

    fn interp() -> (Interpreter, OutputBuffer) {
        let mut interp = Interpreter::new();
        let out = OutputBuffer::new();
        interp.set_output(out.clone());
        interp.set_diagnostics(OutputBuffer::new());
        hook_up_extensions(&mut interp);
        interp.run_string("lex-sequence").unwrap();
        (interp, out)
    }

    fn top_items(interp: &Interpreter) -> Vec<Value> {
        interp
            .peek()
            .unwrap()
            .downcast_ref::<Sequence>()
            .unwrap()
            .0
            .clone()
    }

    #[test]
    fn test_collect_preserves_order() {
        let (mut interp, _) = interp();
        interp.run_string("0 [ 1 2 3 ]").unwrap();
        assert_eq!(
            top_items(&interp),
            vec![Value::int(1), Value::int(2), Value::int(3)]
        );
        assert_eq!(interp.stack().len(), 2);
    }

    #[test]
    fn test_nested_sequences() {
        let (mut interp, out) = interp();
        interp.run_string("[ 1 [ 2 3 ] ] .").unwrap();
        assert_eq!(out.contents(), "[1, [2, 3]]\n");
    }

    #[test]
    fn test_missing_mark_leaves_stack() {
        let (mut interp, _) = interp();
        interp.run_string("1 2 ]").unwrap();
        assert_eq!(interp.take_error(), Some(KitError::StackUnderflow));
        assert_eq!(interp.stack().len(), 2);
    }

    #[test]
    fn test_len() {
        let (mut interp, _) = interp();
        interp.run_string("[ \"a\" \"b\" ] len").unwrap();
        assert_eq!(interp.pop().unwrap(), Value::int(2));
        assert_eq!(top_items(&interp).len(), 2);
    }

    #[test]
    fn test_map() {
        let (mut interp, _) = interp();
        interp.run_string("[ 1 2 3 ] \"negate\" map").unwrap();
        assert_eq!(
            top_items(&interp),
            vec![Value::int(-1), Value::int(-2), Value::int(-3)]
        );
        assert_eq!(interp.stack().len(), 1);
    }

    #[test]
    fn test_failed_map_drops_mark_and_partial_results() {
        let (mut interp, _) = interp();
        interp.run_string("0 [ 1 2 ]").unwrap();
        // `0 refers to the item being mapped, which isn't a string
        interp.push(Value::string("`0"));
        let err = interp.invoke_word("map").unwrap_err();
        assert!(matches!(err, KitError::InvalidParam(_)));
        let stack: Vec<Value> = interp.stack().iter().cloned().collect();
        assert_eq!(stack, vec![Value::int(0)]);
    }

    #[test]
    fn test_map_word_eating_the_mark_leaves_older_marks() {
        let (mut interp, _) = interp();
        interp.run_string("[ 7 [ 1 ] \"pop pop\" map").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
        assert_eq!(interp.stack().len(), 2);
        assert!(is_start(interp.stack().iter().next().unwrap()));
        assert_eq!(interp.peek().unwrap(), &Value::int(7));
    }

    #[test]
    fn test_sort_numbers_is_stable() {
        let (mut interp, _) = interp();
        interp
            .run_string(": key dup negate negate ; [ 3 1.5 2 1.5 ] \"key\" sort")
            .unwrap();
        assert_eq!(
            top_items(&interp),
            vec![
                Value::double(1.5),
                Value::double(1.5),
                Value::int(2),
                Value::int(3)
            ]
        );
    }

    #[test]
    fn test_sort_strings() {
        let (mut interp, out) = interp();
        interp
            .run_string("[ \"pear\" \"apple\" \"fig\" ] \"dup\" sort .")
            .unwrap();
        assert_eq!(out.contents(), "[\"apple\", \"fig\", \"pear\"]\n");
    }

    #[test]
    fn test_sort_rejects_mixed_keys() {
        let (mut interp, _) = interp();
        interp.run_string("[ 1 \"a\" ] \"dup\" sort").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
    }

    #[test]
    fn test_sort_word_with_wrong_effect() {
        let (mut interp, _) = interp();
        interp.run_string("9 [ 1 2 ] \"pop\" sort").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
        assert_eq!(interp.stack().len(), 2);
        assert_eq!(top_items(&interp), vec![Value::int(1), Value::int(2)]);
    }

    #[test]
    fn test_failed_sort_keeps_sequence() {
        let (mut interp, _) = interp();
        interp.run_string("[ 2 \"a\" 1 ] \"dup\" sort").unwrap();
        assert!(matches!(interp.take_error(), Some(KitError::InvalidParam(_))));
        assert_eq!(interp.stack().len(), 1);
        assert_eq!(
            top_items(&interp),
            vec![Value::int(2), Value::string("a"), Value::int(1)]
        );
    }

    #[test]
    fn test_sort_large_integers_exactly() {
        let (mut interp, _) = interp();
        // Both keys round to the same f64
        interp
            .run_string("[ 9007199254740993 9007199254740992 ] \"dup\" sort")
            .unwrap();
        assert_eq!(
            top_items(&interp),
            vec![
                Value::int(9007199254740992),
                Value::int(9007199254740993)
            ]
        );
    }
}
