use crate::dictionary::EntryId;
use crate::error::{KitError, Result};
use crate::interpreter::Interpreter;
use std::any::Any;
use std::fmt;

/// Native operation behind an Entry or a PseudoEntry.
///
/// The routine receives the interpreter and the thing being invoked, so that it
/// can read its own body (a jump target, a literal, a variable's value).
pub type Routine = fn(&mut Interpreter, Invocation<'_>) -> Result<()>;

/// What a [`Routine`] was invoked on
#[derive(Debug, Clone, Copy)]
pub enum Invocation<'a> {
    /// A Dictionary Entry (primitive or compiled definition)
    Entry(EntryId),
    /// An inline PseudoEntry found in a compiled body
    Pseudo(&'a PseudoEntry),
}

impl Invocation<'_> {
    /// Entry being invoked, if this is not a PseudoEntry
    pub fn entry(&self) -> Option<EntryId> {
        match self {
            Invocation::Entry(id) => Some(*id),
            Invocation::Pseudo(_) => None,
        }
    }

    /// Copy of the Value at `index` in the invoked thing's body
    pub fn param(&self, interp: &Interpreter, index: usize) -> Result<Value> {
        let (word, body) = match self {
            Invocation::Entry(id) => {
                let entry = interp
                    .dictionary()
                    .get(*id)
                    .ok_or_else(|| KitError::MalformedBody(format!("dangling {:?}", id)))?;
                (entry.word.as_str(), entry.body.as_slice())
            }
            Invocation::Pseudo(pseudo) => (pseudo.word.as_str(), pseudo.body.as_slice()),
        };
        body.get(index).cloned().ok_or_else(|| {
            KitError::MalformedBody(format!("'{}' has no param {}", word, index))
        })
    }
}

/// Anonymous inline entry created by the compiler for literals and jumps
#[derive(Clone)]
pub struct PseudoEntry {
    pub word: String,
    pub routine: Routine,
    pub body: Vec<Value>,
}

impl PseudoEntry {
    pub fn new(word: impl Into<String>, routine: Routine) -> Self {
        PseudoEntry {
            word: word.into(),
            routine,
            body: Vec::new(),
        }
    }

    pub fn with_param(mut self, value: Value) -> Self {
        self.body.push(value);
        self
    }
}

impl fmt::Debug for PseudoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudoEntry")
            .field("word", &self.word)
            .field("body", &self.body)
            .finish()
    }
}

/// Native data stored by an extension lexicon
///
/// This replaces a destructor/cloner pair: the payload is dropped with the
/// Value that owns it, and duplicated through `clone_box`. Rendering is looked
/// up by `type_tag` in the interpreter's printer registry.
pub trait CustomValue: fmt::Debug + 'static {
    /// Tag used for printer lookup and in diagnostics (e.g. "Forest")
    fn type_tag(&self) -> &str;

    /// Independent copy of this payload
    fn clone_box(&self) -> Box<dyn CustomValue>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Structural equality against another payload with the same tag.
    /// Payloads that can't be compared are never equal.
    fn equals(&self, _other: &dyn CustomValue) -> bool {
        false
    }
}

impl Clone for Box<dyn CustomValue> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Value: the unit of data on the stacks and inside compiled bodies
///
/// Exactly one payload per variant. Cloning gives an independent copy:
/// strings are deep-copied, Custom payloads go through `clone_box`, and
/// EntryRef / Routine copy the reference.
pub enum Value {
    Integer(i64),

    Double(f64),

    Str(String),

    /// Non-owning reference to a Dictionary Entry
    EntryRef(EntryId),

    /// Native operation held as data
    Routine(Routine),

    /// Inline entry compiled into a body (literal push, jumps, epilogue)
    Pseudo(Box<PseudoEntry>),

    /// Extension payload
    Custom(Box<dyn CustomValue>),
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Integer(n)
    }

    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn entry(id: EntryId) -> Self {
        Value::EntryRef(id)
    }

    pub fn routine(routine: Routine) -> Self {
        Value::Routine(routine)
    }

    pub fn pseudo(word: impl Into<String>, routine: Routine) -> Self {
        Value::Pseudo(Box::new(PseudoEntry::new(word, routine)))
    }

    pub fn custom(payload: impl CustomValue) -> Self {
        Value::Custom(Box::new(payload))
    }

    /// Short name of the variant, for diagnostics
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::EntryRef(_) => "entry",
            Value::Routine(_) => "routine",
            Value::Pseudo(_) => "pseudo-entry",
            Value::Custom(c) => c.type_tag(),
        }
    }

    /// Truthiness is only defined for numbers: zero is false
    pub fn truthy(&self) -> Result<bool> {
        match self {
            Value::Integer(n) => Ok(*n != 0),
            Value::Double(d) => Ok(*d != 0.0),
            other => Err(KitError::invalid_param(format!(
                "expected a number for a condition, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Take the string out of a Str value, or fail naming `context`
    pub fn into_string(self, context: &str) -> Result<String> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(KitError::invalid_param(format!(
                "{} expects a string, got {}",
                context,
                other.kind_name()
            ))),
        }
    }

    pub fn as_entry(&self) -> Option<EntryId> {
        match self {
            Value::EntryRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Custom payload downcast to `T`
    pub fn downcast_ref<T: CustomValue>(&self) -> Option<&T> {
        match self {
            Value::Custom(c) => c.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn downcast_mut<T: CustomValue>(&mut self) -> Option<&mut T> {
        match self {
            Value::Custom(c) => c.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Integer(n) => Value::Integer(*n),
            Value::Double(d) => Value::Double(*d),
            Value::Str(s) => Value::Str(s.clone()),
            Value::EntryRef(id) => Value::EntryRef(*id),
            Value::Routine(r) => Value::Routine(*r),
            Value::Pseudo(p) => Value::Pseudo(p.clone()),
            Value::Custom(c) => Value::Custom(c.clone_box()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::EntryRef(a), Value::EntryRef(b)) => a == b,
            (Value::Routine(a), Value::Routine(b)) => std::ptr::fn_addr_eq(*a, *b),
            (Value::Pseudo(a), Value::Pseudo(b)) => {
                a.word == b.word && std::ptr::fn_addr_eq(a.routine, b.routine) && a.body == b.body
            }
            (Value::Custom(a), Value::Custom(b)) => {
                a.type_tag() == b.type_tag() && a.equals(b.as_ref())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({})", n),
            Value::Double(d) => write!(f, "Double({})", d),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::EntryRef(id) => write!(f, "EntryRef({})", id.index()),
            Value::Routine(r) => write!(f, "Routine({:#x})", *r as usize),
            Value::Pseudo(p) => write!(f, "Pseudo({:?})", p),
            Value::Custom(c) => write!(f, "Custom({:?})", c),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
