//! Data stack and return stack
//!
//! Both are plain LIFOs over `Vec`. The stack owns every element until it is
//! popped; the popper owns it afterwards.

use crate::dictionary::EntryId;
use crate::error::{KitError, Result};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Stack { items: Vec::new() }
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Remove the top element. An empty stack is left untouched.
    pub fn pop(&mut self) -> Result<T> {
        self.items.pop().ok_or(KitError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&T> {
        self.items.last().ok_or(KitError::StackUnderflow)
    }

    /// Element `depth` positions below the top (0 = top)
    pub fn peek_nth(&self, depth: usize) -> Result<&T> {
        self.items
            .len()
            .checked_sub(depth + 1)
            .and_then(|i| self.items.get(i))
            .ok_or(KitError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bottom to top
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Split off everything above `len`, bottom to top
    pub fn split_off(&mut self, len: usize) -> Vec<T> {
        self.items.split_off(len.min(self.items.len()))
    }
}

pub type DataStack = Stack<Value>;

/// Where execution resumes: a position inside an Entry's body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionPointer {
    pub entry: EntryId,
    pub position: usize,
}

impl InstructionPointer {
    pub fn start_of(entry: EntryId) -> Self {
        InstructionPointer { entry, position: 0 }
    }
}

/// Saved instruction pointers. `None` records that the caller was the
/// top-level loop rather than a compiled body.
pub type ReturnStack = Stack<Option<InstructionPointer>>;
