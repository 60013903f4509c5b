//! Dictionary
//!
//! An append-only arena of Entries plus a name index. Lookup walks the
//! entries registered under a name from newest to oldest and returns the first
//! complete one, so redefining a word shadows the old Entry without touching
//! bodies that already hold an [`EntryId`] for it.

use crate::value::{Routine, Value};
use std::collections::HashMap;

/// Stable handle to an Entry. Ids are never reused while the Dictionary lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named unit of the language
#[derive(Debug, Clone)]
pub struct Entry {
    pub word: String,
    /// Executed while compiling instead of being compiled
    pub immediate: bool,
    /// Incomplete entries are invisible to lookup
    pub complete: bool,
    pub body: Vec<Value>,
    pub routine: Routine,
}

#[derive(Debug, Default)]
pub struct Dictionary {
    entries: Vec<Entry>,
    by_name: HashMap<String, Vec<EntryId>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new, incomplete Entry
    pub fn define(&mut self, word: impl Into<String>, routine: Routine) -> EntryId {
        let word = word.into();
        let id = EntryId(self.entries.len());
        self.by_name.entry(word.clone()).or_default().push(id);
        self.entries.push(Entry {
            word,
            immediate: false,
            complete: false,
            body: Vec::new(),
            routine,
        });
        id
    }

    /// Append an Entry that is visible right away (primitives)
    pub fn add(&mut self, word: impl Into<String>, routine: Routine) -> EntryId {
        let id = self.define(word, routine);
        self.entries[id.0].complete = true;
        id
    }

    /// Most recently defined complete Entry named `word`
    pub fn lookup(&self, word: &str) -> Option<EntryId> {
        self.by_name
            .get(word)?
            .iter()
            .rev()
            .copied()
            .find(|id| self.entries[id.0].complete)
    }

    pub fn latest(&self) -> Option<EntryId> {
        self.entries.len().checked_sub(1).map(EntryId)
    }

    /// Make an Entry visible to lookup. Unknown ids are ignored.
    pub fn mark_complete(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.complete = true;
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in definition order, with their ids
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (EntryId(i), entry))
    }

    /// Drop every Entry and its body
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.entries.clear();
    }
}
