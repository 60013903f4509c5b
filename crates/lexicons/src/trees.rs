//! Trees lexicon
//!
//! `forest` (seq id-field parent-id-field -- forest) arranges a flat sequence
//! into a hierarchy. Ids are read with `'<field>' @field`, so any item kind
//! with an `@field` word can be arranged. Items whose parent isn't in the
//! sequence are roots. Roots and siblings keep their order in the sequence.

use crate::sequence::into_sequence;
use kit_core::{CustomValue, Interpreter, Invocation, KitError, Result, Value};
use std::any::Any;
use std::collections::{HashMap, HashSet};

pub const FOREST_TAG: &str = "Forest";

const TEE: &str = "├────";
const END: &str = "└────";
const INDENT: &str = "     ";

#[derive(Debug, Clone)]
pub struct ForestNode {
    pub id: String,
    pub item: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub roots: Vec<ForestNode>,
    /// Parent id to children, in sequence order
    pub children: HashMap<String, Vec<ForestNode>>,
    pub id_field: String,
    pub parent_id_field: String,
}

impl Forest {
    pub fn children_of(&self, id: &str) -> &[ForestNode] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of items in the forest
    pub fn len(&self) -> usize {
        self.roots.len() + self.children.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CustomValue for Forest {
    fn type_tag(&self) -> &str {
        FOREST_TAG
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
}

pub fn add_trees_lexicon(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    crate::ensure_loaded(interp, "[", "lex-sequence")?;
    crate::ensure_loaded(interp, "@field", "lex-records")?;
    interp.define_word("forest", make_forest);
    interp.register_printer(FOREST_TAG, print_forest);
    Ok(())
}

/// Value of `field` on a copy of `item`, as text
fn field_of(interp: &mut Interpreter, item: &Value, field: &str) -> Result<String> {
    let depth = interp.stack().len();
    interp.push(item.clone());
    interp.run_string(&format!("'{}' @field", field))?;

    if interp.stack().len() != depth + 1 {
        interp.stack_mut().truncate(depth);
        return Err(KitError::invalid_param(format!(
            "can't read '{}' from {}",
            field,
            item.kind_name()
        )));
    }
    match interp.pop()? {
        Value::Str(s) => Ok(s),
        Value::Integer(n) => Ok(n.to_string()),
        other => Err(KitError::generic(format!(
            "unknown id type: {}",
            other.kind_name()
        ))),
    }
}

/// Arrange `items` by their id and parent id fields
pub fn build_forest(
    interp: &mut Interpreter,
    items: Vec<Value>,
    id_field: &str,
    parent_id_field: &str,
) -> Result<Forest> {
    let mut nodes = Vec::with_capacity(items.len());
    for item in items {
        let id = field_of(interp, &item, id_field)?;
        let parent = field_of(interp, &item, parent_id_field)?;
        nodes.push((parent, ForestNode { id, item }));
    }

    let ids: HashSet<&str> = nodes.iter().map(|(_, node)| node.id.as_str()).collect();
    let is_child: Vec<bool> = nodes
        .iter()
        .map(|(parent, _)| ids.contains(parent.as_str()))
        .collect();

    let mut forest = Forest {
        id_field: id_field.to_string(),
        parent_id_field: parent_id_field.to_string(),
        ..Forest::default()
    };
    for ((parent, node), child) in nodes.into_iter().zip(is_child) {
        if child {
            forest.children.entry(parent).or_default().push(node);
        } else {
            forest.roots.push(node);
        }
    }
    Ok(forest)
}

fn make_forest(interp: &mut Interpreter, _: Invocation<'_>) -> Result<()> {
    let parent_id_field = interp.pop()?.into_string("forest")?;
    let id_field = interp.pop()?.into_string("forest")?;
    let seq = into_sequence(interp.pop()?, "forest")?;

    let forest = build_forest(interp, seq.0, &id_field, &parent_id_field)?;
    interp.push(Value::custom(forest));
    Ok(())
}

fn print_hierarchy(
    interp: &mut Interpreter,
    forest: &Forest,
    node: &ForestNode,
    level: usize,
    is_last: bool,
    out: &mut String,
) -> Result<()> {
    // Duplicate ids can make a parent its own descendant
    if level > forest.len() {
        return Err(KitError::MalformedBody(format!(
            "cycle in forest at id '{}'",
            node.id
        )));
    }

    for i in (0..level).rev() {
        out.push_str(INDENT);
        if i == 0 {
            out.push_str(if is_last { END } else { TEE });
        } else {
            out.push_str(INDENT);
        }
    }
    out.push_str(&interp.render(&node.item));
    out.push('\n');

    let children = forest.children_of(&node.id);
    for (i, child) in children.iter().enumerate() {
        print_hierarchy(interp, forest, child, level + 1, i + 1 == children.len(), out)?;
    }
    Ok(())
}

fn print_forest(interp: &mut Interpreter, value: &Value) -> Result<String> {
    let forest = value
        .downcast_ref::<Forest>()
        .ok_or_else(|| KitError::invalid_param("not a forest"))?;

    let mut out = String::from("\n");
    for (i, root) in forest.roots.iter().enumerate() {
        print_hierarchy(interp, forest, root, 0, i + 1 == forest.roots.len(), &mut out)?;
        out.push('\n');
    }
    // The caller adds the final newline
    out.pop();
    Ok(out)
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
        interp.run_string("lex-trees").unwrap();
        (interp, out)
    }

    fn ids(nodes: &[ForestNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    const ROWS: &str = "[ \
        [ 'id' '1' 'parent' '0' 'name' 'a' ] record \
        [ 'id' '2' 'parent' '1' 'name' 'b' ] record \
        [ 'id' '3' 'parent' '9' 'name' 'c' ] record \
        [ 'id' '4' 'parent' '1' 'name' 'd' ] record \
        [ 'id' '5' 'parent' '2' 'name' 'e' ] record \
    ]";

    #[test]
    fn test_absent_parents_become_roots_in_order() {
        let (mut interp, _) = interp();
        interp
            .run_string(&format!("{} 'id' 'parent' forest", ROWS))
            .unwrap();
        let forest = interp.peek().unwrap().downcast_ref::<Forest>().unwrap();
        assert_eq!(ids(&forest.roots), vec!["1", "3"]);
        assert_eq!(ids(forest.children_of("1")), vec!["2", "4"]);
        assert_eq!(ids(forest.children_of("2")), vec!["5"]);
        assert!(forest.children_of("3").is_empty());
        assert_eq!(forest.len(), 5);
    }

    #[test]
    fn test_empty_forest() {
        let (mut interp, out) = interp();
        interp.run_string("[ ] 'id' 'parent' forest dup").unwrap();
        let forest = interp.pop().unwrap();
        assert!(forest.downcast_ref::<Forest>().unwrap().is_empty());
        interp.run_string(".").unwrap();
        assert_eq!(out.contents(), "\n");
    }

    #[test]
    fn test_print_forest() {
        let (mut interp, out) = interp();
        interp
            .run_string(&format!("{} 'id' 'parent' forest .", ROWS))
            .unwrap();
        let expected = "\n\
            {id: 1, parent: 0, name: a}\n     \
            ├────{id: 2, parent: 1, name: b}\n               \
            └────{id: 5, parent: 2, name: e}\n     \
            └────{id: 4, parent: 1, name: d}\n\
            \n\
            {id: 3, parent: 9, name: c}\n\
            \n";
        assert_eq!(out.contents(), expected);
    }

    #[test]
    fn test_missing_id_field_fails() {
        let (mut interp, _) = interp();
        interp
            .run_string("[ [ 'name' 'x' ] record ] 'id' 'parent' forest")
            .unwrap();
        assert!(interp.take_error().is_some());
        assert!(interp.stack().is_empty());
    }

    #[test]
    fn test_integer_ids_from_custom_field_word() {
        let (mut interp, _) = interp();
        // Plain integers: every field of an item is the item itself
        interp
            .run_string(": @field pop ; [ 1 2 3 ] 'id' 'parent' forest")
            .unwrap();
        let forest = interp.peek().unwrap().downcast_ref::<Forest>().unwrap();
        // Every item is its own parent, so none is a root
        assert!(forest.roots.is_empty());
        assert_eq!(ids(forest.children_of("2")), vec!["2"]);
        assert_eq!(forest.len(), 3);
        assert!(!forest.is_empty());
    }
}
