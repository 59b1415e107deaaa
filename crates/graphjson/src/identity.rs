//! Per-call identity bookkeeping for reference nodes.

use std::collections::{HashMap, HashSet};

use crate::NodeId;

/// Encode side: reference targets whose payload has already been written.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<NodeId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as emitted. Returns `true` the first time only.
    pub fn first_visit(&mut self, id: NodeId) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Decode side: identity tokens found in the document, mapped to the nodes
/// allocated for them.
#[derive(Debug, Default)]
pub struct BackrefTable {
    nodes: HashMap<u64, NodeId>,
}

impl BackrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the node allocated for `token`. Returns `false` (and leaves the
    /// table unchanged) if the token was already registered.
    pub fn register(&mut self, token: u64, node: NodeId) -> bool {
        match self.nodes.entry(token) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    pub fn resolve(&self, token: u64) -> Option<NodeId> {
        self.nodes.get(&token).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Heap, Value};

    #[test]
    fn visited_set_contains_or_inserts() {
        let mut heap = Heap::new();
        let a = heap.alloc(Value::Bool(true));
        let b = heap.alloc(Value::Bool(false));
        let mut visited = VisitedSet::new();
        assert!(visited.first_visit(a));
        assert!(!visited.first_visit(a));
        assert!(visited.first_visit(b));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn backref_table_registers_once() {
        let mut heap = Heap::new();
        let a = heap.alloc(Value::Bool(true));
        let b = heap.alloc(Value::Bool(false));
        let mut table = BackrefTable::new();
        assert!(table.is_empty());
        assert!(table.register(7, a));
        assert!(!table.register(7, b));
        assert_eq!(table.resolve(7), Some(a));
        assert_eq!(table.resolve(8), None);
    }
}
