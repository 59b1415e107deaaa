use crate::Value;

/// Handle of a node in a [`Heap`].
///
/// Handles are only meaningful for the heap that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of reference targets.
///
/// A `Value::Ref` holds a [`NodeId`] into a heap; two references share a
/// target when they hold the same id. Nodes are never freed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heap {
    nodes: Vec<Value>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, value: Value) -> NodeId {
        self.nodes.push(value);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Value> {
        self.nodes.get_mut(id.0)
    }

    /// Replaces the contents of a node, returning the old contents.
    pub fn replace(&mut self, id: NodeId, value: Value) -> Option<Value> {
        self.nodes
            .get_mut(id.0)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Drops every node allocated after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }
}
