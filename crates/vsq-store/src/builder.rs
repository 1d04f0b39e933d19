//! Incremental construction of [`RevTree`] objects.

use std::collections::BTreeMap;

use vsq_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{Node, NodeKind, RevTree};

/// Accumulates child nodes and produces an immutable [`RevTree`].
///
/// Subtree sizes are captured when a subtree is added so the built tree's
/// `size` and every tree node's bounds are exact aggregates of the features
/// underneath. Names are unique across features and subtrees: putting a
/// child replaces any previous child with the same name.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    features: BTreeMap<String, Node>,
    trees: BTreeMap<String, (Node, u64)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a feature node.
    pub fn put_feature(&mut self, node: Node) {
        debug_assert_eq!(node.kind, NodeKind::Feature);
        self.trees.remove(&node.name);
        self.features.insert(node.name.clone(), node);
    }

    /// Add or replace a subtree under `name`.
    pub fn put_tree(&mut self, name: &str, tree: &RevTree, metadata_id: ObjectId) {
        let mut bounds = None;
        tree.expand(&mut bounds);
        let node = Node::tree(name, tree.id(), metadata_id, bounds);
        self.features.remove(name);
        self.trees.insert(name.to_string(), (node, tree.size()));
    }

    /// Remove a child of either kind. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.features.remove(name).is_some() || self.trees.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.features.len() + self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.trees.is_empty()
    }

    pub fn build(self) -> StoreResult<RevTree> {
        let size = self.features.len() as u64 + self.trees.values().map(|(_, s)| s).sum::<u64>();
        let trees = self.trees.into_values().map(|(node, _)| node).collect();
        let features = self.features.into_values().collect();
        let tree = RevTree::new(size, trees, features)?;
        tracing::trace!(tree = %tree.id().short_hex(), size, "built tree");
        Ok(tree)
    }
}
