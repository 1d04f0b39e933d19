use std::sync::Arc;

use vsq_diff::{DiffWalk, WalkRoot};
use vsq_store::{
    NodeKind, NodeRef, ObjectStore, ObjectStoreExt, RevFeature, RevFeatureType, RevTree,
    StoreError,
};
use vsq_types::ObjectId;

use crate::error::RepoResult;
use crate::revspec::RevSpec;

/// Read access to a versioned repository.
///
/// Everything but [`Repository::store`] and [`Repository::resolve_root`]
/// has a default implementation in terms of those two.
///
/// Absence is `Ok(None)`; `Err` is reserved for malformed input and store
/// failures, including a tree that is referenced but missing.
pub trait Repository: Send + Sync {
    /// The object store backing this repository.
    fn store(&self) -> Arc<dyn ObjectStore>;

    /// Resolve the ref part of a rev-spec to the id of its root tree.
    fn resolve_root(&self, reference: &str) -> RepoResult<Option<ObjectId>>;

    /// Resolve a spec to the tree at its path.
    ///
    /// Returns `Ok(None)` if the ref is unknown, the path does not exist or
    /// names a feature rather than a tree.
    fn resolve_tree(&self, spec: &RevSpec) -> RepoResult<Option<RevTree>> {
        let store = self.store();
        if spec.segments().next().is_none() {
            return match self.resolve_root(&spec.reference)? {
                Some(root) => Ok(Some(load_tree(store.as_ref(), root)?)),
                None => Ok(None),
            };
        }
        match self.resolve_node(spec)? {
            Some(node) if node.node.kind == NodeKind::Tree => {
                Ok(Some(load_tree(store.as_ref(), node.object_id())?))
            }
            _ => Ok(None),
        }
    }

    /// Resolve a spec to the node at its path, with inherited metadata.
    fn resolve_node(&self, spec: &RevSpec) -> RepoResult<Option<NodeRef>> {
        let Some(root) = self.resolve_root(&spec.reference)? else {
            return Ok(None);
        };
        let store = self.store();
        let mut tree = load_tree(store.as_ref(), root)?;
        let mut parent = String::new();
        let mut default_metadata = ObjectId::null();
        let mut segments = spec.segments().peekable();
        while let Some(segment) = segments.next() {
            let Some(node) = tree.child(segment).cloned() else {
                return Ok(None);
            };
            let node_ref = NodeRef::new(parent, node, default_metadata);
            if segments.peek().is_none() {
                return Ok(Some(node_ref));
            }
            if node_ref.node.kind != NodeKind::Tree {
                return Ok(None);
            }
            tree = load_tree(store.as_ref(), node_ref.object_id())?;
            default_metadata = node_ref.metadata_id;
            parent = node_ref.path();
        }
        Ok(None)
    }

    fn resolve_type(&self, id: &ObjectId) -> RepoResult<Option<RevFeatureType>> {
        Ok(self.store().read_feature_type(id)?)
    }

    fn resolve_feature(&self, id: &ObjectId) -> RepoResult<Option<RevFeature>> {
        Ok(self.store().read_feature(id)?)
    }

    /// Every tree carrying its own feature type under the given revision,
    /// in path order.
    fn type_trees(&self, reference: &str) -> RepoResult<Option<Vec<NodeRef>>> {
        let Some(root) = self.resolve_root(reference)? else {
            return Ok(None);
        };
        let store = self.store();
        let mut found = Vec::new();
        let mut pending = vec![(load_tree(store.as_ref(), root)?, String::new(), ObjectId::null())];
        while let Some((tree, parent, default_metadata)) = pending.pop() {
            for node in &tree.trees {
                let node_ref = NodeRef::new(parent.clone(), node.clone(), default_metadata);
                let subtree = load_tree(store.as_ref(), node_ref.object_id())?;
                pending.push((subtree, node_ref.path(), node_ref.metadata_id));
                if !node.metadata_id.is_null() {
                    found.push(node_ref);
                }
            }
        }
        found.sort_by_key(NodeRef::path);
        Ok(Some(found))
    }

    /// Lazily walk the differences between two roots.
    fn diff(&self, old: WalkRoot, new: WalkRoot) -> DiffWalk {
        DiffWalk::new(self.store(), old, new)
    }
}

/// Read a tree that a ref or node points at; absence is corruption.
pub(crate) fn load_tree(store: &dyn ObjectStore, id: ObjectId) -> RepoResult<RevTree> {
    Ok(store.read_tree(&id)?.ok_or(StoreError::NotFound(id))?)
}
