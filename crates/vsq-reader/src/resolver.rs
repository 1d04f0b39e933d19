//! Rev-spec to tree resolution for one query.

use std::sync::Arc;

use vsq_diff::WalkRoot;
use vsq_repo::{Repository, RevSpec};
use vsq_store::{NodeRef, RevTree};
use vsq_types::{Envelope, ObjectId};

use crate::error::{ReaderError, ReaderResult};

/// A type tree resolved at one revision.
#[derive(Clone, Debug)]
pub struct ResolvedTree {
    pub spec: RevSpec,
    /// The type tree's node; `None` for the empty tree.
    pub node: Option<NodeRef>,
    pub tree: RevTree,
}

impl ResolvedTree {
    fn empty(spec: RevSpec) -> Self {
        Self {
            spec,
            node: None,
            tree: RevTree::empty(),
        }
    }

    /// Feature type inherited by nodes of this tree.
    pub fn metadata_id(&self) -> ObjectId {
        self.node.as_ref().map_or(ObjectId::null(), |n| n.metadata_id)
    }

    /// Bounds recorded on the type tree's node.
    pub fn bounds(&self) -> Option<&Envelope> {
        self.node.as_ref().and_then(NodeRef::bounds)
    }

    pub fn walk_root(&self) -> WalkRoot {
        WalkRoot::new(self.spec.path.clone(), self.tree.clone(), self.metadata_id())
    }
}

/// Resolves `<ref>:<path>` specs for the trees a query reads.
///
/// Nothing is cached: every call goes to the repository, so each query sees
/// the refs as they are when it starts.
pub struct RevisionResolver {
    repo: Arc<dyn Repository>,
}

impl RevisionResolver {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    fn spec(root: &str, type_path: &str) -> ReaderResult<RevSpec> {
        let spec = RevSpec::parse(root)?;
        Ok(if spec.path.is_empty() {
            spec.with_path(type_path)
        } else {
            spec
        })
    }

    /// Resolve the type tree at `root`. The NULL revision is the empty tree.
    pub fn resolve(&self, root: &str, type_path: &str) -> ReaderResult<ResolvedTree> {
        let spec = Self::spec(root, type_path)?;
        if spec.is_null() {
            return Ok(ResolvedTree::empty(spec));
        }
        let node = self
            .repo
            .resolve_node(&spec)?
            .ok_or_else(|| ReaderError::RevisionNotFound(spec.to_string()))?;
        let tree = self
            .repo
            .resolve_tree(&spec)?
            .ok_or_else(|| ReaderError::RevisionNotFound(spec.to_string()))?;
        tracing::debug!(spec = %spec, tree = %tree.id().short_hex(), size = tree.size(), "resolved revision");
        Ok(ResolvedTree {
            spec,
            node: Some(node),
            tree,
        })
    }

    /// Resolve both sides of a differential query.
    ///
    /// An old revision that exists but has no tree at the type path yields
    /// the empty tree: the type did not exist yet.
    pub fn resolve_range(
        &self,
        root: &str,
        old_root: &str,
        type_path: &str,
    ) -> ReaderResult<(ResolvedTree, ResolvedTree)> {
        let new = self.resolve(root, type_path)?;
        let old_spec = Self::spec(old_root, type_path)?;
        if old_spec.is_null() {
            return Ok((ResolvedTree::empty(old_spec), new));
        }
        if self.repo.resolve_root(&old_spec.reference)?.is_none() {
            return Err(ReaderError::RevisionNotFound(old_spec.to_string()));
        }
        let old = match self.repo.resolve_node(&old_spec)? {
            Some(node) => match self.repo.resolve_tree(&old_spec)? {
                Some(tree) => ResolvedTree {
                    spec: old_spec,
                    node: Some(node),
                    tree,
                },
                None => ResolvedTree::empty(old_spec),
            },
            None => {
                tracing::debug!(spec = %old_spec, "type absent at old revision; using empty tree");
                ResolvedTree::empty(old_spec)
            }
        };
        Ok((old, new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, ROADS};

    #[test]
    fn resolves_type_tree_at_head() {
        let fx = fixture();
        let resolver = RevisionResolver::new(fx.repo.clone());
        let resolved = resolver.resolve("HEAD", ROADS).unwrap();
        assert_eq!(resolved.tree.size(), 3);
        assert_eq!(resolved.spec.to_string(), "HEAD:roads");
        assert!(!resolved.metadata_id().is_null());
        assert!(resolved.bounds().is_some());
    }

    #[test]
    fn null_revision_is_empty() {
        let fx = fixture();
        let resolver = RevisionResolver::new(fx.repo.clone());
        let resolved = resolver.resolve(&ObjectId::null().to_hex(), ROADS).unwrap();
        assert!(resolved.tree.is_empty());
        assert!(resolved.node.is_none());
    }

    #[test]
    fn unknown_root_is_not_found() {
        let fx = fixture();
        let resolver = RevisionResolver::new(fx.repo.clone());
        assert!(matches!(
            resolver.resolve("nope", ROADS),
            Err(ReaderError::RevisionNotFound(_))
        ));
        assert!(matches!(
            resolver.resolve_range("HEAD", "nope", ROADS),
            Err(ReaderError::RevisionNotFound(_))
        ));
    }

    #[test]
    fn old_revision_without_type_is_empty() {
        let fx = fixture();
        let resolver = RevisionResolver::new(fx.repo.clone());
        let (old, new) = resolver.resolve_range("HEAD", "empty", ROADS).unwrap();
        assert!(old.tree.is_empty());
        assert_eq!(new.tree.size(), 3);

        let (old, _) = resolver.resolve_range("HEAD", "r1", ROADS).unwrap();
        assert_eq!(old.tree.size(), 3);
        assert_ne!(old.tree.id(), new.tree.id());
    }
}
