//! Node-level tree diff: walk two trees and classify differing feature paths.
//!
//! Features of a tree are emitted first (in name order), then its subtrees
//! are visited in name order, so the walk order is deterministic for a given
//! pair of trees.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use vsq_store::{Node, NodeRef, ObjectStore, ObjectStoreExt, RevTree};
use vsq_types::{ChangeType, ObjectId};

use crate::error::{DiffError, DiffResult};

/// A single differing feature path between two trees.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffEntry {
    /// Present in the new tree only.
    Added(NodeRef),
    /// Present in both trees with different content or feature type.
    Modified { old: NodeRef, new: NodeRef },
    /// Present in the old tree only.
    Removed(NodeRef),
}

impl DiffEntry {
    pub fn change_type(&self) -> ChangeType {
        match self {
            Self::Added(_) => ChangeType::Added,
            Self::Modified { .. } => ChangeType::Modified,
            Self::Removed(_) => ChangeType::Removed,
        }
    }

    /// The side whose content describes this change: the old node for
    /// removals, the new node otherwise.
    pub fn relevant(&self) -> &NodeRef {
        match self {
            Self::Added(new) | Self::Modified { new, .. } => new,
            Self::Removed(old) => old,
        }
    }

    pub fn old(&self) -> Option<&NodeRef> {
        match self {
            Self::Modified { old, .. } | Self::Removed(old) => Some(old),
            Self::Added(_) => None,
        }
    }

    pub fn new_side(&self) -> Option<&NodeRef> {
        match self {
            Self::Added(new) | Self::Modified { new, .. } => Some(new),
            Self::Removed(_) => None,
        }
    }

    pub fn path(&self) -> String {
        self.relevant().path()
    }
}

/// Starting point of one side of a walk: a resolved tree, the path it lives
/// at, and the feature type its nodes inherit.
#[derive(Clone, Debug)]
pub struct WalkRoot {
    pub path: String,
    pub tree: RevTree,
    pub metadata_id: ObjectId,
}

impl WalkRoot {
    pub fn new(path: impl Into<String>, tree: RevTree, metadata_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            tree,
            metadata_id,
        }
    }

    /// The empty tree at `path`: diffing against it classifies everything as added.
    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, RevTree::empty(), ObjectId::null())
    }
}

enum Side {
    Loaded(RevTree),
    Pending(ObjectId),
}

struct TreePair {
    path: String,
    old: Option<(Side, ObjectId)>,
    new: Option<(Side, ObjectId)>,
}

/// Lazy diff walk between two trees.
///
/// Yields `Err` at most once: after a failure the walk is exhausted.
pub struct DiffWalk {
    store: Arc<dyn ObjectStore>,
    stack: Vec<TreePair>,
    ready: VecDeque<DiffEntry>,
    failed: bool,
}

impl DiffWalk {
    pub fn new(store: Arc<dyn ObjectStore>, old: WalkRoot, new: WalkRoot) -> Self {
        let pair = TreePair {
            path: new.path,
            old: Some((Side::Loaded(old.tree), old.metadata_id)),
            new: Some((Side::Loaded(new.tree), new.metadata_id)),
        };
        Self {
            store,
            stack: vec![pair],
            ready: VecDeque::new(),
            failed: false,
        }
    }

    /// Walk every feature under `root`, classified as added.
    pub fn snapshot(store: Arc<dyn ObjectStore>, root: WalkRoot) -> Self {
        let old = WalkRoot::empty(root.path.clone());
        Self::new(store, old, root)
    }

    fn load(&self, side: Side) -> DiffResult<RevTree> {
        match side {
            Side::Loaded(tree) => Ok(tree),
            Side::Pending(id) => self
                .store
                .read_tree(&id)?
                .ok_or(DiffError::ObjectNotFound(id)),
        }
    }

    fn expand(&mut self, pair: TreePair) -> DiffResult<()> {
        let old = match pair.old {
            Some((side, meta)) => Some((self.load(side)?, meta)),
            None => None,
        };
        let new = match pair.new {
            Some((side, meta)) => Some((self.load(side)?, meta)),
            None => None,
        };

        let empty = RevTree::empty();
        let (old_tree, old_meta) = old
            .as_ref()
            .map(|(t, m)| (t, *m))
            .unwrap_or((&empty, ObjectId::null()));
        let (new_tree, new_meta) = new
            .as_ref()
            .map(|(t, m)| (t, *m))
            .unwrap_or((&empty, ObjectId::null()));

        if old_tree.id() == new_tree.id() && old_meta == new_meta {
            return Ok(());
        }

        let path = pair.path;
        merge_by_name(&old_tree.features, &new_tree.features, |o, n| {
            let old_ref = o.map(|node| NodeRef::new(path.clone(), node.clone(), old_meta));
            let new_ref = n.map(|node| NodeRef::new(path.clone(), node.clone(), new_meta));
            let entry = match (old_ref, new_ref) {
                (None, Some(new)) => DiffEntry::Added(new),
                (Some(old), None) => DiffEntry::Removed(old),
                (Some(old), Some(new)) => {
                    if old.object_id() == new.object_id() && old.metadata_id == new.metadata_id {
                        return;
                    }
                    DiffEntry::Modified { old, new }
                }
                (None, None) => return,
            };
            self.ready.push_back(entry);
        });

        let mut children = Vec::new();
        merge_by_name(&old_tree.trees, &new_tree.trees, |o, n| {
            let side = |node: &Node, parent_meta: ObjectId| {
                let meta = if node.metadata_id.is_null() {
                    parent_meta
                } else {
                    node.metadata_id
                };
                (Side::Pending(node.object_id), meta)
            };
            if let (Some(a), Some(b)) = (o, n) {
                if a.object_id == b.object_id && a.metadata_id == b.metadata_id {
                    return;
                }
            }
            let name = o.or(n).map(|node| node.name.as_str()).unwrap_or_default();
            children.push(TreePair {
                path: NodeRef::append(&path, name),
                old: o.map(|node| side(node, old_meta)),
                new: n.map(|node| side(node, new_meta)),
            });
        });
        // Stack is LIFO: push in reverse so the first name is visited first.
        self.stack.extend(children.into_iter().rev());
        Ok(())
    }
}

impl Iterator for DiffWalk {
    type Item = DiffResult<DiffEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(Ok(entry));
            }
            if self.failed {
                return None;
            }
            let pair = self.stack.pop()?;
            if let Err(e) = self.expand(pair) {
                tracing::debug!(error = %e, "diff walk aborted");
                self.failed = true;
                self.stack.clear();
                return Some(Err(e));
            }
        }
    }
}

impl std::iter::FusedIterator for DiffWalk {}

/// Merge-join two name-sorted node lists, calling `f` once per distinct name.
fn merge_by_name<'a>(
    old: &'a [Node],
    new: &'a [Node],
    mut f: impl FnMut(Option<&'a Node>, Option<&'a Node>),
) {
    let (mut i, mut j) = (0, 0);
    loop {
        match (old.get(i), new.get(j)) {
            (Some(o), Some(n)) => match o.name.cmp(&n.name) {
                Ordering::Less => {
                    f(Some(o), None);
                    i += 1;
                }
                Ordering::Greater => {
                    f(None, Some(n));
                    j += 1;
                }
                Ordering::Equal => {
                    f(Some(o), Some(n));
                    i += 1;
                    j += 1;
                }
            },
            (Some(o), None) => {
                f(Some(o), None);
                i += 1;
            }
            (None, Some(n)) => {
                f(None, Some(n));
                j += 1;
            }
            (None, None) => break,
        }
    }
}

/// Collect the full diff between two roots.
pub fn diff_trees(
    store: Arc<dyn ObjectStore>,
    old: WalkRoot,
    new: WalkRoot,
) -> DiffResult<Vec<DiffEntry>> {
    DiffWalk::new(store, old, new).collect()
}
