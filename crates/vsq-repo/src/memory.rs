//! In-memory repository: an object store plus a ref table.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use vsq_store::{InMemoryObjectStore, ObjectKind, ObjectStore, RevCommit, RevTree, StoreError};
use vsq_types::ObjectId;

use crate::builder::RevisionBuilder;
use crate::error::{RepoError, RepoResult};
use crate::names::{branch_ref, tag_ref, validate_ref_name, TAGS_PREFIX};
use crate::revspec::HEAD;
use crate::traits::Repository;

/// A [`Repository`] held entirely in memory.
///
/// Refs map full ref names to commit ids. `HEAD` is symbolic and points at
/// `refs/heads/main` until [`InMemoryRepository::set_head`] moves it. Tags
/// are immutable once created.
pub struct InMemoryRepository {
    objects: Arc<InMemoryObjectStore>,
    refs: RwLock<BTreeMap<String, ObjectId>>,
    head: RwLock<String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryObjectStore::new()))
    }

    pub fn with_store(objects: Arc<InMemoryObjectStore>) -> Self {
        Self {
            objects,
            refs: RwLock::new(BTreeMap::new()),
            head: RwLock::new(branch_ref("main")),
        }
    }

    /// The concrete object store, for callers that need to write directly.
    pub fn objects(&self) -> &Arc<InMemoryObjectStore> {
        &self.objects
    }

    /// Full name of the branch `HEAD` points at.
    pub fn head(&self) -> String {
        self.head.read().expect("lock poisoned").clone()
    }

    /// Point `HEAD` at a branch (short or full name).
    pub fn set_head(&self, branch: &str) -> RepoResult<()> {
        validate_ref_name(branch)?;
        *self.head.write().expect("lock poisoned") = branch_ref(branch);
        Ok(())
    }

    pub fn read_ref(&self, name: &str) -> Option<ObjectId> {
        self.refs.read().expect("lock poisoned").get(name).copied()
    }

    /// All refs in name order.
    pub fn refs(&self) -> Vec<(String, ObjectId)> {
        self.refs
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }

    /// Create or move a full ref. Existing tags cannot be moved.
    pub fn update_ref(&self, name: &str, commit: ObjectId) -> RepoResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        if name.starts_with(TAGS_PREFIX) && refs.contains_key(name) {
            return Err(RepoError::RefExists(name.to_string()));
        }
        tracing::debug!(name, commit = %commit.short_hex(), "update ref");
        refs.insert(name.to_string(), commit);
        Ok(())
    }

    /// Tag a commit under a short tag name.
    pub fn tag(&self, name: &str, commit: ObjectId) -> RepoResult<()> {
        self.update_ref(&tag_ref(name), commit)
    }

    /// Start a revision on top of a branch's current tip.
    pub fn builder(&self, branch: &str) -> RepoResult<RevisionBuilder<'_>> {
        RevisionBuilder::open(self, branch)
    }

    fn ref_root(&self, name: &str) -> RepoResult<Option<ObjectId>> {
        let Some(commit) = self.read_ref(name) else {
            return Ok(None);
        };
        match self.object_root(commit)? {
            Some(root) => Ok(Some(root)),
            None => Err(RepoError::Store(StoreError::NotFound(commit))),
        }
    }

    /// Root tree id of a commit or tree id.
    fn object_root(&self, id: ObjectId) -> RepoResult<Option<ObjectId>> {
        if id.is_null() {
            return Ok(Some(RevTree::empty_id()));
        }
        let Some(object) = self.objects.read(&id)? else {
            return Ok(None);
        };
        match object.kind {
            ObjectKind::Commit => Ok(Some(RevCommit::from_stored_object(&object)?.tree_id)),
            ObjectKind::Tree => Ok(Some(id)),
            _ => Ok(None),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("head", &self.head())
            .field("ref_count", &self.refs.read().expect("lock poisoned").len())
            .field("objects", &self.objects)
            .finish()
    }
}

impl Repository for InMemoryRepository {
    fn store(&self) -> Arc<dyn ObjectStore> {
        self.objects.clone()
    }

    fn resolve_root(&self, reference: &str) -> RepoResult<Option<ObjectId>> {
        let root = if reference == HEAD {
            self.ref_root(&self.head())?
        } else if ObjectId::looks_like_hex(reference) {
            let id = ObjectId::from_hex(reference).map_err(|e| RepoError::InvalidRevSpec {
                spec: reference.to_string(),
                reason: e.to_string(),
            })?;
            self.object_root(id)?
        } else if reference.starts_with("refs/") {
            self.ref_root(reference)?
        } else {
            match self.ref_root(&branch_ref(reference))? {
                Some(root) => Some(root),
                None => self.ref_root(&tag_ref(reference))?,
            }
        };
        tracing::trace!(reference, root = ?root, "resolved ref");
        Ok(root)
    }
}
