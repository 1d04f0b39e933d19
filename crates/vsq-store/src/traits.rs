use vsq_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{RevCommit, RevFeature, RevFeatureType, RevTree, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same data always produces the
///   same ID.
/// - Concurrent reads are always safe (objects are immutable).
/// - The store never interprets object contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read multiple objects in a batch.
    ///
    /// Default implementation calls `read()` for each ID.
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<StoredObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }
}

/// Typed reads and writes over any [`ObjectStore`].
pub trait ObjectStoreExt: ObjectStore {
    /// Read a tree. The null id and the empty tree id always resolve to the
    /// empty tree, whether or not it was ever written.
    fn read_tree(&self, id: &ObjectId) -> StoreResult<Option<RevTree>> {
        if id.is_null() || *id == RevTree::empty_id() {
            return Ok(Some(RevTree::empty()));
        }
        self.read(id)?
            .map(|obj| RevTree::from_stored_object(&obj))
            .transpose()
    }

    fn read_feature(&self, id: &ObjectId) -> StoreResult<Option<RevFeature>> {
        self.read(id)?
            .map(|obj| RevFeature::from_stored_object(&obj))
            .transpose()
    }

    fn read_feature_type(&self, id: &ObjectId) -> StoreResult<Option<RevFeatureType>> {
        self.read(id)?
            .map(|obj| RevFeatureType::from_stored_object(&obj))
            .transpose()
    }

    fn read_commit(&self, id: &ObjectId) -> StoreResult<Option<RevCommit>> {
        self.read(id)?
            .map(|obj| RevCommit::from_stored_object(&obj))
            .transpose()
    }

    fn write_tree(&self, tree: &RevTree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    fn write_feature(&self, feature: &RevFeature) -> StoreResult<ObjectId> {
        self.write(&feature.to_stored_object()?)
    }

    fn write_feature_type(&self, feature_type: &RevFeatureType) -> StoreResult<ObjectId> {
        self.write(&feature_type.to_stored_object()?)
    }

    fn write_commit(&self, commit: &RevCommit) -> StoreResult<ObjectId> {
        self.write(&commit.to_stored_object()?)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStoreExt for S {}
