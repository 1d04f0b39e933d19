use std::collections::HashMap;
use std::sync::RwLock;

use vsq_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Remove an object. Only meant for tests that simulate a corrupt store.
    pub fn remove(&self, id: &ObjectId) -> bool {
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Node, RevFeature, RevTree};
    use crate::traits::ObjectStoreExt;
    use vsq_types::Value;

    fn feature(name: &str) -> RevFeature {
        RevFeature::new(vec![Value::from(name)])
    }

    #[test]
    fn write_and_read_feature() {
        let store = InMemoryObjectStore::new();
        let id = store.write_feature(&feature("a")).unwrap();
        assert_eq!(store.read_feature(&id).unwrap(), Some(feature("a")));
    }

    #[test]
    fn same_content_is_deduplicated() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write_feature(&feature("a")).unwrap();
        let id2 = store.write_feature(&feature("a")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_returns_none() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(store.read_feature(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn empty_tree_resolves_without_being_written() {
        let store = InMemoryObjectStore::new();
        assert_eq!(store.read_tree(&ObjectId::null()).unwrap(), Some(RevTree::empty()));
        assert_eq!(
            store.read_tree(&RevTree::empty_id()).unwrap(),
            Some(RevTree::empty())
        );
        assert!(store.is_empty());
    }

    #[test]
    fn typed_read_with_wrong_kind_errors() {
        let store = InMemoryObjectStore::new();
        let id = store.write_feature(&feature("a")).unwrap();
        assert!(store.read_tree(&id).is_err());
    }

    #[test]
    fn tree_write_read_keeps_id() {
        let store = InMemoryObjectStore::new();
        let fid = store.write_feature(&feature("a")).unwrap();
        let tree = RevTree::new(1, vec![], vec![Node::feature("a", fid, None)]).unwrap();
        let id = store.write_tree(&tree).unwrap();
        assert_eq!(id, tree.id());
        assert_eq!(store.read_tree(&id).unwrap().unwrap().id(), id);
    }

    #[test]
    fn remove_simulates_missing_object() {
        let store = InMemoryObjectStore::new();
        let id = store.write_feature(&feature("gone")).unwrap();
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.read_feature(&id).unwrap().is_none());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write_feature(&feature("shared")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.read(&id).unwrap().expect("should exist");
                    assert_eq!(obj.compute_id(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("object_count"));
    }
}
