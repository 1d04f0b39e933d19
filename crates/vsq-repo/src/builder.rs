//! Building new revisions on top of a branch.

use std::collections::BTreeMap;

use vsq_store::{
    Node, ObjectStoreExt, RevCommit, RevFeature, RevFeatureType, StoreError, TreeBuilder,
};
use vsq_types::{Envelope, FeatureType, ObjectId, Value};

use crate::error::{RepoError, RepoResult};
use crate::memory::InMemoryRepository;
use crate::names::{branch_ref, validate_ref_name};
use crate::traits::{load_tree, Repository};

struct TypeState {
    schema: FeatureType,
    type_id: ObjectId,
    features: BTreeMap<String, Node>,
}

/// Stages feature type and feature edits and commits them to a branch.
///
/// Every feature type lives in a single-segment tree named after the type,
/// directly under the root; the tree node carries the type id as its
/// metadata id so feature nodes inherit it. A builder may commit several
/// times; each commit becomes the parent of the next.
pub struct RevisionBuilder<'a> {
    repo: &'a InMemoryRepository,
    branch: String,
    parent: Option<ObjectId>,
    types: BTreeMap<String, TypeState>,
}

impl<'a> RevisionBuilder<'a> {
    /// Load the branch tip (if any) as the starting state.
    pub fn open(repo: &'a InMemoryRepository, branch: &str) -> RepoResult<Self> {
        validate_ref_name(branch)?;
        let branch = branch_ref(branch);
        let parent = repo.read_ref(&branch);
        let mut types = BTreeMap::new();

        if let Some(root_id) = repo.resolve_root(&branch)? {
            let store = repo.objects();
            let root = load_tree(&**store, root_id)?;
            for node in &root.trees {
                let schema = store
                    .read_feature_type(&node.metadata_id)?
                    .ok_or(StoreError::NotFound(node.metadata_id))?
                    .schema;
                let tree = load_tree(&**store, node.object_id)?;
                let features = tree
                    .features
                    .into_iter()
                    .map(|n| (n.name.clone(), n))
                    .collect();
                types.insert(
                    node.name.clone(),
                    TypeState {
                        schema,
                        type_id: node.metadata_id,
                        features,
                    },
                );
            }
        }

        Ok(Self {
            repo,
            branch,
            parent,
            types,
        })
    }

    /// Register or replace a feature type. Existing features are kept.
    pub fn put_type(&mut self, schema: FeatureType) -> RepoResult<ObjectId> {
        let type_id = self
            .repo
            .objects()
            .write_feature_type(&RevFeatureType::new(schema.clone()))?;
        match self.types.get_mut(&schema.name) {
            Some(state) => {
                state.schema = schema;
                state.type_id = type_id;
            }
            None => {
                self.types.insert(
                    schema.name.clone(),
                    TypeState {
                        schema,
                        type_id,
                        features: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(type_id)
    }

    /// Add or replace a feature. Its node bounds come from the type's
    /// default geometry value.
    pub fn put_feature(
        &mut self,
        type_name: &str,
        id: &str,
        values: Vec<Value>,
    ) -> RepoResult<ObjectId> {
        let state = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| RepoError::UnknownType(type_name.to_string()))?;
        let bounds = state
            .schema
            .geometry_attribute()
            .and_then(|name| state.schema.index_of(name))
            .and_then(|i| values.get(i))
            .and_then(Value::as_geometry)
            .and_then(Envelope::of_geometry);
        let feature_id = self.repo.objects().write_feature(&RevFeature::new(values))?;
        state
            .features
            .insert(id.to_string(), Node::feature(id, feature_id, bounds));
        Ok(feature_id)
    }

    pub fn remove_feature(&mut self, type_name: &str, id: &str) -> bool {
        self.types
            .get_mut(type_name)
            .is_some_and(|state| state.features.remove(id).is_some())
    }

    pub fn remove_type(&mut self, type_name: &str) -> bool {
        self.types.remove(type_name).is_some()
    }

    /// Write the staged state as a commit and advance the branch to it.
    pub fn commit(&mut self, message: &str) -> RepoResult<ObjectId> {
        let store = self.repo.objects();
        let mut root = TreeBuilder::new();
        for (name, state) in &self.types {
            let mut tree = TreeBuilder::new();
            for node in state.features.values() {
                tree.put_feature(node.clone());
            }
            let tree = tree.build()?;
            store.write_tree(&tree)?;
            root.put_tree(name, &tree, state.type_id);
        }
        let root = root.build()?;
        let tree_id = store.write_tree(&root)?;

        let commit = RevCommit {
            tree_id,
            parents: self.parent.into_iter().collect(),
            message: message.to_string(),
        };
        let commit_id = store.write_commit(&commit)?;
        self.repo.update_ref(&self.branch, commit_id)?;
        self.parent = Some(commit_id);
        tracing::debug!(
            branch = %self.branch,
            commit = %commit_id.short_hex(),
            tree = %tree_id.short_hex(),
            features = root.size(),
            "committed revision"
        );
        Ok(commit_id)
    }
}
