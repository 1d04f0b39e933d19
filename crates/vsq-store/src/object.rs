use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vsq_types::envelope::expand_option;
use vsq_types::{Envelope, FeatureType, ObjectId, Value};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Positional attribute values of a single feature.
    Feature,
    /// Attribute schema of a feature type.
    FeatureType,
    /// Tree node listing features and subtrees.
    Tree,
    /// Revision pointer to a root tree.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feature => write!(f, "feature"),
            Self::FeatureType => write!(f, "featuretype"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// contents of the data; it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Feature => &ContentHasher::FEATURE,
            ObjectKind::FeatureType => &ContentHasher::FEATURE_TYPE,
            ObjectKind::Tree => &ContentHasher::TREE,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }
}

fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

fn decode<T: DeserializeOwned>(obj: &StoredObject, expected: ObjectKind) -> StoreResult<T> {
    if obj.kind != expected {
        return Err(StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("expected {expected}, got {}", obj.kind),
        });
    }
    serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Node / NodeRef
// ---------------------------------------------------------------------------

/// What a node points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Feature,
    Tree,
}

/// A named child entry of a tree.
///
/// A feature node's bounds are the envelope of the feature's default
/// geometry; a tree node's bounds are the union of all descendant feature
/// bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub object_id: ObjectId,
    /// Feature type id; null means "inherit the containing tree's default".
    pub metadata_id: ObjectId,
    pub bounds: Option<Envelope>,
}

impl Node {
    pub fn feature(name: impl Into<String>, object_id: ObjectId, bounds: Option<Envelope>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Feature,
            object_id,
            metadata_id: ObjectId::null(),
            bounds,
        }
    }

    pub fn tree(
        name: impl Into<String>,
        object_id: ObjectId,
        metadata_id: ObjectId,
        bounds: Option<Envelope>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Tree,
            object_id,
            metadata_id,
            bounds,
        }
    }

    /// Expand `target` with this node's own bounds metadata.
    pub fn expand(&self, target: &mut Option<Envelope>) {
        expand_option(target, self.bounds.as_ref());
    }
}

/// A node located at a path inside a revision's tree structure.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRef {
    pub parent_path: String,
    pub node: Node,
    /// The node's own metadata id, or the inherited default when it has none.
    pub metadata_id: ObjectId,
}

impl NodeRef {
    pub fn new(parent_path: impl Into<String>, node: Node, default_metadata_id: ObjectId) -> Self {
        let metadata_id = if node.metadata_id.is_null() {
            default_metadata_id
        } else {
            node.metadata_id
        };
        Self {
            parent_path: parent_path.into(),
            node,
            metadata_id,
        }
    }

    /// Full path of the node (`parent/name`).
    pub fn path(&self) -> String {
        Self::append(&self.parent_path, &self.node.name)
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn object_id(&self) -> ObjectId {
        self.node.object_id
    }

    pub fn bounds(&self) -> Option<&Envelope> {
        self.node.bounds.as_ref()
    }

    /// Join a parent path and a child name.
    pub fn append(parent: &str, child: &str) -> String {
        if parent.is_empty() {
            child.to_string()
        } else {
            format!("{parent}/{child}")
        }
    }
}

// ---------------------------------------------------------------------------
// RevTree
// ---------------------------------------------------------------------------

/// Immutable tree object.
///
/// Child lists are sorted by name, so a path is unique within a tree and
/// iteration order is deterministic. `size` counts all descendant features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevTree {
    #[serde(skip, default = "ObjectId::null")]
    id: ObjectId,
    pub size: u64,
    pub trees: Vec<Node>,
    pub features: Vec<Node>,
}

/// Serialized form of a tree with no children; hashed to get the empty tree id.
const EMPTY_TREE_JSON: &[u8] = br#"{"size":0,"trees":[],"features":[]}"#;

impl RevTree {
    /// Assemble a tree, computing its id. Children are sorted by name.
    pub fn new(size: u64, mut trees: Vec<Node>, mut features: Vec<Node>) -> StoreResult<Self> {
        trees.sort_by(|a, b| a.name.cmp(&b.name));
        features.sort_by(|a, b| a.name.cmp(&b.name));
        let mut tree = Self {
            id: ObjectId::null(),
            size,
            trees,
            features,
        };
        tree.id = tree.to_stored_object()?.compute_id();
        Ok(tree)
    }

    /// The tree with no children.
    pub fn empty() -> Self {
        Self {
            id: Self::empty_id(),
            size: 0,
            trees: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn empty_id() -> ObjectId {
        ContentHasher::TREE.hash(EMPTY_TREE_JSON)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Total descendant feature count.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.features.is_empty()
    }

    /// Look up a direct child (tree or feature) by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        fn find<'n>(nodes: &'n [Node], name: &str) -> Option<&'n Node> {
            nodes
                .binary_search_by(|n| n.name.as_str().cmp(name))
                .ok()
                .map(|i| &nodes[i])
        }
        find(&self.trees, name).or_else(|| find(&self.features, name))
    }

    /// Expand `target` with the bounds of every direct child.
    pub fn expand(&self, target: &mut Option<Envelope>) {
        for node in self.trees.iter().chain(&self.features) {
            node.expand(target);
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tree, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        let mut tree: Self = decode(obj, ObjectKind::Tree)?;
        tree.id = obj.compute_id();
        Ok(tree)
    }
}

// ---------------------------------------------------------------------------
// RevFeature / RevFeatureType / RevCommit
// ---------------------------------------------------------------------------

/// Attribute values of one feature, positionally matching its feature type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevFeature {
    pub values: Vec<Value>,
}

impl RevFeature {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Feature, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Feature)
    }
}

/// Stored feature type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevFeatureType {
    pub schema: FeatureType,
}

impl RevFeatureType {
    pub fn new(schema: FeatureType) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureType {
        &self.schema
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::FeatureType, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::FeatureType)
    }
}

/// A revision: the root tree plus its history links.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevCommit {
    pub tree_id: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
}

impl RevCommit {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Commit)
    }
}
