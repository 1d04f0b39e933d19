//! Content-addressed revision object storage for VSQ.
//!
//! This crate holds the object model the query adapter reads: immutable
//! trees of nodes pointing at features, feature types and subtrees, each
//! identified by the BLAKE3 hash of its content (domain-separated by kind).
//!
//! # Object Types
//!
//! - [`RevTree`] -- tree node with precomputed descendant feature count
//! - [`RevFeature`] -- positional attribute values of one feature
//! - [`RevFeatureType`] -- attribute schema, addressed by its own id
//! - [`RevCommit`] -- root tree pointer of a revision
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait; [`ObjectStoreExt`]
//! adds typed reads and writes on top of it.
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe (objects are immutable).
//! 3. The store never interprets object contents -- it is a pure key-value store.
//! 4. Absence is `Ok(None)`; `Err` is reserved for I/O failures and corruption.

pub mod builder;
pub mod error;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use builder::TreeBuilder;
pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{
    Node, NodeKind, NodeRef, ObjectKind, RevCommit, RevFeature, RevFeatureType, RevTree,
    StoredObject,
};
pub use traits::{ObjectStore, ObjectStoreExt};
