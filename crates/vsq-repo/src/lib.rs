//! Revision repository client for VSQ.
//!
//! The query adapter never touches refs or raw objects directly; it goes
//! through the [`Repository`] trait, which resolves `<ref>:<path>`
//! specifications to trees and nodes, loads feature types and feature
//! content, and opens lazy diff walks.
//!
//! [`InMemoryRepository`] pairs an in-memory object store with a ref table,
//! and [`RevisionBuilder`] writes new revisions into it.

pub mod builder;
pub mod error;
pub mod memory;
pub mod names;
pub mod revspec;
pub mod traits;

pub use builder::RevisionBuilder;
pub use error::{RepoError, RepoResult};
pub use memory::InMemoryRepository;
pub use revspec::{RevSpec, HEAD};
pub use traits::Repository;
