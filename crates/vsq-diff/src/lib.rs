//! Tree diff engine for VSQ.
//!
//! Compares two revision trees node by node and classifies every differing
//! feature path as added, modified or removed. The walk is lazy: trees are
//! loaded from the store only when the walk reaches them, and subtrees whose
//! ids are equal on both sides are skipped without being read.
//!
//! # Key Types
//!
//! - [`DiffWalk`] -- lazy iterator of [`DiffEntry`] values in path order
//! - [`DiffEntry`] -- old/new node pair with its [`vsq_types::ChangeType`]

pub mod error;
pub mod tree_diff;

pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_trees, DiffEntry, DiffWalk, WalkRoot};
