//! Versioned feature reading for VSQ.
//!
//! Answers snapshot and differential queries over one feature type of a
//! [`vsq_repo::Repository`]:
//!
//! - [`RevisionResolver`] turns `<ref>:<path>` specs into type trees
//! - [`open_reader`] composes the pull pipeline (diff walk, materialize,
//!   filter, project, sort, paginate, decimate) into a [`FeatureReader`]
//! - [`count`] and [`bounds`] answer unfiltered snapshots from the type
//!   tree's node and iterate otherwise
//! - [`VersionedFeatureSource`] binds a type name and view settings to all
//!   of the above

pub mod aggregate;
pub mod decimate;
pub mod error;
pub mod materialize;
pub mod reader;
pub mod resolver;
pub mod source;
pub mod stages;

#[cfg(test)]
mod test_support;

pub use aggregate::{bounds, count};
pub use decimate::ScreenMap;
pub use error::{ReaderError, ReaderResult};
pub use materialize::Materializer;
pub use reader::{open_reader, FeatureReader};
pub use resolver::{ResolvedTree, RevisionResolver};
pub use source::VersionedFeatureSource;
pub use stages::{FeatureStream, Paginate, SortStage};
