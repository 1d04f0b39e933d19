//! Feature filter predicates for VSQ.
//!
//! A [`Filter`] is a tagged boolean AST over feature attributes. It can be
//! evaluated against a materialized [`vsq_types::Feature`], reduced to a
//! canonical form with [`simplify`], checked against a schema, and asked
//! which attributes it needs.

pub mod error;
pub mod filter;
pub mod simplify;

pub use error::{FilterError, FilterResult};
pub use filter::{CompareOp, Filter};
pub use simplify::simplify;
