//! Query translation for VSQ.
//!
//! Turns a caller's [`QueryRequest`] into a validated, canonical
//! [`QueryDescriptor`] for one feature type: the filter is checked against
//! the schema and simplified, pagination and projection are normalized, and
//! snapshot versus differential mode is decided.
//!
//! The adapter's native abilities are described by [`Capabilities`], driven
//! by the TOML-backed [`AdapterConfig`].

pub mod capabilities;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod sort;
pub mod translate;

pub use capabilities::{Capabilities, Hint};
pub use config::{AdapterConfig, CapabilityToggles};
pub use descriptor::{Projection, QueryDescriptor, QueryMode};
pub use error::{QueryError, QueryResult};
pub use request::{DecimationHint, QueryRequest};
pub use sort::{SortBy, SortDirection, SortOrder};
pub use translate::QueryTranslator;
