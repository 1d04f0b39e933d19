//! Foundation types for VSQ, the versioned spatial-query adapter.
//!
//! Every other VSQ crate depends on `vsq-types`. The types here are plain
//! values: they carry no store handles and never perform I/O.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier (BLAKE3 hash)
//! - [`ChangeType`] — How a feature differs between two revisions
//! - [`Envelope`] / [`ReferencedEnvelope`] — Axis-aligned bounds, optionally tagged with a CRS
//! - [`Value`] — A single attribute value
//! - [`FeatureType`] — Attribute schema of a feature type
//! - [`Feature`] — A materialized feature as emitted by a reader
//! - [`GeometryFactory`] — Geometry construction override (fixed precision)

pub mod change;
pub mod envelope;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod object;
pub mod schema;
pub mod value;

pub use change::ChangeType;
pub use envelope::{Envelope, ReferencedEnvelope};
pub use error::TypeError;
pub use feature::Feature;
pub use geometry::GeometryFactory;
pub use object::ObjectId;
pub use schema::{AttributeDescriptor, AttributeKind, FeatureType};
pub use value::Value;

/// Re-exported so downstream crates name geometries through one path.
pub use geo_types::Geometry;
